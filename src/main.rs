use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use askdb::config::Settings;
use askdb::gateway::SqlAgent;
use askdb::web::{AppState, router};

#[derive(Parser)]
#[command(
    name = "askdb",
    version,
    about = "Ask a SQL database questions in plain language."
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database path
    #[arg(short, long, env = "SQL_DB")]
    db: Option<PathBuf>,

    /// Maximum ReAct loop iterations per question
    #[arg(short, long, env = "AGENT_MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    /// Allow the agent to run write statements (default: read-only)
    #[arg(long, env = "SQL_ALLOW_WRITE")]
    allow_write: bool,
}

impl Cli {
    /// The value a flag (or its env var) gives for a settings key.
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "HOST" => self.host.clone(),
            "PORT" => self.port.map(|port| port.to_string()),
            "SQL_DB" => self.db.as_ref().map(|path| path.display().to_string()),
            "AGENT_MAX_ITERATIONS" => self.max_iterations.map(|n| n.to_string()),
            "SQL_ALLOW_WRITE" => self.allow_write.then(|| "true".to_string()),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("askdb=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings =
        Settings::from_env_with(|key| cli.lookup(key)).context("invalid configuration")?;

    let agent = SqlAgent::from_settings(&settings).await?;
    let state = AppState::new(Arc::new(agent), settings.agent.dialect.clone())?;

    askdb::run_server(router(state), &settings.host, settings.port).await
}
