//! The single call the web layer makes: question in, answer out.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Settings;
use crate::db::{AccessMode, Database};
use crate::engine::Engine;
use crate::engine::react::{ReactConfig, ReactEngine};
use crate::error::AgentError;
use crate::prompts::question::QuestionPrompt;
use crate::thinker::Thinker;
use crate::thinker::azure::AzureOpenAiThinker;
use crate::tools::ToolRegistry;
use crate::tools::sql::register_sql_tools;

/// Structured agent result. `input` is the prompt the agent was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentOutput {
    pub input: String,
    pub output: String,
}

#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn answer(&self, question: &str, dialect: &str) -> Result<AgentOutput, AgentError>;
}

/// Answers questions by running a ReAct agent over the SQL tools.
pub struct SqlAgent {
    engine: Box<dyn Engine>,
    database: String,
    top_k: usize,
}

impl SqlAgent {
    pub fn new(engine: Box<dyn Engine>, database: impl Into<String>, top_k: usize) -> Self {
        Self {
            engine,
            database: database.into(),
            top_k,
        }
    }

    /// Wire a thinker and a database into a ready agent.
    pub async fn with_database(
        thinker: Arc<dyn Thinker>,
        db: Arc<Database>,
        database: impl Into<String>,
        top_k: usize,
        config: ReactConfig,
    ) -> Self {
        let tools = Arc::new(ToolRegistry::new());
        register_sql_tools(&tools, db).await;
        let engine = ReactEngine::new(thinker, tools, config);
        Self::new(Box::new(engine), database, top_k)
    }

    /// Build the production agent: one model client and one database connection for the process.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let mode = if settings.allow_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let db = Database::open(&settings.db_path, mode).context("failed to open SQL database")?;
        let thinker =
            AzureOpenAiThinker::new(&settings.model).context("failed to create model client")?;
        info!(
            model = thinker.model(),
            db = %settings.db_path.display(),
            ?mode,
            "agent ready"
        );

        let config = ReactConfig {
            max_iterations: settings.agent.max_iterations,
            tool_timeout: settings.agent.tool_timeout,
            handle_parsing_errors: true,
        };
        Ok(Self::with_database(
            Arc::new(thinker),
            Arc::new(db),
            settings.database_name(),
            settings.agent.top_k,
            config,
        )
        .await)
    }
}

#[async_trait]
impl AgentGateway for SqlAgent {
    async fn answer(&self, question: &str, dialect: &str) -> Result<AgentOutput, AgentError> {
        let prompt = QuestionPrompt {
            database: &self.database,
            dialect,
            top_k: self.top_k,
        };
        let input = prompt.render(question);
        let result = self.engine.run(&input).await;

        let usage = self.engine.total_usage();
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            total_tokens = usage.total(),
            "token usage so far"
        );

        Ok(AgentOutput {
            input,
            output: result?,
        })
    }
}
