//! Database tools handed to the agent.
//!
//! Names follow the usual SQL-toolkit convention (`sql_db_*`) so chat models
//! recognise them without much prompting.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::{Tool, ToolRegistry};
use crate::consts::SAMPLE_ROWS_IN_SCHEMA;
use crate::db::{AccessMode, Database};

/// Maximum output size in bytes. Anything beyond this is truncated.
const MAX_OUTPUT_BYTES: usize = 50_000;

/// Register every SQL tool against one shared database.
pub async fn register_sql_tools(registry: &ToolRegistry, db: Arc<Database>) {
    registry
        .register(Arc::new(ListTablesTool::new(Arc::clone(&db))))
        .await;
    registry
        .register(Arc::new(SchemaTool::new(Arc::clone(&db))))
        .await;
    registry
        .register(Arc::new(QueryTool::new(Arc::clone(&db))))
        .await;
    registry.register(Arc::new(QueryCheckerTool::new(db))).await;
}

/// Interrupts the connection if dropped while armed, which happens when the
/// caller gives up on a running statement (e.g. the tool timeout fires).
struct InterruptOnDrop {
    db: Option<Arc<Database>>,
}

impl InterruptOnDrop {
    fn disarm(mut self) {
        self.db = None;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            warn!("abandoned SQL statement, interrupting it");
            db.interrupt();
        }
    }
}

/// Run blocking database work on the blocking pool.
async fn with_db<T, F>(db: &Arc<Database>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
{
    let guard = InterruptOnDrop {
        db: Some(Arc::clone(db)),
    };
    let db = Arc::clone(db);
    let result = tokio::task::spawn_blocking(move || work(db.as_ref()))
        .await
        .context("database task failed")?;
    guard.disarm();
    result
}

fn required_arg<'a>(args: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    let value = args
        .get(name)
        .ok_or_else(|| anyhow!("missing required arg: {}", name))?
        .trim();
    if value.is_empty() {
        bail!("arg {} must not be empty", name);
    }
    Ok(value)
}

fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }
    let mut end = max_bytes;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n\n[truncated: showing {}/{} bytes]",
        &output[..end],
        end,
        output.len()
    )
}

/// Lists the tables in the database.
pub struct ListTablesTool {
    db: Arc<Database>,
}

impl ListTablesTool {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        "sql_db_list_tables"
    }

    fn description(&self) -> &str {
        "List the tables in the database. Args: {}. Call this first to learn which tables exist."
    }

    async fn execute(&self, _args: &HashMap<String, String>) -> Result<String> {
        let names = with_db(&self.db, |db| db.table_names()).await?;
        if names.is_empty() {
            return Ok("(the database has no tables)".to_string());
        }
        Ok(names.join(", "))
    }
}

/// Shows the schema and sample rows of some tables.
pub struct SchemaTool {
    db: Arc<Database>,
}

impl SchemaTool {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for SchemaTool {
    fn name(&self) -> &str {
        "sql_db_schema"
    }

    fn description(&self) -> &str {
        "Get the schema and sample rows for tables. Args: {\"table_names\": \"<comma-separated table names>\"}. \
         Be sure the tables exist by calling sql_db_list_tables first."
    }

    async fn execute(&self, args: &HashMap<String, String>) -> Result<String> {
        let raw = required_arg(args, "table_names")?;
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() {
            bail!("arg table_names must name at least one table");
        }
        let info = with_db(&self.db, move |db| {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            db.table_info(&names, SAMPLE_ROWS_IN_SCHEMA)
        })
        .await?;
        Ok(truncate_output(&info, MAX_OUTPUT_BYTES))
    }
}

/// Runs a query and returns its rows.
pub struct QueryTool {
    db: Arc<Database>,
}

impl QueryTool {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &str {
        "sql_db_query"
    }

    fn description(&self) -> &str {
        match self.db.mode() {
            AccessMode::ReadOnly => {
                "Execute a read-only SQL query and get the rows back. Args: {\"query\": \"<SQL>\"}. \
                 If the query is wrong an error is returned; rewrite it and try again."
            }
            AccessMode::ReadWrite => {
                "Execute a SQL statement and get the result back. Args: {\"query\": \"<SQL>\"}. \
                 If the statement is wrong an error is returned; rewrite it and try again."
            }
        }
    }

    async fn execute(&self, args: &HashMap<String, String>) -> Result<String> {
        let query = required_arg(args, "query")?.to_string();
        let rows = with_db(&self.db, move |db| db.query(&query)).await?;
        Ok(truncate_output(&rows, MAX_OUTPUT_BYTES))
    }
}

/// Compiles a query without running it.
pub struct QueryCheckerTool {
    db: Arc<Database>,
}

impl QueryCheckerTool {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for QueryCheckerTool {
    fn name(&self) -> &str {
        "sql_db_query_checker"
    }

    fn description(&self) -> &str {
        "Double check a query before executing it with sql_db_query. Args: {\"query\": \"<SQL>\"}. \
         Reports syntax errors, unknown tables or columns, and forbidden statements."
    }

    async fn execute(&self, args: &HashMap<String, String>) -> Result<String> {
        let query = required_arg(args, "query")?.to_string();
        let checked = with_db(&self.db, move |db| db.check(&query).map(|_| query)).await?;
        Ok(format!("query is valid:\n{}", checked))
    }
}
