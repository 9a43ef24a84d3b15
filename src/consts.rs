//! Project-wide constants.

/// Shown to the user whenever the agent cannot produce an answer.
pub const FALLBACK_ANSWER: &str = "No lo sé, pero estoy aprendiendo";

/// SQL dialect the agent is asked to write in.
pub const DEFAULT_DIALECT: &str = "SQL Server";

/// Default Azure OpenAI deployment.
pub const DEFAULT_MODEL: &str = "gpt-35-turbo";

/// Default Azure OpenAI API version.
pub const DEFAULT_API_VERSION: &str = "2023-07-01-preview";

/// Default SQLite database file.
pub const DEFAULT_DB_PATH: &str = "northwind.db";

/// Row limit suggested to the model unless the user asks for more.
pub const DEFAULT_TOP_K: usize = 10;

/// Sample rows included with each table schema.
pub const SAMPLE_ROWS_IN_SCHEMA: usize = 3;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
