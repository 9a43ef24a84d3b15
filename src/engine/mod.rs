pub mod react;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::thinker::TokenUsage;

/// Runs one task to completion. Shared across requests, so it takes `&self`.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, task: &str) -> Result<String, AgentError>;

    /// Token usage summed over every run since startup.
    fn total_usage(&self) -> TokenUsage;
}
