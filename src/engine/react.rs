use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Engine;
use crate::consts::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOOL_TIMEOUT_SECS};
use crate::error::AgentError;
use crate::memory::MemoryEntry;
use crate::memory::scratchpad::Scratchpad;
use crate::thinker::{Context, Step, Thinker, TokenUsage};
use crate::tools::{Outcome, ToolRegistry, ToolResult};

pub struct ReactConfig {
    pub max_iterations: usize,
    pub tool_timeout: Duration,
    /// Feed unparseable model output back as a correction instead of failing.
    pub handle_parsing_errors: bool,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            handle_parsing_errors: true,
        }
    }
}

/// The ReAct loop. Wires together a Thinker and a ToolRegistry; each run gets its own scratchpad.
pub struct ReactEngine {
    thinker: Arc<dyn Thinker>,
    tools: Arc<ToolRegistry>,
    config: ReactConfig,
    usage: Mutex<TokenUsage>,
}

impl ReactEngine {
    pub fn new(thinker: Arc<dyn Thinker>, tools: Arc<ToolRegistry>, config: ReactConfig) -> Self {
        Self {
            thinker,
            tools,
            config,
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    fn record_usage(&self, usage: TokenUsage) {
        if let Ok(mut total) = self.usage.lock() {
            total.add(usage);
        }
    }

    async fn execute_calls(&self, calls: &[crate::thinker::ToolCall]) -> Vec<ToolResult> {
        let timeout = self.config.tool_timeout;

        let futures: Vec<_> = calls
            .iter()
            .map(|call| {
                let tools = Arc::clone(&self.tools);
                async move {
                    match tokio::time::timeout(timeout, tools.execute(&call.tool, &call.args)).await
                    {
                        Ok(result) => result,
                        Err(_) => ToolResult {
                            tool: call.tool.clone(),
                            outcome: Outcome::Error("timed out".to_string()),
                        },
                    }
                }
            })
            .collect();

        futures::future::join_all(futures).await
    }
}

#[async_trait]
impl Engine for ReactEngine {
    async fn run(&self, task: &str) -> Result<String, AgentError> {
        let mut scratchpad = Scratchpad::new();
        scratchpad.store(MemoryEntry::Task {
            content: task.to_string(),
        });
        let available_tools = self.tools.descriptions().await;

        for iteration in 1..=self.config.max_iterations {
            let context = Context {
                task: task.to_string(),
                history: scratchpad.history().to_vec(),
                available_tools: available_tools.clone(),
            };

            let result = self
                .thinker
                .next_step(&context)
                .await
                .map_err(AgentError::Model)?;
            if let Some(usage) = result.usage {
                self.record_usage(usage);
            }

            match result.step {
                Step::Act { thought, calls } => {
                    info!(iteration, %thought, calls = calls.len(), "executing tool calls");

                    let results = self.execute_calls(&calls).await;
                    for result in &results {
                        match &result.outcome {
                            Outcome::Success(out) => debug!(tool = %result.tool, "✓ {}", out),
                            Outcome::Error(err) => debug!(tool = %result.tool, "✗ {}", err),
                        }
                    }

                    scratchpad.store(MemoryEntry::Iteration {
                        thought,
                        calls,
                        results,
                    });
                }

                Step::Finish { thought, answer } => {
                    info!(iteration, %thought, "finished");
                    scratchpad.store(MemoryEntry::Answer {
                        thought,
                        content: answer.clone(),
                    });
                    return Ok(answer);
                }

                Step::Malformed { raw, reason } => {
                    if !self.config.handle_parsing_errors {
                        return Err(AgentError::Parse { raw, reason });
                    }
                    warn!(iteration, %reason, "model output could not be parsed, asking again");
                    scratchpad.store(MemoryEntry::Correction { raw, reason });
                }
            }
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    fn total_usage(&self) -> TokenUsage {
        self.usage.lock().map(|u| *u).unwrap_or_default()
    }
}
