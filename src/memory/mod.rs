pub mod scratchpad;

use serde::{Deserialize, Serialize};

use crate::thinker::ToolCall;
use crate::tools::ToolResult;

/// A single entry in the agent's memory of the current run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MemoryEntry {
    /// The initial task given to the agent.
    Task { content: String },
    /// A thought + action + observations from one ReAct iteration.
    Iteration {
        thought: String,
        calls: Vec<ToolCall>,
        results: Vec<ToolResult>,
    },
    /// Model output that could not be parsed, and why.
    Correction { raw: String, reason: String },
    /// The final answer.
    Answer { thought: String, content: String },
}
