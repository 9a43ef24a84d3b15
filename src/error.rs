use thiserror::Error;

/// Why the agent could not produce an answer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model endpoint failed: transport, HTTP status or empty completion.
    #[error("model call failed: {0:#}")]
    Model(anyhow::Error),
    /// The model answered in a format the agent could not use.
    #[error("could not parse model output ({reason}): {raw}")]
    Parse { raw: String, reason: String },
    #[error("max iterations ({0}) reached without an answer")]
    MaxIterations(usize),
}
