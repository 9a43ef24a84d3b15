use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Context, StepResult, Thinker};
use crate::memory::MemoryEntry;

/// A scripted thinker for tests. Returns pre-defined steps in order.
pub struct MockThinker {
    steps: Vec<StepResult>,
    index: AtomicUsize,
    seen: Mutex<Vec<Vec<MemoryEntry>>>,
}

impl MockThinker {
    pub fn new(steps: Vec<StepResult>) -> Self {
        Self {
            steps,
            index: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// The history passed in on each call so far, oldest call first.
    pub fn seen_histories(&self) -> Vec<Vec<MemoryEntry>> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Thinker for MockThinker {
    async fn next_step(&self, context: &Context) -> Result<StepResult> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(context.history.clone());
        }
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let result = self
            .steps
            .get(i)
            .ok_or_else(|| anyhow::anyhow!("MockThinker: no more steps (called {} times)", i + 1))?;
        Ok(StepResult {
            step: result.step.clone(),
            usage: result.usage,
        })
    }
}
