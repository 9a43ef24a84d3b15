use super::MemoryEntry;

/// Per-run, in-memory history. Created fresh for every question so
/// concurrent requests never see each other's steps.
#[derive(Debug, Default)]
pub struct Scratchpad {
    entries: Vec<MemoryEntry>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    pub fn history(&self) -> &[MemoryEntry] {
        &self.entries
    }
}
