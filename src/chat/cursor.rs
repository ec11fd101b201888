/// Highest message id already rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCursor {
    last_seen_id: u64,
    initialized: bool,
}

impl SyncCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen_id(&self) -> u64 {
        self.last_seen_id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Move the cursor forward to `id`. Never moves backwards.
    pub fn advance(&mut self, id: u64) {
        if id > self.last_seen_id {
            self.last_seen_id = id;
        }
        self.initialized = true;
    }
}
