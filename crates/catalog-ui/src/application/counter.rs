//! CounterStore: the counter demo.

/// A counter with a derived doubled value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterStore {
    count: i64,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Derived value, recomputed on every read.
    pub fn double_count(&self) -> i64 {
        self.count.saturating_mul(2)
    }

    /// Adds one and returns the new count.  Saturates at `i64::MAX`.
    pub fn increment(&mut self) -> i64 {
        self.count = self.count.saturating_add(1);
        self.count
    }
}
