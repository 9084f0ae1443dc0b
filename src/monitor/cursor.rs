//! Block-height tracker between poll cycles.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightChange {
    /// No previous observation.
    First,
    Unchanged,
    Changed { previous: u64 },
}

impl HeightChange {
    /// Whether per-transaction age reports are due.
    pub fn reports_ages(&self) -> bool {
        matches!(self, HeightChange::Changed { .. })
    }

    pub fn is_new_block(&self) -> bool {
        !matches!(self, HeightChange::Unchanged)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeightCursor {
    last: Option<u64>,
}

impl HeightCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    /// Compare `height` with the last committed height without moving.
    pub fn compare(&self, height: u64) -> HeightChange {
        match self.last {
            None => HeightChange::First,
            Some(prev) if prev == height => HeightChange::Unchanged,
            Some(prev) => HeightChange::Changed { previous: prev },
        }
    }

    /// Record `height` at the end of a cycle.
    pub fn commit(&mut self, height: u64) {
        self.last = Some(height);
    }
}
