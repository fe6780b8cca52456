//! Per-view request slot.
//!
//! Each view allows at most one outstanding request. The slot records which
//! action is in flight so the UI can label the pending control and refuse any
//! other action until it resolves.

/// Request state of a single view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState<K> {
    Idle,
    Pending(K),
}

impl<K> Default for RequestState<K> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<K: Copy + PartialEq> RequestState<K> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The action in flight, if any.
    pub fn pending(&self) -> Option<K> {
        match self {
            Self::Idle => None,
            Self::Pending(kind) => Some(*kind),
        }
    }

    pub fn is_pending(&self, kind: K) -> bool {
        self.pending() == Some(kind)
    }

    /// Claim the slot for `kind`. Returns false and leaves the state
    /// untouched when another request is already pending.
    pub fn try_begin(&mut self, kind: K) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = Self::Pending(kind);
        true
    }

    pub fn finish(&mut self) {
        *self = Self::Idle;
    }
}
