// ============================================================================
// Rollback Log Entries
// ============================================================================
//
// Implements the Command Pattern for reversible mutations. Every mutation a
// transaction performs pushes exactly one entry; rollback replays the log in
// strict reverse order so that compound operations (update = delete + add)
// undo correctly.
//
// Entries address versions by their index in the record sequence. The
// sequence is append-only and indices are stable forever, which is what the
// replay relies on.
//
// ============================================================================

/// A single undo step in a transaction's rollback log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    /// Reverse a creation: stamp the version at `index` as expired by the
    /// rolling-back transaction, hiding it from everyone again.
    ExpireVersion { index: usize },

    /// Reverse an expiration: reset the version at `index` to never-expired,
    /// making it visible again.
    ReviveVersion { index: usize },
}

impl UndoAction {
    /// Index of the version this entry addresses.
    pub fn index(&self) -> usize {
        match *self {
            UndoAction::ExpireVersion { index } => index,
            UndoAction::ReviveVersion { index } => index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_accessor() {
        assert_eq!(UndoAction::ExpireVersion { index: 3 }.index(), 3);
        assert_eq!(UndoAction::ReviveVersion { index: 0 }.index(), 0);
    }
}
