use crate::core::{RecordId, Xid};
use std::collections::HashSet;

/// Soft read-lock registry for repeatable-read and serializable
/// transactions.
///
/// Entries are `(xid, record_id)` pairs registered when a scan finds a
/// version visible. They are only ever consulted for conflict detection;
/// nothing blocks on them and nothing removes them. A pair whose owning
/// transaction has finished simply stops matching the active set.
#[derive(Debug, Default)]
pub struct LockManager {
    locks: Vec<(Xid, RecordId)>,
}

impl LockManager {
    pub fn new() -> Self {
        Self { locks: Vec::new() }
    }

    /// Register a read lock. Idempotent: an equal pair is inserted once.
    pub fn add(&mut self, xid: Xid, record_id: RecordId) {
        if !self.exists(xid, record_id) {
            self.locks.push((xid, record_id));
        }
    }

    /// Whether `xid` holds a read lock on `record_id`.
    pub fn exists(&self, xid: Xid, record_id: RecordId) -> bool {
        self.locks
            .iter()
            .any(|&(owner, id)| owner == xid && id == record_id)
    }

    /// Whether a read lock on `record_id` is held by a transaction other
    /// than `xid` that is still active. Locks of finished transactions are
    /// stale and never conflict.
    pub fn held_by_other(&self, xid: Xid, record_id: RecordId, active: &HashSet<Xid>) -> bool {
        self.locks
            .iter()
            .any(|&(owner, id)| id == record_id && owner != xid && active.contains(&owner))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut locks = LockManager::new();
        locks.add(1, 10);
        locks.add(1, 10);
        locks.add(1, 11);
        assert_eq!(locks.len(), 2);
        assert!(locks.exists(1, 10));
        assert!(locks.exists(1, 11));
        assert!(!locks.exists(2, 10));
    }

    #[test]
    fn test_held_by_other_requires_active_owner() {
        let mut locks = LockManager::new();
        locks.add(1, 10);

        let mut active = HashSet::from([1, 2]);
        assert!(locks.held_by_other(2, 10, &active));
        // Own lock never conflicts.
        assert!(!locks.held_by_other(1, 10, &active));

        // Owner finished: the entry goes stale.
        active.remove(&1);
        assert!(!locks.held_by_other(2, 10, &active));
    }

    #[test]
    fn test_empty_registry() {
        let locks = LockManager::new();
        assert!(locks.is_empty());
        assert!(!locks.exists(1, 1));
        assert!(!locks.held_by_other(1, 1, &HashSet::new()));
    }
}
