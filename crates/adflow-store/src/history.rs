use parking_lot::RwLock;

use adflow_core::history::{HistoryEntry, Role};

/// Append-only, session-scoped record of exchanged messages.
///
/// `read_all` is a snapshot at call time: later appends are not visible in
/// an already-returned snapshot. Entries are never mutated or deleted.
pub struct HistoryLog {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self { entries: RwLock::new(Vec::new()) }
    }

    pub fn append(&self, role: Role, content: impl Into<String>) {
        self.entries.write().push(HistoryEntry::new(role, content));
    }

    pub fn read_all(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let log = HistoryLog::new();
        log.append(Role::User, "first");
        log.append(Role::Assistant, "second");
        log.append(Role::System, "third");

        let entries = log.read_all();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].content, "first");
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[1].content, "second");
        assert_eq!(entries[2].role, Role::System);
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let log = HistoryLog::new();
        log.append(Role::User, "before");

        let snapshot = log.read_all();
        log.append(Role::Assistant, "after");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.read_all().len(), 2);
    }

    #[test]
    fn timestamps_are_monotonic_per_append_order() {
        let log = HistoryLog::new();
        log.append(Role::User, "a");
        log.append(Role::User, "b");

        let entries = log.read_all();
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }
}
