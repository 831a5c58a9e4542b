//! Session log
//!
//! An append-only record of operator-visible session events: connects,
//! disconnects, and kicks.

use std::sync::Mutex;

/// Append-only log of session events.
pub struct SessionLog {
    entries: Mutex<Vec<String>>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, message: impl Into<String>) {
        self.entries.lock().unwrap().push(message.into());
    }

    /// Point-in-time copy of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order() {
        let log = SessionLog::new();
        log.append("Connected: 10.0.0.1:5000");
        log.append("Kicked: 10.0.0.1:5000");

        let entries = log.snapshot();
        assert_eq!(
            entries,
            vec![
                "Connected: 10.0.0.1:5000".to_string(),
                "Kicked: 10.0.0.1:5000".to_string(),
            ]
        );
    }

    #[test]
    fn snapshot_is_detached() {
        let log = SessionLog::new();
        log.append("one");
        let snapshot = log.snapshot();
        log.append("two");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }
}
