//! Last known server revision

use std::sync::atomic::{AtomicI64, Ordering};

use notesync_core::domain::Revision;

/// Holds the revision the client last observed from the server
///
/// The tracker accepts any value it is given, including one lower than the
/// current value; the server is the authority on ordering.
#[derive(Debug, Default)]
pub struct RevisionTracker {
    value: AtomicI64,
}

impl RevisionTracker {
    pub fn new(initial: Revision) -> Self {
        Self {
            value: AtomicI64::new(initial.value()),
        }
    }

    pub fn current(&self) -> Revision {
        Revision::new(self.value.load(Ordering::Acquire))
    }

    pub fn update(&self, revision: Revision) {
        let previous = self.value.swap(revision.value(), Ordering::AcqRel);
        if previous != revision.value() {
            tracing::debug!(from = previous, to = revision.value(), "Revision updated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial() {
        assert_eq!(RevisionTracker::default().current(), Revision::INITIAL);
        assert_eq!(
            RevisionTracker::new(Revision::new(4)).current(),
            Revision::new(4)
        );
    }

    #[test]
    fn test_update_accepts_lower_value() {
        let tracker = RevisionTracker::new(Revision::new(10));
        tracker.update(Revision::new(11));
        assert_eq!(tracker.current(), Revision::new(11));

        tracker.update(Revision::new(3));
        assert_eq!(tracker.current(), Revision::new(3));
    }
}
