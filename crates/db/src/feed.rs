//! Change feed driving live queries.
//!
//! Repositories publish a [`Change`] after every committed write. Live
//! queries subscribe and re-run their fetch when a change touches one of the
//! collections they read.

use tokio::sync::broadcast;

/// Store collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Identities,
    Accounts,
    JoinRequests,
    Students,
    DailyRecords,
    Messages,
}

/// Kind of write that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub collection: Collection,
    pub kind: ChangeKind,
}

impl Change {
    #[must_use]
    pub const fn created(collection: Collection) -> Self {
        Self {
            collection,
            kind: ChangeKind::Created,
        }
    }

    #[must_use]
    pub const fn updated(collection: Collection) -> Self {
        Self {
            collection,
            kind: ChangeKind::Updated,
        }
    }

    #[must_use]
    pub const fn deleted(collection: Collection) -> Self {
        Self {
            collection,
            kind: ChangeKind::Deleted,
        }
    }
}

/// Broadcast channel of committed changes.
#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl ChangeFeed {
    /// Create a feed buffering `capacity` changes per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, change: Change) {
        let _ = self.sender.send(change);
    }

    /// Publish several changes produced by one transaction.
    pub fn publish_all(&self, changes: impl IntoIterator<Item = Change>) {
        for change in changes {
            self.publish(change);
        }
    }

    /// Subscribe to subsequent changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();

        feed.publish(Change::created(Collection::Students));

        let change = rx.recv().await.unwrap();
        assert_eq!(change.collection, Collection::Students);
        assert_eq!(change.kind, ChangeKind::Created);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new(8);
        feed.publish(Change::deleted(Collection::Messages));
        assert_eq!(feed.subscriber_count(), 0);
    }
}
