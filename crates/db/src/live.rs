//! Live queries over the change feed.

use futures::stream::{self, BoxStream, StreamExt};
use hifz_common::AppResult;
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::feed::{Change, ChangeFeed, Collection};

/// A live query: the initial snapshot, then a fresh snapshot after every
/// relevant change. Dropping the stream releases the subscription.
pub type LiveStream<T> = BoxStream<'static, AppResult<T>>;

/// Watch the result of `fetch`.
///
/// The subscription is taken before the initial fetch so no change committed
/// in between is missed. Changes already queued when a refetch starts are
/// coalesced into that refetch. A lagged subscriber refetches.
pub fn watch<T, F, Fut>(
    feed: &ChangeFeed,
    collections: &'static [Collection],
    fetch: F,
) -> LiveStream<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    let receiver = feed.subscribe();

    stream::unfold(
        (receiver, fetch, true),
        move |(mut receiver, fetch, initial)| async move {
            if !initial && !wait_for_change(&mut receiver, collections).await {
                return None;
            }
            let snapshot = fetch().await;
            Some((snapshot, (receiver, fetch, false)))
        },
    )
    .boxed()
}

/// Block until a change touches `collections`, then drain whatever is
/// already queued. Returns `false` once the feed is closed.
async fn wait_for_change(
    receiver: &mut broadcast::Receiver<Change>,
    collections: &[Collection],
) -> bool {
    loop {
        match receiver.recv().await {
            Ok(change) if collections.contains(&change.collection) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Live query lagged behind change feed");
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }

    while receiver.try_recv().is_ok() {}
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::feed::Change;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_watch(feed: &ChangeFeed, counter: Arc<AtomicUsize>) -> LiveStream<usize> {
        watch(feed, &[Collection::Students], move || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    }

    #[tokio::test]
    async fn test_initial_snapshot_then_refetch_on_change() {
        let feed = ChangeFeed::new(16);
        let counter = Arc::new(AtomicUsize::new(0));
        let mut live = counting_watch(&feed, counter.clone());

        assert_eq!(live.next().await.unwrap().unwrap(), 1);

        feed.publish(Change::updated(Collection::Students));
        assert_eq!(live.next().await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unrelated_changes_are_ignored_and_bursts_coalesce() {
        let feed = ChangeFeed::new(16);
        let counter = Arc::new(AtomicUsize::new(0));
        let mut live = counting_watch(&feed, counter.clone());
        assert_eq!(live.next().await.unwrap().unwrap(), 1);

        feed.publish(Change::created(Collection::Messages));
        feed.publish(Change::created(Collection::Students));
        feed.publish(Change::updated(Collection::Students));
        feed.publish(Change::deleted(Collection::Students));

        assert_eq!(live.next().await.unwrap().unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stream_ends_when_feed_dropped() {
        let feed = ChangeFeed::new(16);
        let counter = Arc::new(AtomicUsize::new(0));
        let mut live = counting_watch(&feed, counter);
        assert!(live.next().await.is_some());

        drop(feed);
        assert!(live.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_subscription() {
        let feed = ChangeFeed::new(16);
        let live = counting_watch(&feed, Arc::new(AtomicUsize::new(0)));
        assert_eq!(feed.subscriber_count(), 1);

        drop(live);
        assert_eq!(feed.subscriber_count(), 0);
    }
}
