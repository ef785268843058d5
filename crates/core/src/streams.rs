//! Combinators over live queries.
//!
//! Every combinator takes ownership of its input streams; dropping the
//! combined stream drops the inputs and with them their change-feed
//! subscriptions.

use futures::stream::{Stream, StreamExt};
use hifz_common::{AppError, AppResult};
use hifz_db::LiveStream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One input of a combine-latest: the stream and its last value.
struct Slot<T> {
    stream: Option<LiveStream<T>>,
    latest: Option<T>,
    fresh: bool,
}

impl<T> Slot<T> {
    fn new(stream: LiveStream<T>) -> Self {
        Self {
            stream: Some(stream),
            latest: None,
            fresh: false,
        }
    }

    /// Pull every ready item, keeping the last value.
    ///
    /// Stops at the first error item so it can be forwarded as-is.
    fn drain(&mut self, cx: &mut Context<'_>) -> Result<(), AppError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        loop {
            match stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(value))) => {
                    self.latest = Some(value);
                    self.fresh = true;
                }
                Poll::Ready(Some(Err(e))) => return Err(e),
                Poll::Ready(None) => {
                    self.stream = None;
                    return Ok(());
                }
                Poll::Pending => return Ok(()),
            }
        }
    }

    const fn is_finished(&self) -> bool {
        self.stream.is_none()
    }

    /// Ended without ever producing a value.
    const fn is_barren(&self) -> bool {
        self.stream.is_none() && self.latest.is_none()
    }
}

/// Stream returned by [`combine_latest2`].
pub struct CombineLatest2<A, B> {
    a: Slot<A>,
    b: Slot<B>,
}

// Values are never pinned; only the boxed inputs are polled.
impl<A, B> Unpin for CombineLatest2<A, B> {}

impl<A: Clone, B: Clone> Stream for CombineLatest2<A, B> {
    type Item = AppResult<(A, B)>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if let Err(e) = this.a.drain(cx) {
            return Poll::Ready(Some(Err(e)));
        }
        if let Err(e) = this.b.drain(cx) {
            return Poll::Ready(Some(Err(e)));
        }

        if this.a.fresh || this.b.fresh {
            if let (Some(a), Some(b)) = (&this.a.latest, &this.b.latest) {
                this.a.fresh = false;
                this.b.fresh = false;
                return Poll::Ready(Some(Ok((a.clone(), b.clone()))));
            }
        }

        if (this.a.is_finished() && this.b.is_finished())
            || this.a.is_barren()
            || this.b.is_barren()
        {
            return Poll::Ready(None);
        }

        Poll::Pending
    }
}

/// Pair the latest values of two live queries.
///
/// Nothing is emitted until both inputs have produced a value; after that
/// every change on either side emits the current pair. Error items are
/// forwarded immediately and do not end the stream.
pub fn combine_latest2<A, B>(a: LiveStream<A>, b: LiveStream<B>) -> LiveStream<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    CombineLatest2 {
        a: Slot::new(a),
        b: Slot::new(b),
    }
    .boxed()
}

/// Stream returned by [`combine_latest_all`].
pub struct CombineLatestAll<T> {
    slots: Vec<Slot<T>>,
    emitted_empty: bool,
}

impl<T> Unpin for CombineLatestAll<T> {}

impl<T: Clone> Stream for CombineLatestAll<T> {
    type Item = AppResult<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if this.slots.is_empty() {
            if this.emitted_empty {
                return Poll::Ready(None);
            }
            this.emitted_empty = true;
            return Poll::Ready(Some(Ok(Vec::new())));
        }

        for slot in &mut this.slots {
            if let Err(e) = slot.drain(cx) {
                return Poll::Ready(Some(Err(e)));
            }
        }

        if this.slots.iter().any(|s| s.fresh) {
            let values: Option<Vec<T>> = this.slots.iter().map(|s| s.latest.clone()).collect();
            if let Some(values) = values {
                for slot in &mut this.slots {
                    slot.fresh = false;
                }
                return Poll::Ready(Some(Ok(values)));
            }
        }

        if this.slots.iter().all(Slot::is_finished) || this.slots.iter().any(Slot::is_barren) {
            return Poll::Ready(None);
        }

        Poll::Pending
    }
}

/// Combine-latest over a dynamic set of live queries, in input order.
///
/// An empty set emits one empty vector and ends.
pub fn combine_latest_all<T>(streams: Vec<LiveStream<T>>) -> LiveStream<Vec<T>>
where
    T: Clone + Send + 'static,
{
    CombineLatestAll {
        slots: streams.into_iter().map(Slot::new).collect(),
        emitted_empty: false,
    }
    .boxed()
}

/// Stream returned by [`switch_map`].
pub struct SwitchMap<T, U, F> {
    outer: Option<LiveStream<T>>,
    inner: Option<LiveStream<U>>,
    project: F,
}

impl<T, U, F> Unpin for SwitchMap<T, U, F> {}

impl<T, U, F> SwitchMap<T, U, F>
where
    F: FnMut(T) -> LiveStream<U>,
{
    /// Replace the inner stream; the previous one is dropped here.
    fn switch_to(&mut self, value: T) {
        self.inner = Some((self.project)(value));
    }
}

impl<T, U, F> Stream for SwitchMap<T, U, F>
where
    F: FnMut(T) -> LiveStream<U>,
{
    type Item = AppResult<U>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        let mut latest = None;
        let mut outer_error = None;
        if let Some(outer) = this.outer.as_mut() {
            loop {
                match outer.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(value))) => latest = Some(value),
                    Poll::Ready(Some(Err(e))) => {
                        outer_error = Some(e);
                        break;
                    }
                    Poll::Ready(None) => {
                        this.outer = None;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }

        if let Some(value) = latest {
            this.switch_to(value);
        }
        if let Some(e) = outer_error {
            return Poll::Ready(Some(Err(e)));
        }

        if let Some(inner) = this.inner.as_mut() {
            match inner.poll_next_unpin(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.inner = None,
                Poll::Pending => {}
            }
        }

        if this.outer.is_none() && this.inner.is_none() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

/// Map each outer value to a live query and follow only the newest one.
///
/// When the outer stream emits, queued outer values are skipped in favour of
/// the last, the current inner stream is dropped and `project` builds its
/// replacement. Error items from either side are forwarded.
pub fn switch_map<T, U, F>(outer: LiveStream<T>, project: F) -> LiveStream<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> LiveStream<U> + Send + 'static,
{
    SwitchMap {
        outer: Some(outer),
        inner: None,
        project,
    }
    .boxed()
}
