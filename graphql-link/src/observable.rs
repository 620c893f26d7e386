//! Lazily started, cancellable result streams.
//!
//! An [`Observable`] does nothing until it is subscribed. Subscribing hands the
//! producer a [`Subscriber`] sink and returns a [`Subscription`] handle. The
//! handle cancels the producer through its teardown; the sink stops delivering
//! as soon as the subscription is closed, whether by a terminal event or by
//! `unsubscribe`.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::future::abortable;
use futures::stream::{self, Stream, StreamExt};
use futures::Future;
use tokio::sync::mpsc;

use crate::{FetchResult, LinkError};

/// Cleanup run exactly once when a subscription closes.
pub type Teardown = Box<dyn FnOnce() + Send + 'static>;

type Producer = Box<dyn FnOnce(Subscriber) -> Option<Teardown> + Send + 'static>;

/// Receives the events of a subscription.
pub trait Observer: Send + Sync + 'static {
    fn next(&self, result: FetchResult);
    fn error(&self, error: LinkError);
    fn complete(&self);
}

/// An event delivered to an observer, in channel form.
#[derive(Debug)]
pub enum Notification {
    Next(FetchResult),
    Error(LinkError),
    Complete,
}

impl Observer for mpsc::UnboundedSender<Notification> {
    fn next(&self, result: FetchResult) {
        let _ = self.send(Notification::Next(result));
    }

    fn error(&self, error: LinkError) {
        let _ = self.send(Notification::Error(error));
    }

    fn complete(&self) {
        let _ = self.send(Notification::Complete);
    }
}

#[derive(Default)]
struct SubscriptionState {
    closed: AtomicBool,
    teardown: Mutex<Option<Teardown>>,
}

impl SubscriptionState {
    /// Marks the subscription closed. Returns `true` for the caller that closed it.
    fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn install(&self, teardown: Teardown) {
        let mut slot = self.teardown.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            drop(slot);
            teardown();
        } else {
            *slot = Some(teardown);
        }
    }

    fn run_teardown(&self) {
        let teardown = self
            .teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }
}

/// Sink handed to an observable's producer.
///
/// `next` is dropped once the subscription is closed. `error` and `complete`
/// are terminal: the first one wins, closes the subscription and runs its
/// teardown.
///
/// The closed check and the delivery are not atomic. On a current-thread
/// runtime nothing can close the subscription in between, so no result
/// reaches the observer after `unsubscribe` returns. On a multi-thread runtime
/// one `next` that already passed the check may still land while another
/// thread unsubscribes. Delivery does not hold a lock because observers may
/// issue requests that supersede this one from inside `next`.
#[derive(Clone)]
pub struct Subscriber {
    state: Arc<SubscriptionState>,
    observer: Arc<dyn Observer>,
}

impl Subscriber {
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}

impl Observer for Subscriber {
    fn next(&self, result: FetchResult) {
        if !self.state.is_closed() {
            self.observer.next(result);
        }
    }

    fn error(&self, error: LinkError) {
        if self.state.close() {
            self.observer.error(error);
            self.state.run_teardown();
        }
    }

    fn complete(&self) {
        if self.state.close() {
            self.observer.complete();
            self.state.run_teardown();
        }
    }
}

/// Handle onto an in-flight subscription.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    /// Cancels the subscription. Calling it on a subscription that already
    /// completed, errored or was cancelled does nothing.
    ///
    /// Delivery stops immediately on a current-thread runtime. See
    /// [`Subscriber`] for the multi-thread caveat.
    pub fn unsubscribe(&self) {
        if self.state.close() {
            self.state.run_teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A lazy source of [`FetchResult`]s.
pub struct Observable {
    producer: Producer,
}

impl Observable {
    /// Creates an observable from a producer. The producer runs on subscribe
    /// and may return a teardown that cancels whatever it started.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(Subscriber) -> Option<Teardown> + Send + 'static,
    {
        Self {
            producer: Box::new(producer),
        }
    }

    /// Drives `stream` on a spawned tokio task. The first error is terminal;
    /// the end of the stream completes the subscription.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<FetchResult, LinkError>> + Send + 'static,
    {
        Self::new(move |subscriber| {
            let (task, handle) = abortable(async move {
                futures::pin_mut!(stream);
                while let Some(item) = stream.next().await {
                    if subscriber.is_closed() {
                        return;
                    }
                    match item {
                        Ok(result) => subscriber.next(result),
                        Err(error) => {
                            subscriber.error(error);
                            return;
                        }
                    }
                }
                subscriber.complete();
            });
            tokio::spawn(task);
            Some(Box::new(move || handle.abort()))
        })
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<FetchResult, LinkError>> + Send + 'static,
    {
        Self::from_stream(stream::once(future))
    }

    /// Emits `result` and completes synchronously on subscribe.
    pub fn of(result: FetchResult) -> Self {
        Self::new(move |subscriber| {
            subscriber.next(result);
            subscriber.complete();
            None
        })
    }

    /// Errors synchronously on subscribe.
    pub fn error(error: LinkError) -> Self {
        Self::new(move |subscriber| {
            subscriber.error(error);
            None
        })
    }

    pub fn subscribe<O: Observer>(self, observer: O) -> Subscription {
        self.subscribe_arc(Arc::new(observer))
    }

    pub fn subscribe_arc(self, observer: Arc<dyn Observer>) -> Subscription {
        let state = Arc::new(SubscriptionState::default());
        let subscriber = Subscriber {
            state: state.clone(),
            observer,
        };
        if let Some(teardown) = (self.producer)(subscriber) {
            state.install(teardown);
        }
        Subscription { state }
    }

    /// Subscribes with a channel observer.
    pub fn subscribe_channel(self) -> (Subscription, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.subscribe(tx), rx)
    }

    /// Adapts the observable into a stream. Dropping the stream unsubscribes.
    pub fn into_stream(self) -> ObservableStream {
        let (subscription, receiver) = self.subscribe_channel();
        ObservableStream {
            receiver,
            subscription,
            done: false,
        }
    }
}

/// Stream view over a subscription, see [`Observable::into_stream`].
pub struct ObservableStream {
    receiver: mpsc::UnboundedReceiver<Notification>,
    subscription: Subscription,
    done: bool,
}

impl ObservableStream {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for ObservableStream {
    type Item = Result<FetchResult, LinkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(Notification::Next(result))) => Poll::Ready(Some(Ok(result))),
            Poll::Ready(Some(Notification::Error(error))) => {
                this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(Some(Notification::Complete)) | Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ObservableStream {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
