//! Test-only terminating link whose requests are answered by hand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::mpsc::{unbounded, UnboundedSender};

use crate::{FetchResult, Forward, Link, LinkError, Observable, Operation};

#[derive(Clone)]
pub(crate) struct ManualRequest {
    operation: Operation,
    sender: UnboundedSender<Result<FetchResult, LinkError>>,
    cancelled: Arc<AtomicBool>,
}

impl ManualRequest {
    pub(crate) fn operation(&self) -> &Operation {
        &self.operation
    }

    pub(crate) fn respond(&self, result: FetchResult) {
        let _ = self.sender.unbounded_send(Ok(result));
    }

    pub(crate) fn fail(&self, error: LinkError) {
        let _ = self.sender.unbounded_send(Err(error));
    }

    pub(crate) fn finish(&self) {
        self.sender.close_channel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct ManualState {
    requests: Vec<ManualRequest>,
    journal: Vec<String>,
}

/// Records every issued request and every cancellation, in order.
#[derive(Clone, Default)]
pub(crate) struct ManualLink {
    state: Arc<Mutex<ManualState>>,
}

impl ManualLink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn issued(&self, index: usize) -> ManualRequest {
        self.state.lock().unwrap().requests[index].clone()
    }

    pub(crate) fn issued_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub(crate) fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }
}

impl Link for ManualLink {
    fn request(&self, operation: Operation, _forward: Forward) -> Observable {
        let state = self.state.clone();
        Observable::new(move |subscriber| {
            let (sender, receiver) = unbounded();
            let cancelled = Arc::new(AtomicBool::new(false));
            let index = {
                let mut state = state.lock().unwrap();
                let index = state.requests.len();
                state.requests.push(ManualRequest {
                    operation,
                    sender,
                    cancelled: cancelled.clone(),
                });
                state.journal.push(format!("issue {index}"));
                index
            };

            let inner = Observable::from_stream(receiver).subscribe(subscriber);
            Some(Box::new(move || {
                if !inner.is_closed() {
                    cancelled.store(true, Ordering::SeqCst);
                    state.lock().unwrap().journal.push(format!("cancel {index}"));
                    inner.unsubscribe();
                }
            }))
        })
    }
}
