use std::sync::Arc;

use crate::{LinkError, Observable, Operation};

/// A stage of the request pipeline.
///
/// A link either handles the operation itself (a terminating link) or calls
/// `forward.run` to pass it down the chain, possibly wrapping the returned
/// observable.
pub trait Link: Send + Sync + 'static {
    fn request(&self, operation: Operation, forward: Forward) -> Observable;
}

impl<F> Link for F
where
    F: Fn(Operation, Forward) -> Observable + Send + Sync + 'static,
{
    fn request(&self, operation: Operation, forward: Forward) -> Observable {
        self(operation, forward)
    }
}

/// The remainder of a chain, as seen from one link.
#[derive(Clone)]
pub struct Forward {
    links: Arc<[Arc<dyn Link>]>,
    position: usize,
}

impl Forward {
    /// Hands the operation to the next link.
    pub fn run(self, operation: Operation) -> Observable {
        match self.links.get(self.position).cloned() {
            Some(link) => link.request(
                operation,
                Forward {
                    links: self.links,
                    position: self.position + 1,
                },
            ),
            None => {
                log::warn!(
                    "Operation {} reached the end of the link chain",
                    operation.display_name()
                );
                Observable::error(LinkError::NoTerminatingLink {
                    operation: operation.display_name().to_string(),
                })
            }
        }
    }
}

/// An ordered composition of links. The last link should terminate.
#[derive(Clone)]
pub struct LinkChain {
    links: Arc<[Arc<dyn Link>]>,
}

impl LinkChain {
    pub fn new(links: Vec<Arc<dyn Link>>) -> Self {
        Self {
            links: links.into(),
        }
    }

    /// Runs the operation through the chain. Nothing happens until the
    /// returned observable is subscribed.
    pub fn execute(&self, operation: Operation) -> Observable {
        Forward {
            links: self.links.clone(),
            position: 0,
        }
        .run(operation)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
