//! A small GraphQL request pipeline.
//!
//! Operations travel through a [`LinkChain`] of [`Link`]s and come back as
//! lazily started, cancellable [`Observable`]s. [`AbortLink`] cancels an
//! in-flight request as soon as a newer request with the same dedup key is
//! issued.

pub mod abort;
mod delay;
mod error;
mod link;
mod observable;
mod operation;
mod response;
#[cfg(feature = "graphql")]
mod schema;

#[cfg(test)]
mod testing;

pub use abort::{AbortConfig, AbortLink, AbortRegistry, AbortStats, SharedAbortRegistry};
pub use delay::DelayLink;
pub use error::LinkError;
pub use link::{Forward, Link, LinkChain};
pub use observable::{
    Notification, Observable, ObservableStream, Observer, Subscriber, Subscription, Teardown,
};
pub use operation::{Operation, OperationContext};
pub use response::{FetchResult, ResponseError};
#[cfg(feature = "graphql")]
pub use schema::SchemaLink;
