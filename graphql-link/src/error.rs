use thiserror::Error;

/// Errors surfaced through a link chain.
///
/// Links forward upstream errors untouched, so whatever a terminating link
/// emits is what the caller observes.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The chain ran out of links before one produced a result.
    #[error("no terminating link handled operation {operation}")]
    NoTerminatingLink { operation: String },

    /// The request itself failed (transport or application level).
    #[error("request failed: {0}")]
    Request(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
