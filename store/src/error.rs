//! Failures reported by observer storage backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A read failed, or the backend could not be reached.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored key does not decode to the type its table holds.
    #[error("malformed key in {table}: {reason}")]
    MalformedKey { table: &'static str, reason: String },

    /// A write batch was refused as a whole; none of its operations landed.
    #[error("write batch of {ops} operations aborted: {reason}")]
    BatchAborted { ops: usize, reason: String },
}
