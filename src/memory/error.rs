//! Error taxonomy for the memory engine.

use thiserror::Error;

/// Errors surfaced by the memory core.
///
/// `Indexer` never escapes the facade (the conversational hot path must not
/// stall on a best-effort collaborator); it exists so indexer adapters have
/// a concrete type to return.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A persisted record could not be reconstructed (missing `content`).
    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    /// No entry with the given id exists in any searched tier.
    #[error("no entry with id {0}")]
    NotFound(String),

    /// Disk I/O failed on save/load. The in-memory effect is kept; durability
    /// is not guaranteed until a later write succeeds.
    #[error("persistence failure at {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The semantic indexer collaborator rejected or failed a call.
    #[error("semantic indexer unavailable: {0}")]
    Indexer(String),

    /// A background task did not run to completion (panic or cancellation).
    #[error("internal task failure: {0}")]
    Internal(String),
}
