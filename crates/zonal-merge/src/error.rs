//! Error types for the merge crate.

use zonal_types::{OperatorId, PlayerId};

/// Errors that can occur while previewing, committing or bulk-merging.
///
/// These never escape the public service API: they are rendered into the
/// message of a failed [`MergeResult`](crate::MergeResult).
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The storage backend failed.
    #[error("storage error: {0}")]
    Store(#[from] zonal_store::StoreError),

    /// The owning scope is shutting down.
    #[error("operation cancelled by shutdown")]
    Cancelled,

    /// The operator has no pending merge.
    #[error("no pending merge for {0}")]
    NoPendingMerge(OperatorId),

    /// Conflicts remain unresolved.
    #[error("{0} conflict(s) still unresolved")]
    UnresolvedConflicts(usize),

    /// The backend declined to write a merged snapshot.
    #[error("storage rejected the write for player {0}")]
    SaveRejected(PlayerId),

    /// Manual merges cannot run without per-player review.
    #[error("manual merges must be previewed and resolved per player")]
    ManualRequiresReview,
}

/// Convenience alias for fallible merge operations.
///
/// Named apart from [`MergeResult`](crate::MergeResult), the user-facing
/// outcome record.
pub type MergeOpResult<T> = Result<T, MergeError>;
