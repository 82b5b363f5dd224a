use std::fmt;

/// Failure taxonomy for the synchronisation pipeline.
///
/// Transport and malformed-response failures are converted into the typed
/// variant for their call site at the API-client boundary; a missing required
/// field in a response body is an error here, never a silently propagated
/// absence. `PageFetch` carries the cursor that was used for the failed
/// request so the operator can resume from it.
#[derive(Debug)]
pub enum SyncError {
    /// The Segment profile listing call failed or returned a malformed body.
    PageFetch { cursor: String, reason: String },
    /// A per-profile traits fetch failed (transport or non-2xx).
    TraitsFetch { segment_id: String, reason: String },
    /// A per-profile external-ids fetch failed (transport or non-2xx).
    IdResolution { segment_id: String, reason: String },
    /// The profile has no external id of a recognised kind; a customer
    /// record cannot be built without a source_id. Data quality, not
    /// transport.
    UnresolvedIdentifier { segment_id: String },
    /// Voucherify rejected a bulk upsert chunk or was unreachable.
    Upsert { status: Option<u16>, reason: String },
    /// Invalid or missing configuration, detected at startup.
    Config(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::PageFetch { cursor, reason } => {
                write!(f, "failed to fetch profile page (cursor {cursor}): {reason}")
            }
            SyncError::TraitsFetch { segment_id, reason } => {
                write!(f, "failed to fetch traits for segment_id {segment_id}: {reason}")
            }
            SyncError::IdResolution { segment_id, reason } => {
                write!(
                    f,
                    "failed to fetch external ids for segment_id {segment_id}: {reason}"
                )
            }
            SyncError::UnresolvedIdentifier { segment_id } => {
                write!(
                    f,
                    "no user_id or anonymous_id external id found for segment_id {segment_id}"
                )
            }
            SyncError::Upsert {
                status: Some(status),
                reason,
            } => write!(f, "customer bulk upsert rejected ({status}): {reason}"),
            SyncError::Upsert {
                status: None,
                reason,
            } => write!(f, "customer bulk upsert failed: {reason}"),
            SyncError::Config(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for SyncError {}
