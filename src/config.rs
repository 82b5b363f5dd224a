use std::time::Duration;

use tracing::{debug, info};

use crate::synchronise::FailurePolicy;

/// Everything the pipeline needs, constructed once at process start and
/// passed by reference into each component. Validation happens at
/// construction (see [`crate::load_config`]), not at first use.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub segment: SegmentConfig,
    pub voucherify: VoucherifyConfig,
    /// Page size for the profile listing.
    pub page_limit: u32,
    /// Upper bound on customers per bulk upsert request.
    pub upsert_batch_size: usize,
    /// Minimum spacing between starts of outbound Segment calls.
    pub min_request_interval: Duration,
    pub policy: FailurePolicy,
    /// Cursor to resume from; `None` starts a full pass from the beginning.
    pub start_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SegmentConfig {
    pub access_token: String,
    pub space_id: String,
    /// Per-profile traits request limit.
    pub traits_limit: u32,
}

#[derive(Debug, Clone)]
pub struct VoucherifyConfig {
    pub application_id: String,
    pub secret_key: String,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            space_id = %self.segment.space_id,
            page_limit = self.page_limit,
            traits_limit = self.segment.traits_limit,
            batch_size = self.upsert_batch_size,
            start_cursor = ?self.start_cursor,
            policy = ?self.policy,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
