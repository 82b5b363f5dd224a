#![allow(unused)]

//! # contract: trait seams between the sync controller and the outside world
//!
//! This module defines the two async traits the controller is generic over
//! (`ProfileSource` for Segment, `CustomerSink` for Voucherify) plus the
//! plain data types that cross those seams.
//!
//! ## Interface & Extensibility
//! - Implement [`ProfileSource`] to read profiles from another store.
//! - Implement [`CustomerSink`] for another destination API.
//! - All methods are async and return the typed [`SyncError`].
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so consumers can generate
//!   deterministic mocks for unit/integration tests (exported under the
//!   `test-export-mocks` feature, on by default).

use async_trait::async_trait;

use mockall::{automock, predicate::*};

use crate::error::SyncError;
use crate::mapper::VoucherifyCustomer;

/// A profile's trait map as returned by Segment: arbitrary keys, untyped
/// values. Field aliasing (`firstName`/`first_name` etc.) is the mapper's
/// concern, so this stays a raw JSON object.
pub type Traits = serde_json::Map<String, serde_json::Value>;

/// One page of the Segment profile listing.
///
/// `next_cursor` is opaque and must be passed back verbatim as the next
/// request's position; it is never parsed or mutated here. An absent cursor
/// or `has_more == false` denotes the terminal page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    /// Segment ids in the order the Source returned them.
    pub segment_ids: Vec<String>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// One typed external identifier attached to a Segment profile.
/// Recognised kinds: `user_id` (primary) and `anonymous_id` (fallback).
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ExternalId {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// A profile after the two per-id lookups have completed.
///
/// Constructed during one page's enrichment phase, consumed immediately by
/// the mapper, discarded after the batch is submitted. `traits` is `None`
/// when Segment explicitly reported no profile data; `source_id` is always
/// non-empty (a profile without a resolvable canonical id fails the page
/// before this type is built).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedProfile {
    pub segment_id: String,
    pub traits: Option<Traits>,
    pub source_id: String,
}

/// Read side: Segment's cursor-paginated profile listing plus the two
/// per-profile sub-resources. Implementations are expected to rate-limit
/// their own outbound calls.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch one page of segment ids starting at the opaque `cursor`.
    async fn fetch_page(&self, limit: u32, cursor: &str) -> Result<ProfilePage, SyncError>;

    /// Fetch a profile's traits. `Ok(None)` means Segment explicitly
    /// reported no traits for this profile; transport failures are errors.
    async fn fetch_traits(&self, segment_id: &str) -> Result<Option<Traits>, SyncError>;

    /// Fetch a profile's typed external identifiers, in Source order.
    async fn fetch_external_ids(&self, segment_id: &str) -> Result<Vec<ExternalId>, SyncError>;
}

/// Write side: one asynchronous bulk upsert call. A 2xx/accepted response is
/// success for the pipeline's purposes (the Sink acknowledges acceptance,
/// not persistence). Chunking to the Sink's per-request limit happens above
/// this seam, in [`crate::voucherify::upsert_in_chunks`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CustomerSink: Send + Sync {
    /// Submit one chunk of customers as a single bulk upsert call.
    async fn upsert(&self, customers: &[VoucherifyCustomer]) -> Result<(), SyncError>;
}
