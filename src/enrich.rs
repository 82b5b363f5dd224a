//! Per-page enrichment: the two sub-resource lookups for every id in a page,
//! and resolution of the single canonical source id.

use futures::future::try_join_all;
use tracing::warn;

use crate::contract::{EnrichedProfile, ExternalId, ProfileSource};
use crate::error::SyncError;

/// External-id kind carried over to Voucherify as the customer's source_id.
const PRIMARY_ID_KIND: &str = "user_id";
/// Accepted substitute when a profile has no `user_id` entry.
const FALLBACK_ID_KIND: &str = "anonymous_id";

/// Select the canonical source id from a profile's external identifiers.
///
/// The first `user_id` entry in Source-returned order wins; if none exists,
/// the first `anonymous_id`. The order dependency is a deliberate tie-break:
/// Segment lists identifiers in attachment order and the integration has
/// always taken the first.
pub fn resolve_source_id(external_ids: &[ExternalId]) -> Option<String> {
    external_ids
        .iter()
        .find(|entry| entry.kind == PRIMARY_ID_KIND)
        .or_else(|| {
            external_ids
                .iter()
                .find(|entry| entry.kind == FALLBACK_ID_KIND)
        })
        .map(|entry| entry.id.clone())
}

/// Enrich every id in one page, issuing the traits and external-ids fetches
/// for all ids concurrently. Output order matches `segment_ids`.
///
/// Failure of any lookup fails the whole page, as does a profile with no
/// recognised external id (`UnresolvedIdentifier`): the page's batch is
/// submitted as one atomic bulk call, so a partially built batch is not
/// meaningful. A profile with no traits is not fatal; it maps to the
/// emptiest possible customer record.
pub async fn enrich_page<S>(
    source: &S,
    segment_ids: &[String],
) -> Result<Vec<EnrichedProfile>, SyncError>
where
    S: ProfileSource + ?Sized,
{
    let lookups = segment_ids.iter().map(|segment_id| async move {
        let (traits, external_ids) = futures::try_join!(
            source.fetch_traits(segment_id),
            source.fetch_external_ids(segment_id),
        )?;

        let source_id = match resolve_source_id(&external_ids) {
            Some(source_id) => source_id,
            None => {
                warn!(
                    segment_id = %segment_id,
                    "no user_id or anonymous_id found; customer cannot be built"
                );
                return Err(SyncError::UnresolvedIdentifier {
                    segment_id: segment_id.clone(),
                });
            }
        };

        Ok(EnrichedProfile {
            segment_id: segment_id.clone(),
            traits,
            source_id,
        })
    });

    try_join_all(lookups).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(kind: &str, id: &str) -> ExternalId {
        ExternalId {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn user_id_wins_over_earlier_anonymous_id() {
        let ids = vec![ext("anonymous_id", "a1"), ext("user_id", "u1"), ext("user_id", "u2")];
        assert_eq!(resolve_source_id(&ids).as_deref(), Some("u1"));
    }

    #[test]
    fn falls_back_to_first_anonymous_id() {
        let ids = vec![ext("device_id", "d1"), ext("anonymous_id", "a1"), ext("anonymous_id", "a2")];
        assert_eq!(resolve_source_id(&ids).as_deref(), Some("a1"));
    }

    #[test]
    fn unrecognised_kinds_resolve_to_none() {
        let ids = vec![ext("device_id", "d1"), ext("email", "e@example.com")];
        assert_eq!(resolve_source_id(&ids), None);
    }

    #[test]
    fn empty_list_resolves_to_none() {
        assert_eq!(resolve_source_id(&[]), None);
    }
}
