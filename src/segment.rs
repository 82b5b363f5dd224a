//! Segment Personas API client: the paginated profile listing plus the two
//! per-profile sub-resources (traits, external ids).
//!
//! Response bodies are deserialised into explicit schemas at this boundary;
//! a response missing a required field (e.g. the `data` array) becomes the
//! typed error for that call, not a silently empty page.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;

use crate::config::SegmentConfig;
use crate::contract::{ExternalId, ProfilePage, ProfileSource, Traits};
use crate::error::SyncError;
use crate::limiter::RateLimiter;

/// Wire shape of `GET {base}?limit=&next=`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProfilesEnvelope {
    data: Vec<ProfileRef>,
    cursor: Option<CursorInfo>,
}

#[derive(Debug, Deserialize)]
struct ProfileRef {
    segment_id: String,
}

#[derive(Debug, Deserialize)]
struct CursorInfo {
    has_more: Option<bool>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TraitsEnvelope {
    traits: Option<Traits>,
}

#[derive(Debug, Deserialize)]
struct ExternalIdsEnvelope {
    data: Vec<ExternalId>,
}

impl From<ProfilesEnvelope> for ProfilePage {
    fn from(envelope: ProfilesEnvelope) -> Self {
        let cursor = envelope.cursor;
        ProfilePage {
            segment_ids: envelope.data.into_iter().map(|p| p.segment_id).collect(),
            has_more: cursor
                .as_ref()
                .and_then(|c| c.has_more)
                .unwrap_or(false),
            next_cursor: cursor.and_then(|c| c.next).filter(|next| !next.is_empty()),
        }
    }
}

/// HTTP client for the Segment Personas profiles API.
///
/// Auth is HTTP Basic with the access token as username and an empty
/// password; every request carries the `Accept-Encoding: zlib` hint the API
/// accepts. All outbound calls go through the shared [`RateLimiter`].
pub struct SegmentClient {
    http: Client,
    base_url: String,
    access_token: String,
    traits_limit: u32,
    limiter: Arc<RateLimiter>,
}

impl SegmentClient {
    pub fn new(config: &SegmentConfig, limiter: Arc<RateLimiter>) -> Self {
        let base_url = format!(
            "https://profiles.segment.com/v1/spaces/{}/collections/users/profiles",
            config.space_id
        );
        Self {
            http: Client::new(),
            base_url,
            access_token: config.access_token.clone(),
            traits_limit: config.traits_limit,
            limiter,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.access_token, Some(""))
            .header("Accept-Encoding", "zlib")
    }
}

fn status_line(status: reqwest::StatusCode) -> String {
    format!(
        "{}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    )
}

#[async_trait::async_trait]
impl ProfileSource for SegmentClient {
    async fn fetch_page(&self, limit: u32, cursor: &str) -> Result<ProfilePage, SyncError> {
        let url = format!("{}?limit={}&next={}", self.base_url, limit, cursor);
        let response = self
            .limiter
            .schedule(|| self.get(&url).send())
            .await
            .map_err(|e| SyncError::PageFetch {
                cursor: cursor.to_string(),
                reason: format!("request error: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::PageFetch {
                cursor: cursor.to_string(),
                reason: status_line(status),
            });
        }

        let envelope: ProfilesEnvelope =
            response.json().await.map_err(|e| SyncError::PageFetch {
                cursor: cursor.to_string(),
                reason: format!("response body missing required data: {e}"),
            })?;
        Ok(ProfilePage::from(envelope))
    }

    async fn fetch_traits(&self, segment_id: &str) -> Result<Option<Traits>, SyncError> {
        let url = format!(
            "{}/segment_id:{}/traits?limit={}",
            self.base_url, segment_id, self.traits_limit
        );
        let response = self
            .limiter
            .schedule(|| self.get(&url).send())
            .await
            .map_err(|e| SyncError::TraitsFetch {
                segment_id: segment_id.to_string(),
                reason: format!("request error: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::TraitsFetch {
                segment_id: segment_id.to_string(),
                reason: status_line(status),
            });
        }

        let envelope: TraitsEnvelope =
            response.json().await.map_err(|e| SyncError::TraitsFetch {
                segment_id: segment_id.to_string(),
                reason: format!("malformed response body: {e}"),
            })?;
        Ok(envelope.traits)
    }

    async fn fetch_external_ids(&self, segment_id: &str) -> Result<Vec<ExternalId>, SyncError> {
        let url = format!("{}/segment_id:{}/external_ids", self.base_url, segment_id);
        let response = self
            .limiter
            .schedule(|| self.get(&url).send())
            .await
            .map_err(|e| SyncError::IdResolution {
                segment_id: segment_id.to_string(),
                reason: format!("request error: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::IdResolution {
                segment_id: segment_id.to_string(),
                reason: status_line(status),
            });
        }

        let envelope: ExternalIdsEnvelope =
            response.json().await.map_err(|e| SyncError::IdResolution {
                segment_id: segment_id.to_string(),
                reason: format!("malformed response body: {e}"),
            })?;
        Ok(envelope.data)
    }
}
