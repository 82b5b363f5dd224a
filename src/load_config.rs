//! Environment-driven construction of [`SyncConfig`].
//!
//! Fails fast with an error naming the missing or malformed variable, so a
//! misconfigured run never reaches the first API call.

use std::time::Duration;

use tracing::{error, info};

use crate::config::{SegmentConfig, SyncConfig, VoucherifyConfig};
use crate::error::SyncError;
use crate::synchronise::FailurePolicy;

const DEFAULT_PAGE_LIMIT: u32 = 100;
const DEFAULT_TRAITS_LIMIT: u32 = 15;
const DEFAULT_BATCH_SIZE: u32 = 100;
/// Matches the original integration's limiter setting (minTime: 10ms).
const DEFAULT_MIN_INTERVAL_MS: u32 = 10;

/// Build the full configuration from the environment plus the CLI-supplied
/// resume cursor and failure policy.
pub fn load_config(
    start_cursor: Option<String>,
    policy: FailurePolicy,
) -> Result<SyncConfig, SyncError> {
    let access_token = require_env("SEGMENT_ACCESS_TOKEN")?;
    let space_id = require_env("SEGMENT_SPACE_ID")?;
    let application_id = require_env("VOUCHERIFY_APPLICATION_ID")?;
    let secret_key = require_env("VOUCHERIFY_SECRET_KEY")?;

    let page_limit = positive_env("SEGMENT_REQUEST_LIMIT", DEFAULT_PAGE_LIMIT)?;
    let traits_limit = positive_env("SEGMENT_TRAITS_LIMIT", DEFAULT_TRAITS_LIMIT)?;
    let upsert_batch_size = positive_env("VOUCHERIFY_BATCH_SIZE", DEFAULT_BATCH_SIZE)? as usize;
    let min_interval_ms = positive_env("SYNC_MIN_INTERVAL_MS", DEFAULT_MIN_INTERVAL_MS)?;

    info!(
        page_limit,
        traits_limit, upsert_batch_size, min_interval_ms, "configuration loaded from environment"
    );

    Ok(SyncConfig {
        segment: SegmentConfig {
            access_token,
            space_id,
            traits_limit,
        },
        voucherify: VoucherifyConfig {
            application_id,
            secret_key,
        },
        page_limit,
        upsert_batch_size,
        min_request_interval: Duration::from_millis(min_interval_ms as u64),
        policy,
        start_cursor,
    })
}

fn require_env(name: &str) -> Result<String, SyncError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => {
            error!(variable = name, "required environment variable not set");
            Err(SyncError::Config(format!(
                "{name} environment variable not set"
            )))
        }
    }
}

fn positive_env(name: &str, default: u32) -> Result<u32, SyncError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let value = raw.parse::<u32>().map_err(|e| {
                SyncError::Config(format!("{name} must be a positive integer: {e}"))
            })?;
            if value == 0 {
                return Err(SyncError::Config(format!(
                    "{name} must be greater than zero"
                )));
            }
            Ok(value)
        }
    }
}
