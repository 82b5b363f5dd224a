//! Voucherify API client and the batch upserter that feeds it.

use reqwest::Client;
use tracing::debug;

use crate::config::VoucherifyConfig;
use crate::contract::CustomerSink;
use crate::error::SyncError;
use crate::mapper::VoucherifyCustomer;

const VOUCHERIFY_BASE_URL: &str = "https://api.voucherify.io/v1";

/// HTTP client for Voucherify's asynchronous bulk customer upsert.
///
/// A 2xx response (202 in practice) means the batch was accepted for
/// processing, not that it has been persisted; idempotent reprocessing of
/// the same source_id is the API's responsibility.
pub struct VoucherifyClient {
    http: Client,
    base_url: String,
    application_id: String,
    secret_key: String,
}

impl VoucherifyClient {
    pub fn new(config: &VoucherifyConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: VOUCHERIFY_BASE_URL.to_string(),
            application_id: config.application_id.clone(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl CustomerSink for VoucherifyClient {
    async fn upsert(&self, customers: &[VoucherifyCustomer]) -> Result<(), SyncError> {
        let url = format!("{}/customers/bulk/async", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-App-Id", &self.application_id)
            .header("X-App-Token", &self.secret_key)
            .json(&customers)
            .send()
            .await
            .map_err(|e| SyncError::Upsert {
                status: None,
                reason: format!("request error: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Upsert {
                status: Some(status.as_u16()),
                reason: if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                } else {
                    body
                },
            });
        }
        Ok(())
    }
}

/// Submit `customers` to the sink in contiguous, order-preserving chunks of
/// at most `max_batch_size` (the API caps per-request record counts).
///
/// No internal retry: a failed chunk surfaces immediately and the whole page
/// is retried by the controller from the retained cursor.
pub async fn upsert_in_chunks<S>(
    sink: &S,
    customers: &[VoucherifyCustomer],
    max_batch_size: usize,
) -> Result<(), SyncError>
where
    S: CustomerSink + ?Sized,
{
    for chunk in customers.chunks(max_batch_size) {
        sink.upsert(chunk).await?;
        debug!(chunk_len = chunk.len(), "customer chunk accepted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockCustomerSink;
    use crate::mapper::Address;
    use std::sync::{Arc, Mutex};

    fn customer(n: usize) -> VoucherifyCustomer {
        VoucherifyCustomer {
            name: None,
            source_id: format!("src-{n}"),
            email: None,
            description: None,
            address: Address::default(),
            phone: None,
            birthdate: None,
            metadata: None,
            system_metadata: serde_json::json!({ "source": "segmentio" }),
        }
    }

    #[tokio::test]
    async fn partitions_into_capped_ordered_chunks() {
        let customers: Vec<_> = (0..250).map(customer).collect();
        let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));

        let mut sink = MockCustomerSink::new();
        let seen_in_mock = seen.clone();
        sink.expect_upsert().times(3).returning(move |chunk| {
            seen_in_mock
                .lock()
                .unwrap()
                .push((chunk.len(), chunk[0].source_id.clone()));
            Ok(())
        });

        upsert_in_chunks(&sink, &customers, 100).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (100, "src-0".to_string()),
                (100, "src-100".to_string()),
                (50, "src-200".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_chunk_stops_submission() {
        let customers: Vec<_> = (0..30).map(customer).collect();

        let mut sink = MockCustomerSink::new();
        let mut calls = 0;
        sink.expect_upsert().times(2).returning(move |_| {
            calls += 1;
            if calls == 2 {
                Err(SyncError::Upsert {
                    status: Some(500),
                    reason: "server error".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let err = upsert_in_chunks(&sink, &customers, 10).await.unwrap_err();
        assert!(matches!(err, SyncError::Upsert { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let mut sink = MockCustomerSink::new();
        sink.expect_upsert().times(0);
        upsert_in_chunks(&sink, &[], 100).await.unwrap();
    }
}
