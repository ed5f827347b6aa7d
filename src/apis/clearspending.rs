use crate::common::constants::{CONTRACTS_SEARCH_URL, REQUEST_DELAY_SECS};
use crate::common::error::{PipelineError, Result};
use crate::common::types::RawApiData;
use serde_json::Value;
use std::time::Duration;
use tracing::{instrument, warn};

/// Ordered set of contracts API keys. The cursor only moves forward, and
/// only when the current key hits its rate limit.
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    current: usize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(PipelineError::Config(
                "at least one contracts API key is required".to_string(),
            ));
        }
        Ok(Self { keys, current: 0 })
    }

    pub fn current(&self) -> &str {
        &self.keys[self.current]
    }

    /// Move to the next key. Returns false when the ring is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.keys.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Zero-based index of the key currently in use.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Outcome of one filtered-contracts query for a single customer INN.
#[derive(Debug)]
pub enum QueryOutcome {
    /// 200 with at least one matching contract.
    Contracts(Vec<RawApiData>),
    /// 200 with zero matches. No retry.
    Empty,
    /// Non-success status or transport failure. The entity is skipped,
    /// no retry.
    Failed(String),
}

/// What the retry loop does with one response status.
#[derive(Debug, PartialEq, Eq)]
pub enum StatusAction {
    /// Success; parse the body.
    Parse,
    /// Rate limited; the ring advanced, pause and reissue the identical
    /// query with the new key.
    RetryWithNextKey,
    /// Other non-success; skip this entity.
    Skip,
}

/// Decide how one response status moves the retry loop. A 429 advances
/// the ring, so the reissued query differs from a first attempt only in
/// the key it carries; running the ring dry is the one fatal path.
pub fn dispatch_status(
    status: reqwest::StatusCode,
    keys: &mut KeyRing,
) -> Result<StatusAction> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        if !keys.advance() {
            warn!("Rate limit exceeded on the last of {} API keys", keys.len());
            return Err(PipelineError::KeysExhausted);
        }
        return Ok(StatusAction::RetryWithNextKey);
    }
    if status.is_success() {
        Ok(StatusAction::Parse)
    } else {
        Ok(StatusAction::Skip)
    }
}

/// A 200 body with a zero count means no suppliers for this entity.
fn outcome_from_body(result: Value) -> QueryOutcome {
    if result["count"].as_u64().unwrap_or(0) == 0 {
        return QueryOutcome::Empty;
    }
    QueryOutcome::Contracts(result["data"].as_array().cloned().unwrap_or_default())
}

/// Client for the public-contracts registry. Rate limiting (429) rotates
/// the key ring and retries the identical query after a pause; running the
/// ring dry is fatal for the whole run.
pub struct ContractsClient {
    client: reqwest::Client,
    keys: KeyRing,
    page_size: usize,
    sign_date_gte: String,
    sign_date_lte: String,
}

impl ContractsClient {
    pub fn new(
        keys: KeyRing,
        page_size: usize,
        sign_date_gte: impl Into<String>,
        sign_date_lte: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            keys,
            page_size,
            sign_date_gte: sign_date_gte.into(),
            sign_date_lte: sign_date_lte.into(),
        }
    }

    /// Query contracts where the given INN is the customer, sorted by
    /// amount descending, first page only. The retry loop is bounded by
    /// the key ring: every 429 either advances the ring or returns
    /// `KeysExhausted`.
    #[instrument(skip(self))]
    pub async fn contracts_for_customer(&mut self, inn: u64) -> Result<QueryOutcome> {
        loop {
            let response = match self.send_query(inn).await {
                Ok(response) => response,
                Err(e) => return Ok(QueryOutcome::Failed(format!("transport error: {e}"))),
            };

            let status = response.status();
            match dispatch_status(status, &mut self.keys)? {
                StatusAction::RetryWithNextKey => {
                    warn!("Rate limit exceeded; switching to API key #{}", self.keys.position() + 1);
                    tokio::time::sleep(Duration::from_secs(REQUEST_DELAY_SECS)).await;
                }
                StatusAction::Skip => {
                    let body = response.text().await.unwrap_or_default();
                    return Ok(QueryOutcome::Failed(format!(
                        "contracts search returned {status}: {body}"
                    )));
                }
                StatusAction::Parse => {
                    let result: Value = match response.json().await {
                        Ok(value) => value,
                        Err(e) => {
                            return Ok(QueryOutcome::Failed(format!("bad response body: {e}")))
                        }
                    };
                    return Ok(outcome_from_body(result));
                }
            }
        }
    }

    async fn send_query(&self, inn: u64) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(CONTRACTS_SEARCH_URL)
            .query(&[
                ("apikey", self.keys.current().to_string()),
                ("customer_inn", inn.to_string()),
                ("sign_date_gte", self.sign_date_gte.clone()),
                ("sign_date_lte", self.sign_date_lte.clone()),
                ("sort", "-amount_rur".to_string()),
                ("page_size", self.page_size.to_string()),
            ])
            .send()
            .await
    }
}
