use crate::common::constants::SANCTIONS_SEARCH_URL;
use crate::common::error::{PipelineError, Result};
use crate::common::types::RawApiData;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Client for the sanctions directory's search endpoint. Results are paged
/// with an offset cursor; a short page ends a keyword's pagination.
pub struct SanctionsClient {
    client: reqwest::Client,
    api_key: String,
    page_size: usize,
}

impl SanctionsClient {
    pub fn new(api_key: impl Into<String>, page_size: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            page_size,
        }
    }

    /// Fetch every result page for one keyword. A failed request or a
    /// non-success status ends this keyword only; whatever was collected
    /// so far is returned.
    #[instrument(skip(self))]
    pub async fn search_keyword(&self, keyword: &str) -> Vec<RawApiData> {
        let mut collected = Vec::new();
        let mut offset = 0usize;
        loop {
            debug!("Requesting page for '{}' at offset {}", keyword, offset);
            match self.fetch_page(keyword, offset).await {
                Ok(results) => {
                    let short_page = results.len() < self.page_size;
                    collected.extend(results);
                    if short_page {
                        break;
                    }
                    offset += self.page_size;
                }
                Err(e) => {
                    warn!("Keyword '{}' aborted at offset {}: {}", keyword, offset, e);
                    break;
                }
            }
        }
        info!("Keyword '{}' returned {} raw results", keyword, collected.len());
        collected
    }

    async fn fetch_page(&self, keyword: &str, offset: usize) -> Result<Vec<RawApiData>> {
        let response = self
            .client
            .get(SANCTIONS_SEARCH_URL)
            .bearer_auth(&self.api_key)
            .query(&[
                ("q", keyword.to_string()),
                ("countries", "RU".to_string()),
                ("schema", "LegalEntity".to_string()),
                ("topics", "sanction".to_string()),
                ("fuzzy", "true".to_string()),
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                message: format!("sanctions search returned {status}: {body}"),
            });
        }

        let data: Value = response.json().await?;
        Ok(data["results"].as_array().cloned().unwrap_or_default())
    }
}
