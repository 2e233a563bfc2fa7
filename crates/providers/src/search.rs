//! Google Custom Search JSON API client.
//!
//! Never returns an error: every failure is folded into a
//! [`SearchOutcome`] variant so prompt augmentation can degrade.

use std::time::{Duration, Instant};

use serde::Deserialize;

use gr_domain::config::SearchConfig;
use gr_domain::error::Result;
use gr_domain::trace::TraceEvent;

use crate::traits::{SearchHit, SearchOutcome, WebSearch};
use crate::util::{from_reqwest, optional_credential, redact_url_key, transport_error};

const PROVIDER: &str = "google-cse";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        SearchHit {
            title: item.title.unwrap_or_else(|| "N/A".into()),
            snippet: item
                .snippet
                .map(|s| s.replace('\n', " "))
                .unwrap_or_else(|| "N/A".into()),
            link: item.link.unwrap_or_else(|| "#".into()),
        }
    }
}

pub struct GoogleSearchClient {
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
    client: reqwest::Client,
}

impl GoogleSearchClient {
    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: optional_credential(&cfg.auth, "search api key"),
            engine_id: optional_credential(&cfg.engine_id, "search engine id"),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    async fn fetch(&self, api_key: &str, cx: &str, query: &str, count: u32) -> Result<Vec<SearchHit>> {
        let url = format!("{}/customsearch/v1", self.base_url);
        let count = count.clamp(1, 10).to_string();
        let req = self
            .client
            .get(&url)
            .query(&[("key", api_key), ("cx", cx), ("q", query), ("num", count.as_str())])
            .build()
            .map_err(from_reqwest)?;

        tracing::debug!(provider = PROVIDER, url = %redact_url_key(req.url().as_str()), "search request");

        let resp = self.client.execute(req).await.map_err(from_reqwest)?;
        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(transport_error(PROVIDER, status.as_u16(), &text));
        }

        let parsed: SearchResponse = serde_json::from_str(&text)?;
        Ok(parsed.items.into_iter().map(SearchHit::from).collect())
    }
}

#[async_trait::async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search(&self, query: &str, count: u32) -> SearchOutcome {
        if query.trim().is_empty() {
            return SearchOutcome::EmptyQuery;
        }
        let (Some(api_key), Some(cx)) = (self.api_key.as_deref(), self.engine_id.as_deref()) else {
            tracing::info!("search requested but not configured, skipping");
            return SearchOutcome::NotConfigured;
        };

        let start = Instant::now();
        let result = self.fetch(api_key, cx, query, count).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(hits) => {
                TraceEvent::SearchRequest {
                    provider: PROVIDER.into(),
                    results: hits.len(),
                    duration_ms,
                }
                .emit();
                if hits.is_empty() {
                    SearchOutcome::NoResults
                } else {
                    SearchOutcome::Hits(hits)
                }
            }
            Err(e) => {
                tracing::warn!(provider = PROVIDER, error = %e, "search failed");
                SearchOutcome::ProviderError(e.to_string())
            }
        }
    }
}
