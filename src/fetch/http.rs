//! HTTP implementation of the page fetcher
//!
//! Talks to the platform's donor-list endpoint:
//! `{base_url}/campaigns/{campaign_id}/donors?sort={sort}[&next={cursor}]`
//! and decodes the JSON envelope `{ "data": [...], "next": "..." }`. An empty
//! `next` token is the platform's end-of-stream marker.

use crate::config::SourceConfig;
use crate::fetch::{FetchError, FetchResult, PageFetcher};
use crate::model::{Cursor, CursorPage, Donation};
use crate::HarvestError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Wire shape of one donor-list response
#[derive(Debug, Deserialize)]
struct DonorsEnvelope {
    #[serde(default)]
    data: Vec<Donation>,

    /// Continuation token; empty or absent means end of stream
    #[serde(default)]
    next: Option<String>,
}

/// Builds an HTTP client with the configured user agent and sane timeouts
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Donor-page fetcher over the platform's HTTP API
pub struct HttpPageFetcher {
    client: Client,
    base_url: Url,
    sort: String,
}

impl HttpPageFetcher {
    /// Creates a fetcher from the `[source]` configuration section
    pub fn new(source: &SourceConfig) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&source.base_url)?;
        let client = build_http_client(&source.user_agent)?;
        Ok(Self {
            client,
            base_url,
            sort: source.sort.clone(),
        })
    }

    /// Builds the donor-list URL for one page request
    fn donors_url(&self, campaign_id: &str, cursor: &Cursor) -> Result<Url, url::ParseError> {
        let mut url = self
            .base_url
            .join(&format!("campaigns/{}/donors", campaign_id))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("sort", &self.sort);
            if let Some(token) = cursor.as_token() {
                pairs.append_pair("next", token);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, campaign_id: &str, cursor: &Cursor) -> FetchResult<CursorPage> {
        let url = self
            .donors_url(campaign_id, cursor)
            .map_err(|e| FetchError::Malformed {
                campaign_id: campaign_id.to_string(),
                cursor: cursor.to_string(),
                message: format!("bad request URL: {}", e),
            })?;

        tracing::debug!(%campaign_id, %cursor, %url, "fetching donor page");

        let response = self.client.get(url).send().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout {
                    campaign_id: campaign_id.to_string(),
                    cursor: cursor.to_string(),
                }
            } else {
                FetchError::Http {
                    campaign_id: campaign_id.to_string(),
                    cursor: cursor.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                campaign_id: campaign_id.to_string(),
                cursor: cursor.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: DonorsEnvelope =
            response.json().await.map_err(|e| FetchError::Malformed {
                campaign_id: campaign_id.to_string(),
                cursor: cursor.to_string(),
                message: e.to_string(),
            })?;

        let next_cursor = match envelope.next.as_deref() {
            Some(token) => Cursor::from_token(token),
            None => Cursor::End,
        };

        Ok(CursorPage {
            campaign_id: campaign_id.to_string(),
            records: envelope.data,
            next_cursor,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> SourceConfig {
        SourceConfig {
            base_url: "https://core.example.com/".to_string(),
            sort: "verified".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) test".to_string(),
        }
    }

    #[test]
    fn head_request_carries_no_next_param() {
        let fetcher = HttpPageFetcher::new(&test_source()).unwrap();
        let url = fetcher.donors_url("bersamasehat", &Cursor::Head).unwrap();
        assert_eq!(
            url.as_str(),
            "https://core.example.com/campaigns/bersamasehat/donors?sort=verified"
        );
    }

    #[test]
    fn continuation_request_embeds_the_token() {
        let fetcher = HttpPageFetcher::new(&test_source()).unwrap();
        let cursor = Cursor::Next("87644292_1662247648".to_string());
        let url = fetcher.donors_url("bersamasehat", &cursor).unwrap();
        assert!(url
            .query()
            .unwrap()
            .contains("next=87644292_1662247648"));
    }

    #[test]
    fn envelope_decodes_with_empty_next() {
        let json = r#"{"data": [{"id": 1, "amount": 5000}], "next": ""}"#;
        let envelope: DonorsEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.next.as_deref(), Some(""));
        assert_eq!(Cursor::from_token(envelope.next.as_deref().unwrap()), Cursor::End);
    }

    #[test]
    fn envelope_tolerates_missing_next() {
        let envelope: DonorsEnvelope = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(envelope.next.is_none());
    }
}
