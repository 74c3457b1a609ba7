//! Client for the address-search endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::types::Suggestion;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const ERROR_BODY_LIMIT: usize = 200;

/// Parameters for one autocomplete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub params: BTreeMap<String, String>,
    pub fuzzy: bool,
}

impl SearchQuery {
    /// Query string pairs in request order: `q`, pass-through params, then `fuzzy`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 2);
        pairs.push(("q".to_string(), self.text.clone()));
        pairs.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        if self.fuzzy {
            pairs.push(("fuzzy".to_string(), "true".to_string()));
        }
        pairs
    }
}

#[async_trait]
pub trait AddressApi: Send + Sync {
    async fn autocomplete(&self, query: &SearchQuery) -> Result<Vec<Suggestion>, ApiError>;

    /// Follow a reference link to the full address record.
    async fn fetch_detail(&self, href: &str) -> Result<Value, ApiError>;
}

/// HTTP client for the Danish address web API.
pub struct DawaClient {
    http: Client,
    endpoint: Url,
}

impl DawaClient {
    pub fn new(endpoint: Url) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| ApiError::Transport {
                url: endpoint.to_string(),
                source,
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_search(&self, query: &SearchQuery) -> Result<reqwest::Request, ApiError> {
        self.http
            .get(self.endpoint.clone())
            .query(&query.to_pairs())
            .header("Accept", "application/json")
            .build()
            .map_err(|source| ApiError::Transport {
                url: self.endpoint.to_string(),
                source,
            })
    }

    /// Reference links may be relative to the search endpoint.
    pub fn resolve_link(&self, href: &str) -> Result<Url, ApiError> {
        self.endpoint
            .join(href)
            .map_err(|_| ApiError::InvalidLink(href.to_string()))
    }

    async fn send_json(&self, request: reqwest::Request) -> Result<Value, ApiError> {
        let url = request.url().to_string();
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AddressApi for DawaClient {
    async fn autocomplete(&self, query: &SearchQuery) -> Result<Vec<Suggestion>, ApiError> {
        let request = self.build_search(query)?;
        let body = self.send_json(request).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_detail(&self, href: &str) -> Result<Value, ApiError> {
        let url = self.resolve_link(href)?;
        let request = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .build()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;
        self.send_json(request).await
    }
}
