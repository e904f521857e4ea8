use crate::agent::{DocumentRetriever, RetrievalError};
use crate::config::RetrievalConfig;
use crate::utils::http::build_client;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    documents: Vec<String>,
}

/// Client for the external document retrieval endpoint
#[derive(Clone)]
pub struct RetrievalService {
    client: Client,
    url: String,
    api_key: String,
}

impl RetrievalService {
    pub fn new(config: &RetrievalConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = build_client(config.timeout_seconds, None)
            .context("Failed to create HTTP client for retrieval")?;
        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: api_key.into(),
        })
    }

    /// Fetch documents relevant to `query`.
    /// A non-success status is treated as "nothing relevant".
    pub async fn retrieve_documents(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&RetrieveRequest { query })
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Retrieval endpoint returned HTTP {}", status.as_u16());
            return Ok(Vec::new());
        }

        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        debug!("Retrieved {} documents", body.documents.len());
        Ok(body.documents)
    }
}

#[async_trait::async_trait]
impl DocumentRetriever for RetrievalService {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        self.retrieve_documents(query).await
    }
}
