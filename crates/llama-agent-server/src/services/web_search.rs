use crate::agent::{SearchError, SearchHit, WebSearcher};
use crate::config::WebSearchConfig;
use crate::utils::http::build_client;
use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

/// Fetches a search results page and scrapes title/snippet pairs from it.
///
/// Selectors are checked when the scraper is built. Blocks missing either
/// part are skipped, so the caller only ever sees complete hits.
#[derive(Clone)]
pub struct SearchPageScraper {
    client: Client,
    config: WebSearchConfig,
}

impl SearchPageScraper {
    pub fn new(config: WebSearchConfig) -> Result<Self> {
        for selector in [
            &config.result_selector,
            &config.title_selector,
            &config.snippet_selector,
        ] {
            parse_selector(selector)?;
        }

        let client = build_client(config.timeout_seconds, Some(&config.user_agent))
            .context("Failed to create HTTP client for web search")?;
        Ok(Self { client, config })
    }

    fn search_url(&self, query: &str) -> Result<Url, SearchError> {
        Url::parse_with_params(&self.config.search_url, &[(self.config.query_param.as_str(), query)])
            .map_err(|e| SearchError::Session(format!("invalid search url: {}", e)))
    }

    pub async fn fetch_results_page(&self, query: &str) -> Result<String, SearchError> {
        let url = self.search_url(query)?;
        info!("Loading search page for {:?}", query);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Session(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Session(format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::Session(e.to_string()))
    }

    /// Pull hits out of a results page
    pub fn extract_hits(&self, html: &str) -> Result<Vec<SearchHit>, SearchError> {
        let selector = |s: &str| {
            parse_selector(s).map_err(|e| SearchError::Session(e.to_string()))
        };
        let result = selector(&self.config.result_selector)?;
        let title = selector(&self.config.title_selector)?;
        let snippet = selector(&self.config.snippet_selector)?;

        let document = Html::parse_document(html);
        let mut hits = Vec::new();
        for block in document.select(&result) {
            let Some(title_text) = first_text(block, &title) else {
                continue;
            };
            let Some(snippet_text) = first_text(block, &snippet) else {
                continue;
            };
            hits.push(SearchHit { title: title_text, snippet: snippet_text });
        }

        debug!("Extracted {} complete results", hits.len());
        Ok(hits)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid CSS selector {:?}: {:?}", selector, e))
}

/// Whitespace-normalized text of the first match, `None` when absent or blank
fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = block.select(selector).next()?;
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

#[async_trait::async_trait]
impl WebSearcher for SearchPageScraper {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let html = self.fetch_results_page(query).await?;

        // let client-side rendering finish on pages that need it
        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        self.extract_hits(&html)
    }
}
