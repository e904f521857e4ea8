//! Seams to the external collaborators.
//!
//! The agent only talks to these traits; `crate::services` holds the HTTP
//! implementations and tests substitute mocks.

use async_trait::async_trait;

use super::error::{CompletionError, QuoteError, RetrievalError, SearchError};
use crate::models::chat::ChatMessage;

/// Most recent intraday bar for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub timestamp: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl QuoteSnapshot {
    /// The text block shown to the user and stored in the quote cache
    pub fn render(&self) -> String {
        format!(
            "Stock: {}\nTime: {}\nOpen: {}\nHigh: {}\nLow: {}\nClose: {}\nVolume: {}\n",
            self.symbol, self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// One search result that had both a title and a snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Chat completion endpoint (OpenAI-compatible)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}

/// Finance quote API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn latest_quote(&self, symbol: &str) -> Result<QuoteSnapshot, QuoteError>;
}

/// Document retrieval service used to augment prompts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>, RetrievalError>;
}

/// Live web search.
///
/// Returns hits in page order. Results whose title or snippet could not be
/// extracted are already skipped. An `Err` means the whole session failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}
