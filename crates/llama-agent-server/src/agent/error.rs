use serde::Serialize;
use thiserror::Error;

/// Failure category, independent of which collaborator produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    MalformedResponse,
    RateLimited,
    NoMatch,
    BrowserSession,
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse completion response: {0}")]
    Malformed(String),

    #[error("completion response had no choices")]
    NoChoices,
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("API request limit reached. Please wait a while before trying again.")]
    RateLimited,

    #[error("No stock data found for the provided symbol.")]
    NoData,

    #[error("Error: Unable to fetch stock data (HTTP {0}).")]
    Status(u16),

    #[error("Error: Unable to fetch stock data ({0}).")]
    Transport(String),

    #[error("Error: Unable to fetch stock data (invalid response: {0}).")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No live data found for the query.")]
    NoResults,

    #[error("Error fetching live web data: {0}")]
    Session(String),
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("retrieval request failed: {0}")]
    Transport(String),

    #[error("failed to parse retrieval response: {0}")]
    Malformed(String),
}

/// Outcome of a message that did not produce a normal reply.
///
/// `Display` renders the exact text the legacy front ends show in place of
/// an assistant reply.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Please provide a valid stock symbol (e.g., TSLA, AAPL).")]
    MissingSymbol,

    #[error("{0}")]
    Quote(#[from] QuoteError),

    #[error("Live Web Data:\n{0}")]
    WebSearch(#[from] SearchError),

    #[error("Error: Unable to fetch a response from the model.")]
    Completion(#[from] CompletionError),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::MissingSymbol => ErrorKind::NoMatch,
            AgentError::Quote(e) => match e {
                QuoteError::RateLimited => ErrorKind::RateLimited,
                QuoteError::NoData => ErrorKind::NoMatch,
                QuoteError::Status(_) | QuoteError::Transport(_) => ErrorKind::Transport,
                QuoteError::Malformed(_) => ErrorKind::MalformedResponse,
            },
            AgentError::WebSearch(e) => match e {
                SearchError::NoResults => ErrorKind::NoMatch,
                SearchError::Session(_) => ErrorKind::BrowserSession,
            },
            AgentError::Completion(e) => match e {
                CompletionError::Transport(_) | CompletionError::Status { .. } => {
                    ErrorKind::Transport
                }
                CompletionError::Malformed(_) | CompletionError::NoChoices => {
                    ErrorKind::MalformedResponse
                }
            },
        }
    }

    /// Collaborator-level detail, for logs and structured responses
    pub fn detail(&self) -> String {
        match self {
            AgentError::Completion(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
