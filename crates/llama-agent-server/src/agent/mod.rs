//! Conversation agent
//!
//! Routes each user message to one of:
//! - a cached stock quote lookup
//! - a cached live web search
//! - the completion model, optionally augmented with retrieved documents

mod cache;
pub mod error;
pub mod factory;
mod manager;
pub mod providers;
pub mod router;

pub use cache::{CachePolicy, TextCache};
pub use error::{AgentError, CompletionError, ErrorKind, QuoteError, RetrievalError, SearchError};
pub use factory::build_agent;
pub use manager::{ConversationAgent, ConversationAgentBuilder, Reply, ReplyRoute};
pub use providers::{
    ChatCompletion, DocumentRetriever, QuoteProvider, QuoteSnapshot, SearchHit, WebSearcher,
};
pub use router::{Intent, IntentRouter, Route};
