use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::cache::{CachePolicy, TextCache};
use super::error::{AgentError, SearchError};
use super::providers::{ChatCompletion, DocumentRetriever, QuoteProvider, WebSearcher};
use super::router::{Intent, IntentRouter};
use crate::models::chat::ChatMessage;

pub const LIVE_WEB_DATA_LABEL: &str = "Live Web Data:\n";
pub const DOCUMENTS_HEADER: &str = "\n\nRelevant Documents:\n";
pub const UPLOAD_PROMPT: &str =
    "I'm sharing a text file with you. Please analyze its content and provide a summary:\n\n";

const DEFAULT_MAX_SEARCH_RESULTS: usize = 3;
const DEFAULT_UPLOAD_MAX_CHARS: usize = 4000;

/// Which branch of the routing policy produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRoute {
    StockQuote,
    WebBrowse,
    Conversation,
}

/// A successful outcome of [`ConversationAgent::respond`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub route: ReplyRoute,
    /// Served from the quote or search cache
    pub cached: bool,
    pub text: String,
}

/// Stateful chat agent.
///
/// Owns the conversation history, the quote and search caches and the
/// routing policy. Stock and browse requests are answered directly and never
/// touch the history; everything else goes to the completion model.
pub struct ConversationAgent {
    system_prompt: String,
    history: RwLock<Vec<ChatMessage>>,
    /// Serializes conversation turns so user/assistant pairs never interleave.
    /// The history lock itself is never held across a network call.
    turn: Mutex<()>,
    quote_cache: TextCache,
    search_cache: TextCache,
    router: IntentRouter,
    llm: Arc<dyn ChatCompletion>,
    quotes: Option<Arc<dyn QuoteProvider>>,
    web_search: Option<Arc<dyn WebSearcher>>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    max_search_results: usize,
    upload_max_chars: usize,
    rollback_failed_turn: bool,
}

impl ConversationAgent {
    pub fn builder(llm: Arc<dyn ChatCompletion>) -> ConversationAgentBuilder {
        ConversationAgentBuilder::new(llm)
    }

    /// Legacy text contract: failures come back as their display text
    pub async fn handle_message(&self, message: &str) -> String {
        match self.respond(message).await {
            Ok(reply) => reply.text,
            Err(e) => e.to_string(),
        }
    }

    /// Route one user message and return a structured outcome
    pub async fn respond(&self, message: &str) -> Result<Reply, AgentError> {
        info!("Handling message ({} chars)", message.len());

        match self.router.classify(message) {
            Intent::StockQuote { symbol: Some(symbol) } => match &self.quotes {
                Some(provider) => self.lookup_quote(provider.as_ref(), &symbol).await,
                None => self.converse(message).await,
            },
            Intent::StockQuote { symbol: None } => {
                debug!("Stock request without a recognizable symbol");
                Err(AgentError::MissingSymbol)
            }
            Intent::WebBrowse { query } => match &self.web_search {
                Some(searcher) => self.browse_web(searcher.as_ref(), &query).await,
                None => self.converse(message).await,
            },
            Intent::Conversation => self.converse(message).await,
        }
    }

    async fn lookup_quote(
        &self,
        provider: &dyn QuoteProvider,
        symbol: &str,
    ) -> Result<Reply, AgentError> {
        if let Some(text) = self.quote_cache.get(symbol) {
            return Ok(Reply { route: ReplyRoute::StockQuote, cached: true, text });
        }

        info!("Fetching quote for {}", symbol);
        let snapshot = provider.latest_quote(symbol).await.map_err(|e| {
            warn!("Quote lookup for {} failed: {}", symbol, e);
            e
        })?;

        let text = snapshot.render();
        self.quote_cache.insert(symbol, text.clone());
        Ok(Reply { route: ReplyRoute::StockQuote, cached: false, text })
    }

    async fn browse_web(
        &self,
        searcher: &dyn WebSearcher,
        query: &str,
    ) -> Result<Reply, AgentError> {
        if let Some(snippets) = self.search_cache.get(query) {
            return Ok(Reply {
                route: ReplyRoute::WebBrowse,
                cached: true,
                text: format!("{}{}", LIVE_WEB_DATA_LABEL, snippets),
            });
        }

        info!("Searching the web for {:?}", query);
        let hits = searcher.search(query).await.map_err(|e| {
            warn!("Web search for {:?} failed: {}", query, e);
            e
        })?;

        let lines: Vec<String> = hits
            .into_iter()
            .take(self.max_search_results)
            .map(|hit| format!("{}: {}", hit.title, hit.snippet))
            .collect();

        if lines.is_empty() {
            debug!("No usable results for {:?}", query);
            return Err(SearchError::NoResults.into());
        }

        let snippets = lines.join("\n");
        self.search_cache.insert(query, snippets.clone());
        Ok(Reply {
            route: ReplyRoute::WebBrowse,
            cached: false,
            text: format!("{}{}", LIVE_WEB_DATA_LABEL, snippets),
        })
    }

    /// Append retrieved documents to the message when the retriever has any
    async fn augment(&self, message: &str) -> String {
        let Some(retriever) = &self.retriever else {
            return message.to_string();
        };

        match retriever.retrieve(message).await {
            Ok(documents) if !documents.is_empty() => {
                debug!("Augmenting message with {} documents", documents.len());
                format!("{}{}{}", message, DOCUMENTS_HEADER, documents.join("\n"))
            }
            Ok(_) => message.to_string(),
            Err(e) => {
                warn!("Document retrieval failed, continuing without context: {}", e);
                message.to_string()
            }
        }
    }

    async fn converse(&self, message: &str) -> Result<Reply, AgentError> {
        let outgoing = self.augment(message).await;

        let _turn = self.turn.lock().await;
        let snapshot = {
            let mut history = self.history.write();
            history.push(ChatMessage::user(outgoing));
            history.clone()
        };
        debug!("Sending {} turns to the model", snapshot.len());

        match self.llm.complete(&snapshot).await {
            Ok(text) => {
                self.history.write().push(ChatMessage::assistant(text.clone()));
                Ok(Reply { route: ReplyRoute::Conversation, cached: false, text })
            }
            Err(e) => {
                error!("Completion failed: {}", e);
                if self.rollback_failed_turn {
                    self.history.write().pop();
                }
                Err(e.into())
            }
        }
    }

    /// Summarize an uploaded text file in a one-shot request, then record the
    /// exchange in the history
    pub async fn summarize_upload(&self, file_name: &str, text: &str) -> Result<String, AgentError> {
        let excerpt: String = text.chars().take(self.upload_max_chars).collect();
        info!("Summarizing upload {} ({} chars sent)", file_name, excerpt.chars().count());

        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::system(self.system_prompt.clone()));
        }
        messages.push(ChatMessage::user(format!("{}{}", UPLOAD_PROMPT, excerpt)));

        let response = self.llm.complete(&messages).await.map_err(|e| {
            error!("Upload summary for {} failed: {}", file_name, e);
            e
        })?;

        let _turn = self.turn.lock().await;
        let mut history = self.history.write();
        history.push(ChatMessage::user(format!("Uploaded file: {}", file_name)));
        history.push(ChatMessage::assistant(response.clone()));
        Ok(response)
    }

    /// Snapshot of the conversation so far
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.read().clone()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    pub fn quote_cache(&self) -> &TextCache {
        &self.quote_cache
    }

    pub fn search_cache(&self) -> &TextCache {
        &self.search_cache
    }
}

pub struct ConversationAgentBuilder {
    llm: Arc<dyn ChatCompletion>,
    system_prompt: String,
    quotes: Option<Arc<dyn QuoteProvider>>,
    web_search: Option<Arc<dyn WebSearcher>>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    quote_cache: CachePolicy,
    search_cache: CachePolicy,
    max_search_results: usize,
    upload_max_chars: usize,
    rollback_failed_turn: bool,
}

impl ConversationAgentBuilder {
    fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self {
            llm,
            system_prompt: String::new(),
            quotes: None,
            web_search: None,
            retriever: None,
            quote_cache: CachePolicy::unbounded(),
            search_cache: CachePolicy::unbounded(),
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            upload_max_chars: DEFAULT_UPLOAD_MAX_CHARS,
            rollback_failed_turn: false,
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn quotes(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.quotes = Some(provider);
        self
    }

    pub fn web_search(mut self, searcher: Arc<dyn WebSearcher>) -> Self {
        self.web_search = Some(searcher);
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn quote_cache(mut self, policy: CachePolicy) -> Self {
        self.quote_cache = policy;
        self
    }

    pub fn search_cache(mut self, policy: CachePolicy) -> Self {
        self.search_cache = policy;
        self
    }

    pub fn max_search_results(mut self, n: usize) -> Self {
        self.max_search_results = n.max(1);
        self
    }

    pub fn upload_max_chars(mut self, n: usize) -> Self {
        self.upload_max_chars = n;
        self
    }

    pub fn rollback_failed_turn(mut self, enabled: bool) -> Self {
        self.rollback_failed_turn = enabled;
        self
    }

    pub fn build(self) -> ConversationAgent {
        let history = if self.system_prompt.is_empty() {
            Vec::new()
        } else {
            vec![ChatMessage::system(self.system_prompt.clone())]
        };

        ConversationAgent {
            router: IntentRouter::for_capabilities(
                self.quotes.is_some(),
                self.web_search.is_some(),
            ),
            system_prompt: self.system_prompt,
            history: RwLock::new(history),
            turn: Mutex::new(()),
            quote_cache: TextCache::new("quote", self.quote_cache),
            search_cache: TextCache::new("search", self.search_cache),
            llm: self.llm,
            quotes: self.quotes,
            web_search: self.web_search,
            retriever: self.retriever,
            max_search_results: self.max_search_results,
            upload_max_chars: self.upload_max_chars,
            rollback_failed_turn: self.rollback_failed_turn,
        }
    }
}
