use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::cache::CachePolicy;
use super::manager::ConversationAgent;
use crate::config::Settings;
use crate::services::{AlphaVantageClient, LlmService, RetrievalService, SearchPageScraper};

fn policy(max_entries: Option<usize>) -> CachePolicy {
    match max_entries {
        Some(n) => CachePolicy::bounded(n),
        None => CachePolicy::unbounded(),
    }
}

/// Wire the HTTP collaborators selected in `settings` into an agent
pub fn build_agent(settings: &Settings) -> Result<ConversationAgent> {
    let llm = Arc::new(LlmService::new(settings.llm.clone())?);
    info!("Completion endpoint: {} (model {})", settings.llm.base_url, settings.llm.model);

    let mut builder = ConversationAgent::builder(llm)
        .system_prompt(settings.agent.system_prompt.clone())
        .quote_cache(policy(settings.cache.quote_max_entries))
        .search_cache(policy(settings.cache.search_max_entries))
        .max_search_results(settings.web_search.max_results)
        .upload_max_chars(settings.upload.max_chars)
        .rollback_failed_turn(settings.agent.rollback_failed_turn);

    if settings.quotes.enabled {
        builder = builder.quotes(Arc::new(AlphaVantageClient::new(settings.quotes.clone())?));
        info!("Stock quotes enabled ({} interval)", settings.quotes.interval);
    }

    if settings.retrieval.enabled {
        let retriever = RetrievalService::new(&settings.retrieval, settings.retrieval_api_key())?;
        builder = builder.retriever(Arc::new(retriever));
        info!("Document retrieval enabled: {}", settings.retrieval.url);
    }

    if settings.web_search.enabled {
        builder = builder.web_search(Arc::new(SearchPageScraper::new(settings.web_search.clone())?));
        info!("Live web search enabled: {}", settings.web_search.search_url);
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Route;

    #[test]
    fn test_routes_follow_enabled_collaborators() {
        let mut settings = Settings::default();
        settings.quotes.enabled = false;
        settings.web_search.enabled = false;
        let agent = build_agent(&settings).unwrap();
        assert!(agent.router().routes().is_empty());

        settings.quotes.enabled = true;
        settings.web_search.enabled = true;
        let agent = build_agent(&settings).unwrap();
        assert_eq!(agent.router().routes(), &[Route::StockQuote, Route::WebBrowse]);
    }

    #[test]
    fn test_cache_bounds_applied() {
        let mut settings = Settings::default();
        settings.cache.quote_max_entries = Some(8);
        let agent = build_agent(&settings).unwrap();
        assert_eq!(agent.quote_cache().policy(), CachePolicy::bounded(8));
        assert_eq!(agent.search_cache().policy(), CachePolicy::unbounded());
    }

    #[test]
    fn test_system_prompt_seeds_history() {
        let agent = build_agent(&Settings::default()).unwrap();
        let history = agent.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, Settings::default().agent.system_prompt);
    }
}
