//! Intent Router
//! Keyword-triggered dispatch evaluated in a fixed priority order.
//! The first route that claims a message wins; everything else is conversation.

use serde::Serialize;
use tracing::debug;

/// Longest token still treated as a ticker symbol
pub const MAX_SYMBOL_LEN: usize = 5;

const STOCK_KEYWORDS: [&str; 2] = ["stock", "price"];
const BROWSE_KEYWORDS: [&str; 2] = ["browse", "web"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Stock keyword present. `symbol` is `None` when no token qualified.
    StockQuote { symbol: Option<String> },

    /// Browse keyword present, query is the message with the keywords stripped
    WebBrowse { query: String },

    /// Everything else goes to the completion model
    Conversation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    StockQuote,
    WebBrowse,
}

impl Route {
    /// Returns the intent when this route claims the message
    pub fn detect(&self, message: &str) -> Option<Intent> {
        let lower = message.to_lowercase();
        match self {
            Route::StockQuote => {
                if !STOCK_KEYWORDS.iter().any(|k| lower.contains(k)) {
                    return None;
                }
                Some(Intent::StockQuote { symbol: extract_symbol(message) })
            }
            Route::WebBrowse => {
                if !BROWSE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                    return None;
                }
                Some(Intent::WebBrowse { query: browse_query(message) })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntentRouter {
    routes: Vec<Route>,
}

impl IntentRouter {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Router for whichever collaborators are available.
    /// Stock lookups always outrank browsing.
    pub fn for_capabilities(quotes: bool, web_search: bool) -> Self {
        let mut routes = Vec::with_capacity(2);
        if quotes {
            routes.push(Route::StockQuote);
        }
        if web_search {
            routes.push(Route::WebBrowse);
        }
        Self::new(routes)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn classify(&self, message: &str) -> Intent {
        for route in &self.routes {
            if let Some(intent) = route.detect(message) {
                debug!("Route {:?} claimed message: {:?}", route, intent);
                return intent;
            }
        }
        Intent::Conversation
    }
}

/// First whitespace-separated token made only of uppercase letters,
/// at most [`MAX_SYMBOL_LEN`] characters long. Case is taken from the
/// message as typed.
pub fn extract_symbol(message: &str) -> Option<String> {
    message
        .split_whitespace()
        .find(|word| is_symbol_token(word))
        .map(str::to_string)
}

fn is_symbol_token(word: &str) -> bool {
    !word.is_empty()
        && word.chars().count() <= MAX_SYMBOL_LEN
        && word.chars().all(char::is_uppercase)
}

/// Remove the first literal "browse" and then the first literal "web"
/// (case-sensitive) and trim what is left.
pub fn browse_query(message: &str) -> String {
    message
        .replacen("browse", "", 1)
        .replacen("web", "", 1)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_router() -> IntentRouter {
        IntentRouter::for_capabilities(true, true)
    }

    #[test]
    fn test_stock_intent_with_symbol() {
        assert_eq!(
            full_router().classify("What is the stock price of AAPL today"),
            Intent::StockQuote { symbol: Some("AAPL".to_string()) }
        );
        assert_eq!(
            full_router().classify("STOCK TSLA"),
            Intent::StockQuote { symbol: Some("STOCK".to_string()) }
        );
    }

    #[test]
    fn test_stock_intent_without_symbol() {
        assert_eq!(
            full_router().classify("what's the price of apple?"),
            Intent::StockQuote { symbol: None }
        );
        // punctuation and long tokens do not qualify
        assert_eq!(extract_symbol("price for MSFT?"), None);
        assert_eq!(extract_symbol("price for GOOGLE"), None);
        assert_eq!(extract_symbol("price for BRK.B"), None);
    }

    #[test]
    fn test_first_qualifying_token_wins() {
        assert_eq!(extract_symbol("Compare NVDA and AMD stock"), Some("NVDA".to_string()));
        assert_eq!(extract_symbol("I want a price"), Some("I".to_string()));
    }

    #[test]
    fn test_stock_outranks_browse() {
        assert_eq!(
            full_router().classify("browse the web for the stock price of IBM"),
            Intent::StockQuote { symbol: Some("IBM".to_string()) }
        );
    }

    #[test]
    fn test_browse_intent_query() {
        assert_eq!(
            full_router().classify("browse latest rust release"),
            Intent::WebBrowse { query: "latest rust release".to_string() }
        );
        assert_eq!(
            full_router().classify("search the web for tokio"),
            Intent::WebBrowse { query: "search the  for tokio".to_string() }
        );
    }

    #[test]
    fn test_browse_strip_is_case_sensitive_and_first_only() {
        // keyword matched case-insensitively but only lowercase literals are removed
        assert_eq!(browse_query("Web results for axum"), "Web results for axum");
        assert_eq!(browse_query("browse browse web web"), "browse  web");
        assert_eq!(browse_query("  web  "), "");
    }

    #[test]
    fn test_disabled_routes_fall_through() {
        let router = IntentRouter::for_capabilities(false, false);
        assert!(router.routes().is_empty());
        assert_eq!(router.classify("stock price of AAPL"), Intent::Conversation);

        let router = IntentRouter::for_capabilities(true, false);
        assert_eq!(router.classify("browse the web"), Intent::Conversation);
    }

    #[test]
    fn test_route_wire_names() {
        assert_eq!(serde_json::to_value(Route::StockQuote).unwrap(), "stock_quote");
        assert_eq!(serde_json::to_value(Route::WebBrowse).unwrap(), "web_browse");
    }

    #[test]
    fn test_conversation_default() {
        assert_eq!(full_router().classify("Tell me a joke"), Intent::Conversation);
    }

    #[test]
    fn test_custom_order_is_respected() {
        let router = IntentRouter::new(vec![Route::WebBrowse, Route::StockQuote]);
        assert_eq!(
            router.classify("web stock AAPL"),
            Intent::WebBrowse { query: "stock AAPL".to_string() }
        );
    }
}
