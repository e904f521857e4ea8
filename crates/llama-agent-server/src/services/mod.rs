pub mod llm_service;
pub mod quote_service;
pub mod retrieval_service;
pub mod web_search;

pub use llm_service::LlmService;
pub use quote_service::AlphaVantageClient;
pub use retrieval_service::RetrievalService;
pub use web_search::SearchPageScraper;
