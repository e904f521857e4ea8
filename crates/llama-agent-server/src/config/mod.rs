pub mod settings;

pub use settings::{
    AgentConfig, CacheConfig, LlmConfig, LogFormat, LoggingConfig, QuotesConfig,
    RetrievalConfig, ServerConfig, Settings, UploadConfig, WebSearchConfig,
};
