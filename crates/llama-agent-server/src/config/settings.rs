use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/settings";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub quotes: QuotesConfig,
    pub retrieval: RetrievalConfig,
    pub web_search: WebSearchConfig,
    pub cache: CacheConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit in bytes (uploads)
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,llama_agent_server=debug".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Drop the user turn again when the completion call fails.
    /// Off by default: the turn stays in history.
    pub rollback_failed_turn: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt:
                "You are a stock analysis assistant that also helps with general queries."
                    .to_string(),
            rollback_failed_turn: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// No timeout when unset
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: "llama".to_string(),
            model: "Meta-Llama-3-8B-Instruct".to_string(),
            timeout_seconds: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QuotesConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub interval: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.alphavantage.co/query".to_string(),
            api_key: String::new(),
            interval: "1min".to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub url: String,
    /// Falls back to `llm.api_key` when unset
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://127.0.0.1:5000/retrieve".to_string(),
            api_key: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WebSearchConfig {
    pub enabled: bool,
    pub search_url: String,
    pub query_param: String,
    pub result_selector: String,
    pub title_selector: String,
    pub snippet_selector: String,
    pub max_results: usize,
    /// Fixed wait after the page is fetched, before extraction
    pub settle_delay_ms: u64,
    pub user_agent: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_url: "https://www.google.com/search".to_string(),
            query_param: "q".to_string(),
            result_selector: "div.g".to_string(),
            title_selector: "h3".to_string(),
            snippet_selector: "div.IsZvec".to_string(),
            max_results: 3,
            settle_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Size bounds for the quote and search caches. `None` keeps them unbounded.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub quote_max_entries: Option<usize>,
    pub search_max_entries: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
    /// Characters of the file forwarded to the model
    pub max_chars: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["txt".to_string()],
            max_chars: 4000,
        }
    }
}

impl Settings {
    /// Load `config/settings.*` (optional) overlaid with `APP__*` env vars.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Bearer token for the retrieval service
    pub fn retrieval_api_key(&self) -> &str {
        self.retrieval
            .api_key
            .as_deref()
            .unwrap_or(&self.llm.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_local_setup() {
        let settings = Settings::default();
        assert_eq!(settings.llm.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.llm.model, "Meta-Llama-3-8B-Instruct");
        assert_eq!(settings.web_search.max_results, 3);
        assert_eq!(settings.upload.max_chars, 4000);
        assert!(settings.cache.quote_max_entries.is_none());
        assert_eq!(settings.retrieval_api_key(), "llama");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = std::env::temp_dir().join(format!("llama-agent-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"phi4\"\n\n[retrieval]\nenabled = true\napi_key = \"secret\"\n\n[cache]\nquote_max_entries = 16"
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.model, "phi4");
        assert_eq!(settings.llm.base_url, "http://127.0.0.1:8080");
        assert!(settings.retrieval.enabled);
        assert_eq!(settings.retrieval_api_key(), "secret");
        assert_eq!(settings.cache.quote_max_entries, Some(16));
        assert!(settings.cache.search_max_entries.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
