use std::path::PathBuf;

/// Default exchange-rate endpoints, tried in order.
pub const DEFAULT_RATE_SOURCES: &[&str] = &[
    "https://api.exchangerate-api.com/v4/latest/ILS",
    "https://open.er-api.com/v6/latest/ILS",
];

#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub categories_path: PathBuf,
    pub log_level: String,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub gemini_api_key: Option<String>,
    pub llm_model: String,
    pub llm_delay_ms: u64,
    pub llm_batch_size: usize,
    pub rate_sources: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("categories_path", &self.categories_path)
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_delay_ms", &self.llm_delay_ms)
            .field("llm_batch_size", &self.llm_batch_size)
            .field("rate_sources", &self.rate_sources)
            .finish()
    }
}
