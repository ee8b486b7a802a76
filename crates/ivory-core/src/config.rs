use crate::app_config::{AppConfig, DEFAULT_RATE_SOURCES};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let base_url = or_default("IVORY_BASE_URL", "https://www.ivory.co.il/");
    let categories_path = PathBuf::from(or_default(
        "IVORY_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let log_level = or_default("IVORY_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("IVORY_OUTPUT_DIR", "exports"));

    let request_timeout_secs = parse_u64("IVORY_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("IVORY_USER_AGENT", DEFAULT_USER_AGENT);
    let request_delay_ms = parse_u64("IVORY_REQUEST_DELAY_MS", "1000")?;
    let max_retries = parse_u32("IVORY_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("IVORY_RETRY_BACKOFF_BASE_SECS", "2")?;

    let gemini_api_key = lookup("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let llm_model = or_default("IVORY_LLM_MODEL", "gemini-2.0-flash");
    let llm_delay_ms = parse_u64("IVORY_LLM_DELAY_MS", "500")?;
    let llm_batch_size = parse_usize("IVORY_LLM_BATCH_SIZE", "5")?;
    if llm_batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "IVORY_LLM_BATCH_SIZE".to_string(),
            reason: "batch size must be at least 1".to_string(),
        });
    }

    let rate_sources = parse_rate_sources(lookup("IVORY_RATE_SOURCES").ok().as_deref())?;

    Ok(AppConfig {
        base_url,
        categories_path,
        log_level,
        output_dir,
        request_timeout_secs,
        user_agent,
        request_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        gemini_api_key,
        llm_model,
        llm_delay_ms,
        llm_batch_size,
        rate_sources,
    })
}

/// Splits a comma-separated endpoint list, falling back to the defaults when
/// the variable is unset.
fn parse_rate_sources(raw: Option<&str>) -> Result<Vec<String>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_RATE_SOURCES
            .iter()
            .map(|s| (*s).to_string())
            .collect());
    };

    let sources: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sources.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "IVORY_RATE_SOURCES".to_string(),
            reason: "at least one endpoint is required".to_string(),
        });
    }

    Ok(sources)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
