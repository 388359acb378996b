use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

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
/// Every setting has a default, so an empty environment yields a working
/// config that writes to `./champtrend.db` and skips notification.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so `FOO=` in a .env file disables a feature.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = or_default("DATABASE_URL", "sqlite://champtrend.db");
    let log_level = or_default("CHAMPTREND_LOG_LEVEL", "info");

    let webhook_url = optional("CHAMPTREND_WEBHOOK_URL");
    let webhook_username = or_default("CHAMPTREND_WEBHOOK_USERNAME", "champtrend");

    let db_max_connections = parse_u32("CHAMPTREND_DB_MAX_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CHAMPTREND_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let reference_base_url = or_default(
        "CHAMPTREND_REFERENCE_BASE_URL",
        "https://ddragon.leagueoflegends.com",
    );
    let reference_locale = or_default("CHAMPTREND_REFERENCE_LOCALE", "zh_CN");
    let metric_base_url = or_default("CHAMPTREND_METRIC_BASE_URL", "https://api.bilibili.com");
    let metric_keyword_prefix = or_default("CHAMPTREND_METRIC_KEYWORD_PREFIX", "LOL");
    let metric_top_n = parse_usize("CHAMPTREND_METRIC_TOP_N", "5")?;

    let max_entities_per_run = match optional("CHAMPTREND_MAX_ENTITIES_PER_RUN") {
        Some(raw) => {
            let limit = raw
                .parse::<usize>()
                .map_err(|e| invalid("CHAMPTREND_MAX_ENTITIES_PER_RUN", e.to_string()))?;
            if limit == 0 {
                return Err(invalid(
                    "CHAMPTREND_MAX_ENTITIES_PER_RUN",
                    "must be at least 1; unset it to collect the full roster".to_string(),
                ));
            }
            Some(limit)
        }
        None => None,
    };

    let scraper_request_timeout_secs = parse_u64("CHAMPTREND_SCRAPER_REQUEST_TIMEOUT_SECS", "5")?;
    let scraper_user_agent = or_default("CHAMPTREND_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_cookie = or_default("CHAMPTREND_SCRAPER_COOKIE", "buvid3=infoc;");
    let scraper_min_delay_ms = parse_u64("CHAMPTREND_SCRAPER_MIN_DELAY_MS", "500")?;
    let scraper_max_delay_ms = parse_u64("CHAMPTREND_SCRAPER_MAX_DELAY_MS", "1500")?;
    if scraper_min_delay_ms > scraper_max_delay_ms {
        return Err(invalid(
            "CHAMPTREND_SCRAPER_MIN_DELAY_MS",
            format!(
                "{scraper_min_delay_ms} exceeds CHAMPTREND_SCRAPER_MAX_DELAY_MS ({scraper_max_delay_ms})"
            ),
        ));
    }
    let scraper_max_retries = parse_u32("CHAMPTREND_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms =
        parse_u64("CHAMPTREND_SCRAPER_RETRY_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        database_url,
        log_level,
        webhook_url,
        webhook_username,
        db_max_connections,
        db_acquire_timeout_secs,
        reference_base_url,
        reference_locale,
        metric_base_url,
        metric_keyword_prefix,
        metric_top_n,
        max_entities_per_run,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_cookie,
        scraper_min_delay_ms,
        scraper_max_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
