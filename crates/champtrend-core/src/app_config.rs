#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    /// Outcome webhook; `None` disables notification.
    pub webhook_url: Option<String>,
    pub webhook_username: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub reference_base_url: String,
    pub reference_locale: String,
    pub metric_base_url: String,
    pub metric_keyword_prefix: String,
    pub metric_top_n: usize,
    /// Cap on entities the metric collector visits per run; `None` means the
    /// full roster.
    pub max_entities_per_run: Option<usize>,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_cookie: String,
    pub scraper_min_delay_ms: u64,
    pub scraper_max_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("log_level", &self.log_level)
            .field(
                "webhook_url",
                &self.webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("webhook_username", &self.webhook_username)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("reference_base_url", &self.reference_base_url)
            .field("reference_locale", &self.reference_locale)
            .field("metric_base_url", &self.metric_base_url)
            .field("metric_keyword_prefix", &self.metric_keyword_prefix)
            .field("metric_top_n", &self.metric_top_n)
            .field("max_entities_per_run", &self.max_entities_per_run)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_cookie", &"[redacted]")
            .field("scraper_min_delay_ms", &self.scraper_min_delay_ms)
            .field("scraper_max_delay_ms", &self.scraper_max_delay_ms)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .finish()
    }
}
