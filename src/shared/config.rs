//! Application configuration. Panel URL, display timings, polling intervals.

use crate::domain::routes::DEFAULT_PUBLIC_ROUTES;
use crate::domain::validation::DEFAULT_MIN_PASSWORD_LEN;
use serde::Deserialize;

/// Carousel step for courses and masters.
pub const DEFAULT_CAROUSEL_INTERVAL_MS: u64 = 8_000;
/// News interstitial period, measured from one opening to the next.
pub const DEFAULT_NEWS_CYCLE_MS: u64 = 15_000;
/// How long the interstitial stays up before it hides and advances.
pub const DEFAULT_NEWS_VISIBLE_MS: u64 = 10_000;
/// Countdown step shown inside the interstitial.
pub const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1_000;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Base URL of the panel API. Read from CAMPUS_DISPLAY_API_BASE_URL.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Use in-memory stores and session instead of the panel API. Read from CAMPUS_DISPLAY_OFFLINE.
    #[serde(default)]
    pub offline: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Display timings
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub carousel_interval_ms: Option<u64>,

    #[serde(default)]
    pub news_cycle_ms: Option<u64>,

    #[serde(default)]
    pub news_visible_ms: Option<u64>,

    #[serde(default)]
    pub countdown_tick_ms: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────────
    /// Seconds between catalog snapshot refreshes (default 60).
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,

    /// Seconds between session re-checks (default 300).
    #[serde(default)]
    pub session_refresh_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────
    /// Routes reachable without a session. Comma-separated in env (default "/login,/register").
    #[serde(default)]
    pub public_routes: Option<Vec<String>>,

    #[serde(default)]
    pub min_password_len: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(
            config::Environment::with_prefix("CAMPUS_DISPLAY")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("public_routes"),
        );
        if let Ok(path) = std::env::var("CAMPUS_DISPLAY_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the panel base URL without a trailing slash. Defaults to http://localhost:3000.
    pub fn api_base_url_or_default(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or("http://localhost:3000")
            .trim_end_matches('/')
            .to_string()
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    pub fn carousel_interval_ms_or_default(&self) -> u64 {
        self.carousel_interval_ms
            .unwrap_or(DEFAULT_CAROUSEL_INTERVAL_MS)
    }

    pub fn news_cycle_ms_or_default(&self) -> u64 {
        self.news_cycle_ms.unwrap_or(DEFAULT_NEWS_CYCLE_MS)
    }

    pub fn news_visible_ms_or_default(&self) -> u64 {
        self.news_visible_ms.unwrap_or(DEFAULT_NEWS_VISIBLE_MS)
    }

    pub fn countdown_tick_ms_or_default(&self) -> u64 {
        self.countdown_tick_ms.unwrap_or(DEFAULT_COUNTDOWN_TICK_MS)
    }

    /// Returns the catalog refresh interval in seconds. Defaults to 60.
    pub fn refresh_interval_secs_or_default(&self) -> u64 {
        self.refresh_interval_secs.unwrap_or(60)
    }

    /// Returns the session re-check interval in seconds. Defaults to 300.
    pub fn session_refresh_secs_or_default(&self) -> u64 {
        self.session_refresh_secs.unwrap_or(300)
    }

    pub fn public_routes_or_default(&self) -> Vec<String> {
        match &self.public_routes {
            Some(routes) if !routes.is_empty() => routes.clone(),
            _ => DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn min_password_len_or_default(&self) -> usize {
        self.min_password_len.unwrap_or(DEFAULT_MIN_PASSWORD_LEN)
    }
}
