//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use scraper::Selector;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Environment variable that relocates the state file (set by CI runners).
pub const WORKSPACE_ENV: &str = "GITHUB_WORKSPACE";
pub const TWILIO_ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
pub const TWILIO_FROM_NUMBER_ENV: &str = "TWILIO_FROM_NUMBER";
pub const TWILIO_TO_NUMBER_ENV: &str = "YOUR_PHONE_NUMBER";

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Which storefront to watch
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Markup heuristics
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Where the last known state lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification text and delivery
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using the given variable lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(WORKSPACE_ENV).filter(|d| !d.trim().is_empty()) {
            self.storage.workspace_dir = PathBuf::from(dir);
        }
        self.notify.credentials = TwilioCredentials::from_lookup(&lookup);
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        for (name, value) in [
            ("site.base_url", &self.site.base_url),
            ("site.merch_url", &self.site.merch_url),
            ("site.tour_url", &self.site.tour_url),
            ("notify.api_base", &self.notify.api_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a URL: {e}")))?;
        }

        let ex = &self.extraction;
        if ex.product_marker.is_empty() {
            return Err(AppError::validation("extraction.product_marker is empty"));
        }
        if ex.container_selectors.is_empty() {
            return Err(AppError::validation("No merch container selectors defined"));
        }
        if ex.tour_class_keywords.is_empty() {
            return Err(AppError::validation("No tour class keywords defined"));
        }
        if ex.month_names.is_empty() {
            return Err(AppError::validation("No month names defined"));
        }
        for selector in ex.selectors() {
            parse_selector(selector)?;
        }

        if self.storage.state_file.trim().is_empty() {
            return Err(AppError::validation("storage.state_file is empty"));
        }
        Ok(())
    }
}

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// The storefront being watched.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin used to absolutize relative product links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    #[serde(default = "defaults::merch_url")]
    pub merch_url: String,

    #[serde(default = "defaults::tour_url")]
    pub tour_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            merch_url: defaults::merch_url(),
            tour_url: defaults::tour_url(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Browser-like User-Agent; the storefront rejects obvious bots
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Selectors and marker strings used by the extractors.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Product container selectors, tried in order
    #[serde(default = "defaults::container_selectors")]
    pub container_selectors: Vec<String>,

    /// Substring that every product name on the storefront carries
    #[serde(default = "defaults::product_marker")]
    pub product_marker: String,

    #[serde(default = "defaults::currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "defaults::sold_out_phrase")]
    pub sold_out_phrase: String,

    /// Elements searched for the product marker
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    #[serde(default = "defaults::price_selector")]
    pub price_selector: String,

    #[serde(default = "defaults::sold_out_selector")]
    pub sold_out_selector: String,

    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// Elements whose class list may mark a tour date
    #[serde(default = "defaults::tour_container_selector")]
    pub tour_container_selector: String,

    #[serde(default = "defaults::tour_class_keywords")]
    pub tour_class_keywords: Vec<String>,

    /// Elements scanned for month names when no class matches
    #[serde(default = "defaults::month_selector")]
    pub month_selector: String,

    #[serde(default = "defaults::month_names")]
    pub month_names: Vec<String>,
}

impl ExtractionConfig {
    /// Every selector string in this section.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.container_selectors.iter().map(String::as_str).chain([
            self.title_selector.as_str(),
            self.price_selector.as_str(),
            self.sold_out_selector.as_str(),
            self.link_selector.as_str(),
            self.tour_container_selector.as_str(),
            self.month_selector.as_str(),
        ])
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            container_selectors: defaults::container_selectors(),
            product_marker: defaults::product_marker(),
            currency_symbol: defaults::currency_symbol(),
            sold_out_phrase: defaults::sold_out_phrase(),
            title_selector: defaults::title_selector(),
            price_selector: defaults::price_selector(),
            sold_out_selector: defaults::sold_out_selector(),
            link_selector: defaults::link_selector(),
            tour_container_selector: defaults::tour_container_selector(),
            tour_class_keywords: defaults::tour_class_keywords(),
            month_selector: defaults::month_selector(),
            month_names: defaults::month_names(),
        }
    }
}

/// State file location.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::workspace_dir")]
    pub workspace_dir: PathBuf,

    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl StorageConfig {
    /// Full path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.workspace_dir.join(&self.state_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            workspace_dir: defaults::workspace_dir(),
            state_file: defaults::state_file(),
        }
    }
}

/// Notification text and SMS delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Name used in notification text
    #[serde(default = "defaults::artist")]
    pub artist: String,

    /// Twilio REST API root
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Only ever sourced from the environment
    #[serde(skip)]
    pub credentials: Option<TwilioCredentials>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            artist: defaults::artist(),
            api_base: defaults::api_base(),
            credentials: None,
        }
    }
}

/// SMS account credentials and phone numbers.
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

impl TwilioCredentials {
    /// Read all four values; `None` if any is missing or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            account_sid: get(TWILIO_ACCOUNT_SID_ENV)?,
            auth_token: get(TWILIO_AUTH_TOKEN_ENV)?,
            from_number: get(TWILIO_FROM_NUMBER_ENV)?,
            to_number: get(TWILIO_TO_NUMBER_ENV)?,
        })
    }
}

// Keeps the auth token out of debug logs.
impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .field("to_number", &self.to_number)
            .finish()
    }
}

mod defaults {
    use std::path::PathBuf;

    // Site defaults
    pub fn base_url() -> String {
        "https://quadeca.com".into()
    }
    pub fn merch_url() -> String {
        "https://quadeca.com/collections/all".into()
    }
    pub fn tour_url() -> String {
        "https://quadeca.com/pages/tour".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Extraction defaults
    pub fn container_selectors() -> Vec<String> {
        vec!["div.product-card".into(), "div.product-item".into()]
    }
    pub fn product_marker() -> String {
        "IDMTHY".into()
    }
    pub fn currency_symbol() -> String {
        "$".into()
    }
    pub fn sold_out_phrase() -> String {
        "Sold out".into()
    }
    pub fn title_selector() -> String {
        "h1, h2, h3, h4, span, div".into()
    }
    pub fn price_selector() -> String {
        "span, div, p".into()
    }
    pub fn sold_out_selector() -> String {
        "span, div, button".into()
    }
    pub fn link_selector() -> String {
        "a".into()
    }
    pub fn tour_container_selector() -> String {
        "div, li, section".into()
    }
    pub fn tour_class_keywords() -> Vec<String> {
        vec!["tour".into(), "event".into()]
    }
    pub fn month_selector() -> String {
        "div, p, span, h1, h2, h3, h4, h5".into()
    }
    pub fn month_names() -> Vec<String> {
        [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December", "Jan", "Feb", "Mar", "Apr",
            "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Storage defaults
    pub fn workspace_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn state_file() -> String {
        "last_known_state.json".into()
    }

    // Notify defaults
    pub fn artist() -> String {
        "Quadeca".into()
    }
    pub fn api_base() -> String {
        "https://api.twilio.com".into()
    }
}
