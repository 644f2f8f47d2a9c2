use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::extraction::{ExtractionConfig, ListOverride, Section};
use crate::llm_client::{LlmSettings, DEFAULT_API_BASE, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_timeout_secs: u64,
    pub outbound_concurrency: usize,
    pub outbound_interval_ms: u64,
    pub extract_workers: usize,
    pub enable_gender_inference: bool,
    pub genderize_url: String,
    pub genderize_timeout_secs: u64,
    pub max_upload_mb: usize,
    /// Extra headings that open the skills section.
    pub extra_skill_anchors: Vec<String>,
    /// Extra headings that end every section.
    pub extra_section_headings: Vec<String>,
    pub extra_degrees: Vec<String>,
    pub extra_issuers: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_api_base: env_or("GEMINI_API_BASE", DEFAULT_API_BASE),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 2)?,
            geocoder_url: env_or("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            geocoder_user_agent: env_or(
                "GEOCODER_USER_AGENT",
                concat!("cvsift/", env!("CARGO_PKG_VERSION")),
            ),
            geocode_timeout_secs: parse_env("GEOCODE_TIMEOUT_SECS", 10)?,
            outbound_concurrency: parse_env::<usize>("OUTBOUND_CONCURRENCY", 3)?.clamp(1, 5),
            outbound_interval_ms: parse_env("OUTBOUND_INTERVAL_MS", 1000)?,
            extract_workers: parse_env::<usize>("EXTRACT_WORKERS", default_workers)?.max(1),
            enable_gender_inference: parse_env("ENABLE_GENDER_INFERENCE", false)?,
            genderize_url: env_or("GENDERIZE_URL", "https://api.genderize.io"),
            genderize_timeout_secs: parse_env("GENDERIZE_TIMEOUT_SECS", 10)?,
            max_upload_mb: parse_env("MAX_UPLOAD_MB", 25)?,
            extra_skill_anchors: env_list("EXTRA_SKILL_ANCHORS"),
            extra_section_headings: env_list("EXTRA_SECTION_HEADINGS"),
            extra_degrees: env_list("EXTRA_DEGREES"),
            extra_issuers: env_list("EXTRA_ISSUERS"),
        })
    }

    /// LLM client settings, or `None` when no API key is configured.
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        self.gemini_api_key.as_ref().map(|key| LlmSettings {
            api_key: key.clone(),
            model: self.gemini_model.clone(),
            api_base: self.gemini_api_base.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
            max_retries: self.llm_max_retries,
        })
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn genderize_timeout(&self) -> Duration {
        Duration::from_secs(self.genderize_timeout_secs)
    }

    pub fn outbound_interval(&self) -> Duration {
        Duration::from_millis(self.outbound_interval_ms)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Stock pattern vocabulary extended with the configured keywords.
    pub fn extraction_config(&self) -> Result<ExtractionConfig> {
        let mut builder = ExtractionConfig::builder()
            .degrees(extend(&self.extra_degrees))
            .issuers(extend(&self.extra_issuers));
        if !self.extra_skill_anchors.is_empty() {
            builder = builder.anchors(Section::Skills, extend(&self.extra_skill_anchors));
        }
        if !self.extra_section_headings.is_empty() {
            for section in Section::ALL {
                builder = builder.terminators(section, extend(&self.extra_section_headings));
            }
        }
        builder
            .build()
            .context("Configured extraction keywords do not compile")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("geocoder_url", &self.geocoder_url)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocode_timeout_secs", &self.geocode_timeout_secs)
            .field("outbound_concurrency", &self.outbound_concurrency)
            .field("outbound_interval_ms", &self.outbound_interval_ms)
            .field("extract_workers", &self.extract_workers)
            .field("enable_gender_inference", &self.enable_gender_inference)
            .field("genderize_url", &self.genderize_url)
            .field("genderize_timeout_secs", &self.genderize_timeout_secs)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("extra_skill_anchors", &self.extra_skill_anchors)
            .field("extra_section_headings", &self.extra_section_headings)
            .field("extra_degrees", &self.extra_degrees)
            .field("extra_issuers", &self.extra_issuers)
            .finish()
    }
}

fn extend(values: &[String]) -> ListOverride<String> {
    if values.is_empty() {
        ListOverride::Default
    } else {
        ListOverride::Extend(values.to_vec())
    }
}

/// Comma-separated list; blank entries are dropped.
fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| split_list(&raw))
        .unwrap_or_default()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'"))
}
