//! Application configuration.
//!
//! Everything tunable by the surrounding application lives here: fetch
//! limits, blocking keywords, CDN rewrite rules, and analysis batching.
//! Defaults match production behavior; a TOML file can override any field.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Per-site-family fetch limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyLimits {
    /// Responses smaller than this are treated as likely blocked.
    pub min_response_bytes: usize,
    /// Retry cap for this family.
    pub max_attempts: u32,
}

/// Fetch engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total timeout per external request, seconds.
    pub request_timeout_secs: u64,
    /// Minimum interval between requests to the same domain per caller, seconds.
    pub min_request_interval_secs: u64,
    /// Randomized pre-request delay range, seconds.
    pub jitter_min_secs: u64,
    pub jitter_max_secs: u64,
    /// Backoff after a blocked attempt, seconds, indexed by attempt number.
    pub backoff_secs: Vec<u64>,
    /// Case-insensitive phrases that mark a challenge page.
    pub blocking_keywords: Vec<String>,
    /// Per-family size/attempt limits, keyed by family name.
    pub families: HashMap<String, FamilyLimits>,
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(self.min_request_interval_secs)
    }

    /// Limits for a family, falling back to the generic entry.
    pub fn limits_for(&self, family_key: &str) -> FamilyLimits {
        self.families
            .get(family_key)
            .or_else(|| self.families.get("generic"))
            .cloned()
            .unwrap_or(FamilyLimits {
                min_response_bytes: 1024,
                max_attempts: 2,
            })
    }

    /// Backoff delay after the given 1-based attempt number.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let idx = (attempt.saturating_sub(1)) as usize;
        let secs = self
            .backoff_secs
            .get(idx)
            .or_else(|| self.backoff_secs.last())
            .copied()
            .unwrap_or(30);
        Duration::from_secs(secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let mut families = HashMap::new();
        families.insert(
            "zealty".to_string(),
            FamilyLimits {
                min_response_bytes: 2048,
                max_attempts: 3,
            },
        );
        families.insert(
            "realtor_ca".to_string(),
            FamilyLimits {
                min_response_bytes: 5120,
                max_attempts: 5,
            },
        );
        families.insert(
            "redfin".to_string(),
            FamilyLimits {
                min_response_bytes: 4096,
                max_attempts: 3,
            },
        );
        families.insert(
            "generic".to_string(),
            FamilyLimits {
                min_response_bytes: 1024,
                max_attempts: 2,
            },
        );

        Self {
            request_timeout_secs: 30,
            min_request_interval_secs: 10,
            jitter_min_secs: 2,
            jitter_max_secs: 5,
            backoff_secs: vec![2, 5, 10, 20, 30],
            blocking_keywords: default_blocking_keywords(),
            families,
        }
    }
}

fn default_blocking_keywords() -> Vec<String> {
    [
        "incapsula",
        "imperva",
        "request unsuccessful",
        "access denied",
        "attention required",
        "checking your browser",
        "cloudflare",
        "perimeterx",
        "press & hold",
        "datadome",
        "pardon our interruption",
        "verify you are a human",
        "captcha",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Analysis batching and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Gemini API key; defaults from the GEMINI_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    /// Images per external analysis call.
    pub max_images_per_batch: usize,
    /// Hard cap on images considered for one listing.
    pub max_total_images: usize,
    /// Timeout for downloading one candidate image, seconds.
    pub image_download_timeout_secs: u64,
    /// Pause between consecutive batch calls, milliseconds.
    pub inter_batch_pause_ms: u64,
}

impl AnalysisConfig {
    /// API key from config, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }

    pub fn image_download_timeout(&self) -> Duration {
        Duration::from_secs(self.image_download_timeout_secs)
    }

    pub fn inter_batch_pause(&self) -> Duration {
        Duration::from_millis(self.inter_batch_pause_ms)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash-lite".to_string(),
            max_images_per_batch: 2,
            max_total_images: 25,
            image_download_timeout_secs: 10,
            inter_batch_pause_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_family_limits() {
        let config = FetchConfig::default();
        assert_eq!(config.limits_for("realtor_ca").max_attempts, 5);
        assert_eq!(config.limits_for("zealty").min_response_bytes, 2048);
        // Unknown families fall back to generic.
        assert_eq!(config.limits_for("nosuch").max_attempts, 2);
    }

    #[test]
    fn test_backoff_table_saturates() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for(3), Duration::from_secs(10));
        assert_eq!(config.backoff_for(99), Duration::from_secs(30));
    }

    #[test]
    fn test_toml_overrides() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [fetch]
            min_request_interval_secs = 3

            [fetch.families.realtor_ca]
            min_response_bytes = 100
            max_attempts = 2
            "#,
        )
        .unwrap();
        assert_eq!(parsed.fetch.min_request_interval_secs, 3);
        assert_eq!(parsed.fetch.limits_for("realtor_ca").max_attempts, 2);
    }
}
