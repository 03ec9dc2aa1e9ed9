//! Configuration for logtint.
//!
//! Everything has a built-in default; an optional TOML file overrides
//! individual fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use logtint_types::Severity;

use crate::classifier::{Classifier, Rule, builtin_rules};
use crate::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub discovery: DiscoveryConfig,
    pub classifier: ClassifierConfig,
    pub tail: TailConfig,
}

/// Gate and reconciler tuning, all in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Quiet period before a burst of notifications triggers a pass
    pub debounce_ms: u64,

    /// Notifications this soon after a pass are ignored
    pub cooldown_ms: u64,

    /// Unchanged content this soon after a pass is skipped
    pub fast_skip_ms: u64,

    /// Fallback poll period
    pub poll_interval_ms: u64,

    /// Discovery attempts at startup before giving up to the poll
    pub bootstrap_retries: u32,

    /// Delay between startup discovery attempts
    pub bootstrap_retry_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            cooldown_ms: 200,
            fast_skip_ms: 500,
            poll_interval_ms: 6_000,
            bootstrap_retries: 5,
            bootstrap_retry_ms: 1_000,
        }
    }
}

impl TimingConfig {
    /// Replace zero durations with 1ms so timers never spin
    pub fn normalized(self) -> Self {
        Self {
            debounce_ms: self.debounce_ms.max(1),
            cooldown_ms: self.cooldown_ms,
            fast_skip_ms: self.fast_skip_ms,
            poll_interval_ms: self.poll_interval_ms.max(1),
            bootstrap_retries: self.bootstrap_retries,
            bootstrap_retry_ms: self.bootstrap_retry_ms.max(1),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn fast_skip(&self) -> Duration {
        Duration::from_millis(self.fast_skip_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn bootstrap_retry(&self) -> Duration {
        Duration::from_millis(self.bootstrap_retry_ms)
    }
}

/// How the log surface is found among candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Substring the surface text must contain; empty accepts any surface
    pub marker: String,
}

/// Rule table override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Ordered rules; empty keeps the built-in table
    pub rules: Vec<Rule>,

    /// Severity for lines no rule matches
    pub fallback: Severity,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Severity::Info,
        }
    }
}

impl ClassifierConfig {
    pub fn build(&self) -> Classifier {
        let rules = if self.rules.is_empty() {
            builtin_rules()
        } else {
            self.rules.clone()
        };
        Classifier::new(rules, self.fallback)
    }
}

/// File tailer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// How often the followed file is read
    pub interval_ms: u64,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self { interval_ms: 250 }
    }
}

impl TailConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.validate()?;
        config.timing = config.timing.normalized();
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (idx, rule) in self.classifier.rules.iter().enumerate() {
            let n = idx + 1;
            if rule.tokens.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "classifier rule {n} has no tokens"
                )));
            }
            // A blank token matches every line
            if rule.tokens.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "classifier rule {n} has an empty token"
                )));
            }
            if let Some(demotion) = &rule.demotion {
                if demotion.markers.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "classifier rule {n} has a demotion without markers"
                    )));
                }
                if demotion.markers.iter().any(|m| m.trim().is_empty()) {
                    return Err(ConfigError::Invalid(format!(
                        "classifier rule {n} has an empty demotion marker"
                    )));
                }
            }
        }
        Ok(())
    }
}
