//! Engine configuration.
//!
//! Values come from environment variables with defaults from
//! [`cerberus_core::defaults`]:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GROUPING_MAX_MENTIONS` | `500` | Unresolved mentions clustered per refresh, lowest id first |
//! | `GROUPING_STRONG_THRESHOLD` | `0.7` | Name similarity that always joins two mentions |
//! | `GROUPING_WEAK_THRESHOLD` | `0.5` | Name similarity that joins mentions of the same organization |
//! | `STAKEHOLDER_MATCH_THRESHOLD` | `0.6` | Fuzzy stakeholder match cutoff |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cerberus_core::defaults;
use cerberus_core::{ClusteringThresholds, Error, Result};

/// Tunables of the identity resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Maximum unresolved mentions considered by one refresh-grouping run,
    /// taken lowest id first. Must fit in an `i64`.
    pub max_mentions: usize,
    /// Name similarity above which two mentions always cluster.
    pub strong_threshold: f64,
    /// Name similarity above which mentions of the same organization cluster.
    pub weak_threshold: f64,
    /// Name similarity above which a stakeholder counts as a fuzzy match.
    pub stakeholder_match_threshold: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_mentions: defaults::GROUPING_MAX_MENTIONS,
            strong_threshold: defaults::STRONG_NAME_SIMILARITY,
            weak_threshold: defaults::WEAK_NAME_SIMILARITY,
            stakeholder_match_threshold: defaults::STAKEHOLDER_MATCH_THRESHOLD,
        }
    }
}

impl ResolutionConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, keeping defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();
        let config = Self {
            max_mentions: parse_var(&lookup, "GROUPING_MAX_MENTIONS", base.max_mentions)?,
            strong_threshold: parse_var(&lookup, "GROUPING_STRONG_THRESHOLD", base.strong_threshold)?,
            weak_threshold: parse_var(&lookup, "GROUPING_WEAK_THRESHOLD", base.weak_threshold)?,
            stakeholder_match_threshold: parse_var(
                &lookup,
                "STAKEHOLDER_MATCH_THRESHOLD",
                base.stakeholder_match_threshold,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the per-run mention cap.
    pub fn with_max_mentions(mut self, max: usize) -> Self {
        self.max_mentions = max;
        self
    }

    /// Set the clustering thresholds.
    pub fn with_thresholds(mut self, strong: f64, weak: f64) -> Self {
        self.strong_threshold = strong;
        self.weak_threshold = weak;
        self
    }

    pub fn clustering_thresholds(&self) -> ClusteringThresholds {
        ClusteringThresholds {
            strong: self.strong_threshold,
            weak: self.weak_threshold,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_mentions < defaults::MIN_GROUP_SIZE {
            return Err(Error::Config(format!(
                "GROUPING_MAX_MENTIONS must be at least {}",
                defaults::MIN_GROUP_SIZE
            )));
        }
        if i64::try_from(self.max_mentions).is_err() {
            return Err(Error::Config(format!(
                "GROUPING_MAX_MENTIONS must be at most {}",
                i64::MAX
            )));
        }
        for (name, value) in [
            ("GROUPING_STRONG_THRESHOLD", self.strong_threshold),
            ("GROUPING_WEAK_THRESHOLD", self.weak_threshold),
            ("STAKEHOLDER_MATCH_THRESHOLD", self.stakeholder_match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.weak_threshold > self.strong_threshold {
            return Err(Error::Config(format!(
                "GROUPING_WEAK_THRESHOLD ({}) exceeds GROUPING_STRONG_THRESHOLD ({})",
                self.weak_threshold, self.strong_threshold
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}
