//! Run configuration.
//!
//! `RunOptions` is plain data: it can be built in code with the `with_*`
//! builders or deserialized from any serde format, and is checked once by
//! [`RunOptions::validate`] before a run starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::TilingConfig;
use crate::language::Language;

/// Which similarity value is compared against the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Symmetric similarity over both submissions (`Comparison::percent`).
    #[default]
    Avg,
    /// The smaller of the two one-sided similarities.
    Min,
    /// The larger of the two one-sided similarities.
    Max,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// All pairs on the calling thread.
    #[default]
    Normal,
    /// Pairs distributed over a rayon worker pool.
    Parallel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Exhaustive scan; reference implementation.
    Naive,
    /// Window-hash indexed search.
    #[default]
    Hashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Minimum tile length. `None` uses the language default.
    pub min_token_match: Option<usize>,
    /// Percentage; comparisons at or below it are dropped.
    pub similarity_threshold: f32,
    pub similarity_metric: SimilarityMetric,
    /// Name of the submission holding the shared base code, if any.
    pub base_code: Option<String>,
    pub comparison_mode: ComparisonMode,
    pub matcher: MatcherKind,
    pub language: Language,
    /// Worker threads for `ComparisonMode::Parallel`; `None` lets rayon decide.
    pub workers: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            min_token_match: None,
            similarity_threshold: 0.0,
            similarity_metric: SimilarityMetric::Avg,
            base_code: None,
            comparison_mode: ComparisonMode::Normal,
            matcher: MatcherKind::Hashed,
            language: Language::Text,
            workers: None,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_token_match(mut self, min: usize) -> Self {
        self.min_token_match = Some(min);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_similarity_metric(mut self, metric: SimilarityMetric) -> Self {
        self.similarity_metric = metric;
        self
    }

    pub fn with_base_code(mut self, name: impl Into<String>) -> Self {
        self.base_code = Some(name.into());
        self
    }

    pub fn with_comparison_mode(mut self, mode: ComparisonMode) -> Self {
        self.comparison_mode = mode;
        self
    }

    pub fn with_matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Minimum tile length after applying the language default.
    pub fn min_token_match(&self) -> usize {
        self.min_token_match
            .unwrap_or_else(|| self.language.default_min_token_match())
    }

    pub fn tiling_config(&self) -> TilingConfig {
        TilingConfig {
            min_match_len: self.min_token_match(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_token_match() < 1 {
            return Err(ConfigError::InvalidMinTokenMatch {
                min: self.min_token_match(),
            });
        }
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.similarity_threshold,
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }
        if let Some(name) = &self.base_code {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyBaseCodeName);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid config: min_token_match must be >= 1 (got {min})")]
    InvalidMinTokenMatch { min: usize },

    #[error("invalid config: similarity_threshold must be within [0, 100] (got {threshold})")]
    InvalidThreshold { threshold: f32 },

    #[error("invalid config: workers must be >= 1")]
    InvalidWorkers,

    #[error("invalid config: base code submission name is empty")]
    EmptyBaseCodeName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RunOptions::default();
        assert_eq!(opts.min_token_match, None);
        assert_eq!(opts.similarity_threshold, 0.0);
        assert_eq!(opts.similarity_metric, SimilarityMetric::Avg);
        assert_eq!(opts.comparison_mode, ComparisonMode::Normal);
        assert_eq!(opts.matcher, MatcherKind::Hashed);
        assert_eq!(opts.language, Language::Text);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn min_token_match_falls_back_to_language() {
        let opts = RunOptions::new().with_language(Language::Char);
        assert_eq!(
            opts.min_token_match(),
            Language::Char.default_min_token_match()
        );
        assert_eq!(opts.with_min_token_match(3).min_token_match(), 3);
    }

    #[test]
    fn builder_chain() {
        let opts = RunOptions::new()
            .with_min_token_match(7)
            .with_similarity_threshold(25.0)
            .with_similarity_metric(SimilarityMetric::Max)
            .with_base_code("template")
            .with_comparison_mode(ComparisonMode::Parallel)
            .with_matcher(MatcherKind::Naive)
            .with_workers(4);
        assert_eq!(opts.tiling_config().min_match_len, 7);
        assert_eq!(opts.similarity_threshold, 25.0);
        assert_eq!(opts.similarity_metric, SimilarityMetric::Max);
        assert_eq!(opts.base_code.as_deref(), Some("template"));
        assert_eq!(opts.comparison_mode, ComparisonMode::Parallel);
        assert_eq!(opts.matcher, MatcherKind::Naive);
        assert_eq!(opts.workers, Some(4));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            RunOptions::new().with_min_token_match(0).validate(),
            Err(ConfigError::InvalidMinTokenMatch { min: 0 })
        );
        assert!(matches!(
            RunOptions::new().with_similarity_threshold(101.0).validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            RunOptions::new().with_similarity_threshold(-1.0).validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
        assert_eq!(
            RunOptions::new().with_workers(0).validate(),
            Err(ConfigError::InvalidWorkers)
        );
        assert_eq!(
            RunOptions::new().with_base_code(" ").validate(),
            Err(ConfigError::EmptyBaseCodeName)
        );
    }

    #[test]
    fn serde_roundtrip() {
        let opts = RunOptions::new()
            .with_min_token_match(5)
            .with_similarity_metric(SimilarityMetric::Min)
            .with_comparison_mode(ComparisonMode::Parallel);
        let json = serde_json::to_string(&opts).unwrap();
        let back: RunOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let opts: RunOptions =
            serde_json::from_str(r#"{"similarity_threshold": 40.0, "matcher": "naive"}"#).unwrap();
        assert_eq!(opts.similarity_threshold, 40.0);
        assert_eq!(opts.matcher, MatcherKind::Naive);
        assert_eq!(opts.comparison_mode, ComparisonMode::Normal);
    }
}
