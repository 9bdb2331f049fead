//! Result of comparing two submissions, and the similarity numbers derived
//! from it.
//!
//! All percentages are `f32` in `[0, 100]` for well-formed inputs. The
//! `rounded_*` variants truncate to one decimal place (88.19 → 88.1), never
//! round to nearest, so reports stay reproducible.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::config::SimilarityMetric;
use crate::core::Match;
use crate::submission::Submission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Tiles of one submission (side A) against the base code (side B).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseCodeMatches {
    submission: String,
    matches: Vec<Match>,
    matched_tokens: usize,
}

impl BaseCodeMatches {
    pub fn new(submission: impl Into<String>, matches: Vec<Match>) -> BaseCodeMatches {
        let matched_tokens = matches.iter().map(|m| m.length).sum();
        BaseCodeMatches {
            submission: submission.into(),
            matches,
            matched_tokens,
        }
    }

    pub fn submission(&self) -> &str {
        &self.submission
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn number_of_matched_tokens(&self) -> usize {
        self.matched_tokens
    }

    /// Per-position flags for a submission of `len` tokens: true where the
    /// token is explained by base code.
    pub fn covered_mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for m in &self.matches {
            assert!(
                m.end_a() <= len,
                "base code match {m} exceeds submission of {len} tokens"
            );
            mask[m.start_a..m.end_a()].fill(true);
        }
        mask
    }
}

/// Truncate toward zero to one decimal place.
#[inline]
pub fn truncate_one_decimal(value: f32) -> f32 {
    ((value * 10.0) as i32) as f32 / 10.0
}

#[derive(Debug, Clone)]
pub struct Comparison {
    first: Arc<Submission>,
    second: Arc<Submission>,
    matches: Vec<Match>,
    basecode_first: Option<Arc<BaseCodeMatches>>,
    basecode_second: Option<Arc<BaseCodeMatches>>,
}

impl Comparison {
    pub fn new(first: Arc<Submission>, second: Arc<Submission>) -> Comparison {
        Comparison {
            first,
            second,
            matches: Vec::new(),
            basecode_first: None,
            basecode_second: None,
        }
    }

    /// Add a tile unless it overlaps one already present.
    ///
    /// # Panics
    /// If the tile reaches past the end of either token stream.
    pub fn add_match(&mut self, start_a: usize, start_b: usize, length: usize) {
        let candidate = Match::new(start_a, start_b, length);
        assert!(
            candidate.end_a() <= self.first.number_of_tokens()
                && candidate.end_b() <= self.second.number_of_tokens(),
            "match {candidate} out of bounds for {} ({} tokens) / {} ({} tokens)",
            self.first.name(),
            self.first.number_of_tokens(),
            self.second.name(),
            self.second.number_of_tokens()
        );
        if self.matches.iter().any(|m| m.overlaps(&candidate)) {
            return;
        }
        self.matches.push(candidate);
    }

    pub fn set_basecode_matches(
        &mut self,
        first: Option<Arc<BaseCodeMatches>>,
        second: Option<Arc<BaseCodeMatches>>,
    ) {
        self.basecode_first = first;
        self.basecode_second = second;
    }

    pub fn first(&self) -> &Arc<Submission> {
        &self.first
    }

    pub fn second(&self) -> &Arc<Submission> {
        &self.second
    }

    pub fn submission(&self, side: Side) -> &Submission {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    /// Tiles in discovery order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn basecode_matches(&self, side: Side) -> Option<&BaseCodeMatches> {
        match side {
            Side::First => self.basecode_first.as_deref(),
            Side::Second => self.basecode_second.as_deref(),
        }
    }

    pub fn number_of_matched_tokens(&self) -> usize {
        self.matches.iter().map(|m| m.length).sum()
    }

    pub fn biggest_match(&self) -> usize {
        self.matches.iter().map(|m| m.length).max().unwrap_or(0)
    }

    /// Token count minus one boundary token per file minus base-code-explained
    /// tokens (when base code was compared for this side).
    pub fn effective_size(&self, side: Side) -> i64 {
        let sub = self.submission(side);
        let bc = self
            .basecode_matches(side)
            .map_or(0, |b| b.number_of_matched_tokens());
        sub.number_of_tokens() as i64 - sub.file_count() as i64 - bc as i64
    }

    fn one_sided(&self, side: Side) -> f32 {
        let divisor = self.effective_size(side);
        if divisor <= 0 {
            return 0.0;
        }
        self.number_of_matched_tokens() as f32 * 100.0 / divisor as f32
    }

    /// Symmetric similarity: matched tokens over the mean effective size.
    pub fn percent(&self) -> f32 {
        let total = self.effective_size(Side::First) + self.effective_size(Side::Second);
        if total <= 0 {
            return 0.0;
        }
        200.0 * self.number_of_matched_tokens() as f32 / total as f32
    }

    pub fn percent_a(&self) -> f32 {
        self.one_sided(Side::First)
    }

    pub fn percent_b(&self) -> f32 {
        self.one_sided(Side::Second)
    }

    pub fn percent_max(&self) -> f32 {
        self.percent_a().max(self.percent_b())
    }

    pub fn percent_min(&self) -> f32 {
        self.percent_a().min(self.percent_b())
    }

    pub fn rounded_percent(&self) -> f32 {
        truncate_one_decimal(self.percent())
    }

    pub fn rounded_percent_a(&self) -> f32 {
        truncate_one_decimal(self.percent_a())
    }

    pub fn rounded_percent_b(&self) -> f32 {
        truncate_one_decimal(self.percent_b())
    }

    pub fn rounded_percent_max(&self) -> f32 {
        truncate_one_decimal(self.percent_max())
    }

    pub fn rounded_percent_min(&self) -> f32 {
        truncate_one_decimal(self.percent_min())
    }

    /// Share of one side explained by base code, `None` if no base code was
    /// compared for it.
    pub fn percent_basecode(&self, side: Side) -> Option<f32> {
        let bc = self.basecode_matches(side)?;
        let sub = self.submission(side);
        let size = sub.number_of_tokens() as i64 - sub.file_count() as i64;
        if size <= 0 {
            return Some(0.0);
        }
        Some(bc.number_of_matched_tokens() as f32 * 100.0 / size as f32)
    }

    pub fn rounded_percent_basecode(&self, side: Side) -> Option<f32> {
        self.percent_basecode(side).map(truncate_one_decimal)
    }

    pub fn similarity(&self, metric: SimilarityMetric) -> f32 {
        match metric {
            SimilarityMetric::Avg => self.percent(),
            SimilarityMetric::Min => self.percent_min(),
            SimilarityMetric::Max => self.percent_max(),
        }
    }

    /// Sorted identifiers of every file with at least one matched token on
    /// `side`.
    pub fn files(&self, side: Side) -> Vec<String> {
        let Some(tokens) = self.submission(side).tokens() else {
            return Vec::new();
        };
        let mut files: BTreeSet<&str> = BTreeSet::new();
        for m in &self.matches {
            let start = match side {
                Side::First => m.start_a,
                Side::Second => m.start_b,
            };
            for token in &tokens.as_slice()[start..start + m.length] {
                files.insert(&token.file);
            }
        }
        files.into_iter().map(str::to_string).collect()
    }

    /// Indices into `matches()` ordered by start position on `side`. Stable
    /// for equal starts.
    pub fn sort_permutation(&self, side: Side) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.matches.len()).collect();
        perm.sort_by_key(|&i| match side {
            Side::First => self.matches[i].start_a,
            Side::Second => self.matches[i].start_b,
        });
        perm
    }

    /// Red intensity proportional to `length` relative to the biggest tile,
    /// as `#rr0000`.
    pub fn color(&self, length: usize) -> String {
        let biggest = self.biggest_match();
        if biggest == 0 {
            return "#000000".to_string();
        }
        let red = (255 * length.min(biggest) / biggest) as u8;
        format!("#{red:02x}0000")
    }
}

/// Descending by `percent()`; equal percentages compare equal.
pub fn by_similarity(a: &Comparison, b: &Comparison) -> Ordering {
    b.percent().partial_cmp(&a.percent()).unwrap_or(Ordering::Equal)
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.first.name(), self.second.name())
    }
}
