//! Pairwise comparison of a submission set.
//!
//! Stages, each completed before the next starts:
//! 1. base code: every comparable submission is tiled against the base code
//!    (index built once over the base code); the resulting matches are kept
//!    per submission, by position, so equal names never share them;
//! 2. per-submission index build;
//! 3. all unordered pairs `i < j` in input order.
//!
//! Stages 1 to 3 fan out over a rayon pool in `ComparisonMode::Parallel`.
//! Results keep pair order in both modes, so a parallel run is identical to a
//! sequential one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::comparison::{BaseCodeMatches, Comparison, by_similarity};
use crate::config::{ComparisonMode, RunOptions};
use crate::core::{Sequence, Tiler};
use crate::submission::{ParseReport, Submission};
use crate::token_stream::TokenStream;

/// Outcome of one run: the comparisons above the threshold, in pair order.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub comparisons: Vec<Comparison>,
    pub duration: Duration,
    /// Submissions handed to the run, valid or not, excluding base code.
    pub number_of_submissions: usize,
    pub options: RunOptions,
    pub parse_report: ParseReport,
}

impl ComparisonResult {
    /// Order by descending `percent()`. Stable, so ties keep pair order.
    pub fn sort_by_similarity(&mut self) {
        self.comparisons.sort_by(by_similarity);
    }

    /// The first `n` comparisons in current order.
    pub fn top(&self, n: usize) -> &[Comparison] {
        &self.comparisons[..n.min(self.comparisons.len())]
    }

    /// Histogram of `percent()` in ten buckets of width 10; 100% lands in
    /// the last bucket.
    pub fn similarity_distribution(&self) -> [usize; 10] {
        let mut dist = [0usize; 10];
        for c in &self.comparisons {
            let bucket = ((c.percent() / 10.0) as usize).min(9);
            dist[bucket] += 1;
        }
        dist
    }
}

pub struct ComparisonStrategy<T: Tiler> {
    tiler: T,
    options: RunOptions,
}

impl<T: Tiler> ComparisonStrategy<T> {
    pub fn new(tiler: T, options: RunOptions) -> Self {
        Self { tiler, options }
    }

    pub fn tiler(&self) -> &T {
        &self.tiler
    }

    /// Compare every pair of comparable submissions. Submissions without a
    /// token stream, or shorter than the minimum match, are skipped silently.
    pub fn compare(
        &self,
        submissions: &[Arc<Submission>],
        base_code: Option<&Submission>,
    ) -> ComparisonResult {
        let span = tracing::info_span!("compare", submissions = submissions.len());
        let _enter = span.enter();
        let started = Instant::now();

        let min = self.tiler.config().min_match_len;
        let comparable: Vec<(&Arc<Submission>, &TokenStream)> = submissions
            .iter()
            .filter(|s| s.is_comparable(min))
            .filter_map(|s| Some((s, s.tokens()?)))
            .collect();

        let pool = match self.options.comparison_mode {
            ComparisonMode::Normal => None,
            ComparisonMode::Parallel => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(n) = self.options.workers {
                    builder = builder.num_threads(n);
                }
                match builder.build() {
                    Ok(pool) => Some(pool),
                    Err(err) => {
                        warn!(error = %err, "pool_fallback");
                        None
                    }
                }
            }
        };

        // Stage 1: base code, one entry per comparable submission.
        let basecode: Vec<Option<Arc<BaseCodeMatches>>> = match base_code {
            Some(bc) => self.compare_to_basecode(&comparable, bc, pool.as_ref()),
            None => vec![None; comparable.len()],
        };
        let masks: Vec<Option<Vec<bool>>> = comparable
            .iter()
            .zip(&basecode)
            .map(|((_, tokens), bc)| bc.as_ref().map(|m| m.covered_mask(tokens.size())))
            .collect();

        // Stage 2: indices.
        let build_index =
            |&(_, tokens): &(&Arc<Submission>, &TokenStream)| self.tiler.index(tokens);
        let indices: Vec<T::Index> = match &pool {
            Some(pool) => pool.install(|| comparable.par_iter().map(build_index).collect()),
            None => comparable.iter().map(build_index).collect(),
        };

        // Stage 3: pairs.
        let n = comparable.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        let run_pair = |&(i, j): &(usize, usize)| {
            let first = Sequence::with_excluded(comparable[i].1, masks[i].as_deref());
            let second = Sequence::with_excluded(comparable[j].1, masks[j].as_deref());
            let (a, b) = (comparable[i].0, comparable[j].0);
            let mut comparison = self.compare_pair(a, b, first, second, &indices[j]);
            comparison.set_basecode_matches(basecode[i].clone(), basecode[j].clone());
            self.keep_if_similar(comparison)
        };
        let comparisons: Vec<Comparison> = match &pool {
            Some(pool) => pool.install(|| pairs.par_iter().filter_map(run_pair).collect()),
            None => pairs.iter().filter_map(run_pair).collect(),
        };

        let duration = started.elapsed();
        info!(
            pairs = pairs.len(),
            kept = comparisons.len(),
            duration_ms = duration.as_millis() as u64,
            "comparison_done"
        );

        ComparisonResult {
            comparisons,
            duration,
            number_of_submissions: submissions.len(),
            options: self.options.clone(),
            parse_report: ParseReport::default(),
        }
    }

    fn compare_to_basecode(
        &self,
        comparable: &[(&Arc<Submission>, &TokenStream)],
        base_code: &Submission,
        pool: Option<&rayon::ThreadPool>,
    ) -> Vec<Option<Arc<BaseCodeMatches>>> {
        let Some(bc_tokens) = base_code.tokens() else {
            return vec![None; comparable.len()];
        };
        let bc_index = self.tiler.index(bc_tokens);
        let tile_one = |&(s, tokens): &(&Arc<Submission>, &TokenStream)| {
            let tiles = self
                .tiler
                .tile(Sequence::new(tokens), Sequence::new(bc_tokens), &bc_index);
            let matches = BaseCodeMatches::new(s.name(), tiles);
            info!(
                submission = s.name(),
                matched_tokens = matches.number_of_matched_tokens(),
                "basecode_compared"
            );
            Some(Arc::new(matches))
        };
        match pool {
            Some(pool) => pool.install(|| comparable.par_iter().map(tile_one).collect()),
            None => comparable.iter().map(tile_one).collect(),
        }
    }

    fn compare_pair(
        &self,
        first: &Arc<Submission>,
        second: &Arc<Submission>,
        a: Sequence<'_>,
        b: Sequence<'_>,
        b_index: &T::Index,
    ) -> Comparison {
        let mut comparison = Comparison::new(first.clone(), second.clone());
        for m in self.tiler.tile(a, b, b_index) {
            comparison.add_match(m.start_a, m.start_b, m.length);
        }
        comparison
    }

    fn keep_if_similar(&self, comparison: Comparison) -> Option<Comparison> {
        let similarity = comparison.similarity(self.options.similarity_metric);
        debug!(
            first = comparison.first().name(),
            second = comparison.second().name(),
            similarity,
            matched_tokens = comparison.number_of_matched_tokens(),
            "comparison"
        );
        (similarity > self.options.similarity_threshold).then_some(comparison)
    }
}
