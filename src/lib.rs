//! Token-stream similarity detection.
//!
//! Submissions are tokenized by a front end ([`language`]), tiled pairwise
//! with Greedy String Tiling ([`greedy`], [`hashed`]), and scored
//! ([`comparison`]). [`Detector`] runs the whole pipeline; the pieces can also
//! be used on their own:
//!
//! ```
//! use tokentile::{HashedTiler, Tiler, TilingConfig, TokenStream};
//!
//! let a = TokenStream::from_kinds("a", [1, 2, 3, 4, 5]);
//! let b = TokenStream::from_kinds("b", [1, 2, 3, 6, 7]);
//! let tiler = HashedTiler::with_config(&TilingConfig { min_match_len: 3 });
//! let tiles = tiler.tile_streams(&a, &b);
//! assert_eq!(tiles.len(), 1);
//! assert_eq!(tiles[0].length, 3);
//! ```

pub mod comparison;
pub mod config;
pub mod core;
pub mod detector;
pub mod error;
pub mod fixture;
pub mod greedy;
pub mod hashed;
pub mod instrumentation;
pub mod language;
pub mod strategy;
pub mod submission;
pub mod token_stream;

pub use crate::comparison::{BaseCodeMatches, Comparison, Side};
pub use crate::config::{ComparisonMode, MatcherKind, RunOptions, SimilarityMetric};
pub use crate::core::{Match, Sequence, Tiler, TilingConfig, Token, TokenKind};
pub use crate::detector::Detector;
pub use crate::error::{RunError, SubmissionError, TokenStreamError, TokenizeError};
pub use crate::greedy::GreedyTiler;
pub use crate::hashed::{HashedTiler, WindowIndex};
pub use crate::language::{CharTokenizer, Language, TextTokenizer, Tokenizer};
pub use crate::strategy::{ComparisonResult, ComparisonStrategy};
pub use crate::submission::{ParseReport, Submission};
pub use crate::token_stream::TokenStream;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::generate_submissions;

    #[test]
    fn detector_on_fixture_finds_families() {
        let subs = generate_submissions(12345, 12, 300, 50);
        let mut detector = Detector::new(RunOptions::new().with_min_token_match(8));
        let mut result = detector.run(subs).unwrap();
        assert_eq!(result.number_of_submissions, 12);
        assert!(result.parse_report.is_clean());
        result.sort_by_similarity();

        // Mutated copies of one base share most of their tokens.
        let best = &result.comparisons[0];
        assert!(best.percent() > 50.0, "best pair only {}", best.percent());
        for c in &result.comparisons {
            for w in c.matches().windows(2) {
                assert!(!w[0].overlaps(&w[1]));
            }
            assert!(c.matches().iter().all(|m| m.length >= 8));
        }
    }
}
