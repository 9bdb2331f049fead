use crate::core::{Match, Sequence, Tiler, TilingConfig, commit_round, run_length};
use crate::token_stream::TokenStream;

/// Greedy string tiling by exhaustive scan of every (A, B) start pair.
///
/// O(|A|·|B|·L) per round. Kept as the reference the hashed tiler is checked
/// against, and as a fallback for tiny inputs.
#[derive(Debug, Clone, Default)]
pub struct GreedyTiler {
    pub config: TilingConfig,
}

impl GreedyTiler {
    pub fn with_config(config: &TilingConfig) -> GreedyTiler {
        GreedyTiler {
            config: config.clone(),
        }
    }
}

impl Tiler for GreedyTiler {
    type Index = ();

    fn config(&self) -> &TilingConfig {
        &self.config
    }

    fn index(&self, _stream: &TokenStream) {}

    fn tile(&self, a: Sequence<'_>, b: Sequence<'_>, _b_index: &()) -> Vec<Match> {
        let mml = self.config.min_match_len.max(1);
        let len_a = a.tokens.size();
        let len_b = b.tokens.size();
        let mut tiles = Vec::new();
        if len_a < mml || len_b < mml {
            return tiles;
        }

        let mut marks_a = a.initial_marks();
        let mut marks_b = b.initial_marks();

        loop {
            let mut max_match = mml;
            let mut candidates: Vec<Match> = Vec::new();

            for x in 0..len_a {
                if marks_a[x] || len_a - x < max_match {
                    continue;
                }
                for y in 0..len_b {
                    if marks_b[y] || len_b - y < max_match {
                        continue;
                    }
                    if a.tokens[x].kind != b.tokens[y].kind {
                        continue;
                    }
                    let t0 = std::time::Instant::now();
                    let j = run_length(a.tokens, b.tokens, &marks_a, &marks_b, x, y);
                    crate::instrumentation::add_tokens_compared(j as u64);
                    crate::instrumentation::add_extension_ns(t0.elapsed().as_nanos() as u64);
                    crate::instrumentation::add_candidates(1);

                    if j > max_match {
                        candidates.clear();
                        max_match = j;
                    }
                    if j == max_match {
                        candidates.push(Match::new(x, y, j));
                    }
                }
            }

            if candidates.is_empty() {
                break;
            }
            commit_round(&candidates, &mut marks_a, &mut marks_b, &mut tiles);
        }

        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiler(mml: usize) -> GreedyTiler {
        GreedyTiler::with_config(&TilingConfig { min_match_len: mml })
    }

    #[test]
    fn prefix_shared_with_tail_divergence() {
        let a = TokenStream::from_kinds("a", [1, 2, 3, 4, 5]);
        let b = TokenStream::from_kinds("b", [1, 2, 3, 6, 7]);
        assert_eq!(tiler(3).tile_streams(&a, &b), vec![Match::new(0, 0, 3)]);
        assert!(tiler(4).tile_streams(&a, &b).is_empty());
    }

    #[test]
    fn ties_resolve_to_earliest_a() {
        let a = TokenStream::from_kinds("a", [1, 2, 1, 2]);
        let b = TokenStream::from_kinds("b", [1, 2]);
        assert_eq!(tiler(2).tile_streams(&a, &b), vec![Match::new(0, 0, 2)]);
    }

    #[test]
    fn shorter_than_min_match_returns_nothing() {
        let a = TokenStream::from_kinds("a", [1, 2]);
        let b = TokenStream::from_kinds("b", [1, 2]);
        assert!(tiler(3).tile_streams(&a, &b).is_empty());
    }
}
