// HashedTiler: explanatory notes
//
// Greedy string tiling spends nearly all of its time looking for the longest
// uncovered run between A and B. The naive tiler tries every (x, y) start
// pair. This implementation indexes B instead:
//
// 1. Precompute polynomial prefix hashes over the token kinds of a stream so
//    the hash of any window kinds[l..r) is h[r] - h[l]*p[r-l] (wrapping u64).
//
// 2. Build a `WindowIndex` for B mapping the hash of every window of length
//    `min_match_len` to the ascending list of window start positions. The
//    index depends only on the stream and the window length, so callers build
//    it once per stream and reuse it for every pair (and, for base code, for
//    every submission).
//
// 3. Each round scans A in ascending order, hashes the window at x and only
//    inspects the B starts in that bucket. Any run of length >= min_match_len
//    at (x, y) has identical windows on both sides, hence identical hashes, so
//    no candidate is lost.
//
// Notes:
// - Wrapping u64 arithmetic allows collisions. Every bucket hit is verified
//   token by token (the run is recomputed from the kinds), so a collision only
//   costs time, never changes a tile.
// - Buckets keep starts in ascending order and A is scanned ascending, so the
//   candidate list of a round is ordered by (start_a, start_b) exactly as in
//   the naive tiler; both produce identical tilings.
// - Buckets are `SmallVec`s: most windows occur only a handful of times.
//
use ahash::AHashMap as HashMap;
use smallvec::SmallVec;

use crate::core::{Match, Sequence, Tiler, TilingConfig, commit_round, run_length};
use crate::token_stream::TokenStream;

const BASE: u64 = 1_000_003;

type Bucket = SmallVec<[usize; 4]>;

/// Hash index over all fixed-length windows of one token stream.
#[derive(Debug, Clone)]
pub struct WindowIndex {
    window: usize,
    len: usize,
    buckets: HashMap<u64, Bucket>,
}

impl WindowIndex {
    pub fn build(stream: &TokenStream, window: usize) -> WindowIndex {
        let t0 = std::time::Instant::now();
        let window = window.max(1);
        let len = stream.size();
        let (h, p) = prefix_hashes(stream);
        let n_windows = if len >= window { len - window + 1 } else { 0 };
        let mut buckets: HashMap<u64, Bucket> = HashMap::with_capacity((n_windows / 2).max(16));
        for start in 0..n_windows {
            let key = range_hash(&h, &p, start, start + window);
            buckets.entry(key).or_default().push(start);
        }
        crate::instrumentation::add_windows_indexed(n_windows as u64);
        crate::instrumentation::add_index_build_ns(t0.elapsed().as_nanos() as u64);
        WindowIndex {
            window,
            len,
            buckets,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of distinct window hashes.
    pub fn distinct_windows(&self) -> usize {
        self.buckets.len()
    }

    /// Window start positions whose hash equals `hash`, ascending.
    pub fn starts(&self, hash: u64) -> &[usize] {
        self.buckets.get(&hash).map(|b| b.as_slice()).unwrap_or(&[])
    }
}

// Prefix hashes and powers over token kinds. Kinds are offset by one so that a
// kind of zero still contributes to the hash.
fn prefix_hashes(stream: &TokenStream) -> (Vec<u64>, Vec<u64>) {
    let mut h = Vec::with_capacity(stream.size() + 1);
    let mut p = Vec::with_capacity(stream.size() + 1);
    let mut last_h = 0u64;
    let mut last_p = 1u64;
    h.push(last_h);
    p.push(last_p);
    for kind in stream.kinds() {
        last_h = last_h.wrapping_mul(BASE).wrapping_add(kind.0 as u64 + 1);
        last_p = last_p.wrapping_mul(BASE);
        h.push(last_h);
        p.push(last_p);
    }
    (h, p)
}

// Hash of kinds[l..r) (r exclusive).
#[inline]
fn range_hash(h: &[u64], p: &[u64], l: usize, r: usize) -> u64 {
    h[r].wrapping_sub(h[l].wrapping_mul(p[r - l]))
}

/// Greedy string tiling accelerated by a window-hash index over B.
#[derive(Debug, Clone, Default)]
pub struct HashedTiler {
    pub config: TilingConfig,
}

impl HashedTiler {
    pub fn with_config(config: &TilingConfig) -> HashedTiler {
        HashedTiler {
            config: config.clone(),
        }
    }
}

impl Tiler for HashedTiler {
    type Index = WindowIndex;

    fn config(&self) -> &TilingConfig {
        &self.config
    }

    fn index(&self, stream: &TokenStream) -> WindowIndex {
        WindowIndex::build(stream, self.config.min_match_len)
    }

    fn tile(&self, a: Sequence<'_>, b: Sequence<'_>, b_index: &WindowIndex) -> Vec<Match> {
        let mml = self.config.min_match_len.max(1);
        assert_eq!(b_index.window, mml, "window index built for a different min match length");
        assert_eq!(b_index.len, b.tokens.size(), "window index built for a different stream");

        let len_a = a.tokens.size();
        let len_b = b.tokens.size();
        let mut tiles = Vec::new();
        if len_a < mml || len_b < mml {
            return tiles;
        }

        let (h_a, p_a) = prefix_hashes(a.tokens);
        let mut marks_a = a.initial_marks();
        let mut marks_b = b.initial_marks();

        loop {
            let mut max_match = mml;
            let mut candidates: Vec<Match> = Vec::new();

            for x in 0..=(len_a - mml) {
                if marks_a[x] || len_a - x < max_match {
                    continue;
                }
                let key = range_hash(&h_a, &p_a, x, x + mml);
                crate::instrumentation::add_lookup(1);
                for &y in b_index.starts(key) {
                    if marks_b[y] || len_b - y < max_match {
                        continue;
                    }
                    crate::instrumentation::add_candidates(1);
                    let t0 = std::time::Instant::now();
                    let j = run_length(a.tokens, b.tokens, &marks_a, &marks_b, x, y);
                    crate::instrumentation::add_tokens_compared(j as u64);
                    crate::instrumentation::add_extension_ns(t0.elapsed().as_nanos() as u64);

                    // Collisions and partially covered windows fall short here.
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

    #[test]
    fn index_groups_equal_windows() {
        let s = TokenStream::from_kinds("s", [1, 2, 3, 1, 2, 3, 9]);
        let idx = WindowIndex::build(&s, 3);
        let (h, p) = prefix_hashes(&s);
        let key = range_hash(&h, &p, 0, 3);
        assert_eq!(idx.starts(key), &[0, 3]);
        // windows: 123, 231, 312, 123, 239
        assert_eq!(idx.distinct_windows(), 4);
    }

    #[test]
    fn index_of_short_stream_is_empty() {
        let s = TokenStream::from_kinds("s", [1, 2]);
        let idx = WindowIndex::build(&s, 3);
        assert_eq!(idx.distinct_windows(), 0);
    }

    #[test]
    fn zero_kind_changes_hash() {
        let a = TokenStream::from_kinds("a", [0, 0, 5]);
        let b = TokenStream::from_kinds("b", [0, 5]);
        let (ha, pa) = prefix_hashes(&a);
        let (hb, pb) = prefix_hashes(&b);
        assert_ne!(range_hash(&ha, &pa, 0, 3), range_hash(&hb, &pb, 0, 2));
    }

    #[test]
    fn matches_naive_on_repetitive_input() {
        use crate::greedy::GreedyTiler;
        let cfg = TilingConfig { min_match_len: 2 };
        let a = TokenStream::from_kinds("a", [1, 2, 1, 2, 1, 2, 3, 1, 2]);
        let b = TokenStream::from_kinds("b", [2, 1, 2, 3, 1, 2, 1, 2]);
        let hashed = HashedTiler::with_config(&cfg).tile_streams(&a, &b);
        let naive = GreedyTiler::with_config(&cfg).tile_streams(&a, &b);
        assert_eq!(hashed, naive);
        assert!(!hashed.is_empty());
    }
}
