use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::token_stream::TokenStream;

/// Front-end defined token type. Two tokens match iff their kinds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenKind(pub u32);

impl TokenKind {
    /// Emitted once at the end of every file.
    pub const FILE_END: TokenKind = TokenKind(u32::MAX);
    /// Boundary marker a front end may emit between independent units.
    pub const SEPARATOR: TokenKind = TokenKind(u32::MAX - 1);

    /// Reserved kinds never take part in a tile.
    #[inline]
    pub fn is_reserved(self) -> bool {
        self == Self::FILE_END || self == Self::SEPARATOR
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier of the source file this token was read from.
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl Token {
    pub fn new(kind: TokenKind, file: Arc<str>, line: u32, column: u32, length: u32) -> Token {
        Token {
            kind,
            file,
            line,
            column,
            length,
        }
    }

    /// End-of-file marker for `file`, placed on `line`.
    pub fn file_end(file: Arc<str>, line: u32) -> Token {
        Token::new(TokenKind::FILE_END, file, line, 0, 0)
    }
}

/// One tile: `length` tokens of sequence A starting at `start_a` that are
/// kind-identical to `length` tokens of sequence B starting at `start_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub start_a: usize,
    pub start_b: usize,
    pub length: usize,
}

impl Match {
    pub fn new(start_a: usize, start_b: usize, length: usize) -> Match {
        Match {
            start_a,
            start_b,
            length,
        }
    }

    #[inline]
    pub fn end_a(&self) -> usize {
        self.start_a + self.length
    }

    #[inline]
    pub fn end_b(&self) -> usize {
        self.start_b + self.length
    }

    /// True if the two tiles share a token position in A or in B.
    pub fn overlaps(&self, other: &Match) -> bool {
        fn intersects(s1: usize, l1: usize, s2: usize, l2: usize) -> bool {
            s1 < s2 + l2 && s2 < s1 + l1
        }
        intersects(self.start_a, self.length, other.start_a, other.length)
            || intersects(self.start_b, self.length, other.start_b, other.length)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A[{}..{}) ~ B[{}..{})",
            self.start_a,
            self.end_a(),
            self.start_b,
            self.end_b()
        )
    }
}

/// Configuration shared by the tiling implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Tiles shorter than this are never reported.
    pub min_match_len: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        TilingConfig { min_match_len: 9 }
    }
}

/// A token stream as seen by the tiler, optionally with positions that are
/// already explained by base code and must stay out of every tile.
#[derive(Debug, Clone, Copy)]
pub struct Sequence<'a> {
    pub tokens: &'a TokenStream,
    pub excluded: Option<&'a [bool]>,
}

impl<'a> Sequence<'a> {
    pub fn new(tokens: &'a TokenStream) -> Sequence<'a> {
        Sequence {
            tokens,
            excluded: None,
        }
    }

    pub fn with_excluded(tokens: &'a TokenStream, excluded: Option<&'a [bool]>) -> Sequence<'a> {
        if let Some(mask) = excluded {
            assert_eq!(
                mask.len(),
                tokens.size(),
                "exclusion mask length does not match token stream"
            );
        }
        Sequence { tokens, excluded }
    }

    /// Initial coverage markers: reserved kinds and excluded positions.
    pub(crate) fn initial_marks(&self) -> Vec<bool> {
        let mut marks: Vec<bool> = self
            .tokens
            .iter()
            .map(|t| t.kind.is_reserved())
            .collect();
        if let Some(mask) = self.excluded {
            for (mark, &ex) in marks.iter_mut().zip(mask) {
                *mark |= ex;
            }
        }
        marks
    }
}

/// Trait describing a greedy string tiling implementation.
pub trait Tiler: Sync {
    /// Per-stream acceleration structure, built once and reused across pairs.
    type Index: Send + Sync;

    fn config(&self) -> &TilingConfig;

    /// Precompute whatever `tile` needs about the B side.
    fn index(&self, stream: &TokenStream) -> Self::Index;

    /// Compute the greedy tiling of `a` against `b`. `b_index` must have been
    /// built from `b.tokens` by this tiler.
    fn tile(&self, a: Sequence<'_>, b: Sequence<'_>, b_index: &Self::Index) -> Vec<Match>;

    /// Convenience for one-off comparisons without base-code exclusion.
    fn tile_streams(&self, a: &TokenStream, b: &TokenStream) -> Vec<Match>
    where
        Self: Sized,
    {
        let index = self.index(b);
        self.tile(Sequence::new(a), Sequence::new(b), &index)
    }
}

/// Length of the run starting at (`x`, `y`) over unmarked, kind-equal tokens.
#[inline]
pub(crate) fn run_length(
    a: &TokenStream,
    b: &TokenStream,
    marks_a: &[bool],
    marks_b: &[bool],
    x: usize,
    y: usize,
) -> usize {
    let a_tokens = a.as_slice();
    let b_tokens = b.as_slice();
    let mut len = 0usize;
    while x + len < a_tokens.len()
        && y + len < b_tokens.len()
        && !marks_a[x + len]
        && !marks_b[y + len]
        && a_tokens[x + len].kind == b_tokens[y + len].kind
    {
        len += 1;
    }
    len
}

/// Apply one round of maximal candidates in discovery order: mark each
/// non-overlapping candidate on both sides and append it to `tiles`.
pub(crate) fn commit_round(
    candidates: &[Match],
    marks_a: &mut [bool],
    marks_b: &mut [bool],
    tiles: &mut Vec<Match>,
) {
    for cand in candidates {
        let covered = marks_a[cand.start_a..cand.end_a()].iter().any(|&m| m)
            || marks_b[cand.start_b..cand.end_b()].iter().any(|&m| m);
        if covered || tiles.iter().any(|t| t.overlaps(cand)) {
            continue;
        }
        marks_a[cand.start_a..cand.end_a()].fill(true);
        marks_b[cand.start_b..cand.end_b()].fill(true);
        tiles.push(*cand);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_on_either_axis() {
        let m = Match::new(0, 10, 5);
        assert!(m.overlaps(&Match::new(4, 100, 3)));
        assert!(m.overlaps(&Match::new(100, 14, 1)));
        assert!(!m.overlaps(&Match::new(5, 15, 5)));
        // Marked tokens are never re-tiled on their own side; cross-axis reuse is legal.
        assert!(!m.overlaps(&Match::new(10, 0, 5)));
    }

    #[test]
    fn adjacent_tiles_do_not_overlap() {
        let m = Match::new(3, 3, 3);
        assert!(!m.overlaps(&Match::new(0, 0, 3)));
        assert!(!m.overlaps(&Match::new(6, 6, 1)));
    }

    #[test]
    fn reserved_kinds() {
        assert!(TokenKind::FILE_END.is_reserved());
        assert!(TokenKind::SEPARATOR.is_reserved());
        assert!(!TokenKind(0).is_reserved());
    }
}
