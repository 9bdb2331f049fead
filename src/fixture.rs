use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::TokenKind;
use crate::submission::Submission;
use crate::token_stream::TokenStream;

fn random_kinds(rng: &mut impl Rng, len: usize, vocab: u32) -> Vec<u32> {
    (0..len).map(|_| rng.gen_range(0..vocab)).collect()
}

/// Copy `base` with a few random edits: replaced tokens, dropped chunks and
/// inserted fresh chunks, so related submissions share long but broken runs.
fn mutate(rng: &mut impl Rng, base: &[u32], vocab: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(base.len() + base.len() / 8);
    let mut i = 0;
    while i < base.len() {
        match rng.gen_range(0..100) {
            0 => {
                // drop a chunk
                i += rng.gen_range(1..8);
            }
            1 => {
                let n = rng.gen_range(1..8);
                out.extend(random_kinds(rng, n, vocab));
            }
            2 => {
                out.push(rng.gen_range(0..vocab));
                i += 1;
            }
            _ => {
                out.push(base[i]);
                i += 1;
            }
        }
    }
    out
}

/// Deterministic corpus of `n` single-file token streams of roughly `len`
/// tokens over `vocab` kinds. Streams come in families derived from a few
/// base streams, so pairs range from unrelated to near-identical.
pub fn generate_corpus(seed: u64, n: usize, len: usize, vocab: u32) -> Vec<TokenStream> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vocab = vocab.max(2);
    let families = (n / 4).max(1);
    let bases: Vec<Vec<u32>> = (0..families)
        .map(|_| random_kinds(&mut rng, len, vocab))
        .collect();

    (0..n)
        .map(|i| {
            let base = &bases[rng.gen_range(0..bases.len())];
            let mut kinds = mutate(&mut rng, base, vocab);
            kinds.push(TokenKind::FILE_END.0);
            TokenStream::from_kinds(&format!("s{i:03}.txt"), kinds)
        })
        .collect()
}

/// `generate_corpus` wrapped as pre-tokenized submissions named `s000`, `s001`, ...
pub fn generate_submissions(seed: u64, n: usize, len: usize, vocab: u32) -> Vec<Submission> {
    generate_corpus(seed, n, len, vocab)
        .into_iter()
        .enumerate()
        .map(|(i, tokens)| {
            Submission::from_tokens(format!("s{i:03}"), tokens)
                .with_files(vec![format!("s{i:03}.txt").into()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_corpus() {
        let a = generate_corpus(7, 6, 200, 40);
        let b = generate_corpus(7, 6, 200, 40);
        assert_eq!(a, b);
        assert_ne!(a, generate_corpus(8, 6, 200, 40));
    }

    #[test]
    fn every_stream_ends_with_file_end() {
        for s in generate_corpus(1, 5, 50, 10) {
            assert_eq!(s.file_end_count(), 1);
            assert_eq!(s[s.size() - 1].kind, TokenKind::FILE_END);
        }
    }
}
