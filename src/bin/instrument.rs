use std::time::Instant;

use tokentile::fixture::generate_corpus;
use tokentile::instrumentation::{counters_snapshot, reset_counters};
use tokentile::{GreedyTiler, HashedTiler, Tiler, TilingConfig, TokenStream};
use tracing_subscriber::EnvFilter;

fn run_case<T: Tiler>(name: &str, tiler: &T, corpus: &[TokenStream]) -> usize {
    reset_counters();
    let t0 = Instant::now();
    let indices: Vec<T::Index> = corpus.iter().map(|s| tiler.index(s)).collect();
    let mut matched = 0usize;
    for i in 0..corpus.len() {
        for j in (i + 1)..corpus.len() {
            let tiles = tiler.tile(
                tokentile::Sequence::new(&corpus[i]),
                tokentile::Sequence::new(&corpus[j]),
                &indices[j],
            );
            matched += tiles.iter().map(|m| m.length).sum::<usize>();
        }
    }
    let dur = t0.elapsed();
    let c = counters_snapshot();
    println!(
        "{name}: time={dur:?} windows={} index_ns={} lookups={} candidates={} \
         tokens={} ext_ns={} matched={matched}",
        c.windows_indexed,
        c.index_build_ns,
        c.lookups,
        c.candidates,
        c.tokens_compared,
        c.extension_ns
    );
    matched
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let corpus = generate_corpus(42, 16, 2000, 64);
    let cfg = TilingConfig { min_match_len: 9 };
    let naive = run_case("GreedyTiler", &GreedyTiler::with_config(&cfg), &corpus);
    let hashed = run_case("HashedTiler", &HashedTiler::with_config(&cfg), &corpus);
    if naive != hashed {
        tracing::warn!(naive, hashed, "tilers disagree on matched token count");
    }
}
