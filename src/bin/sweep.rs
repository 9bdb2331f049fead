use std::time::Instant;

use tokentile::fixture::generate_submissions;
use tokentile::{ComparisonMode, Detector, RunOptions};
use tracing_subscriber::EnvFilter;

fn run_case(min: usize) {
    let subs = generate_submissions(42, 40, 1500, 64);
    let options = RunOptions::new()
        .with_min_token_match(min)
        .with_similarity_threshold(20.0)
        .with_comparison_mode(ComparisonMode::Parallel);

    let t0 = Instant::now();
    let result = match Detector::new(options).run(subs) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(min, error = %err, "run failed");
            return;
        }
    };
    let dur = t0.elapsed();
    let dist = result.similarity_distribution();
    let best = result
        .comparisons
        .iter()
        .map(|c| c.percent())
        .fold(0.0f32, f32::max);

    println!(
        "MIN={min} time={dur:?} kept={} best={best:.1} distribution={dist:?}",
        result.comparisons.len()
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    for min in [3usize, 5, 9, 12, 16, 24] {
        run_case(min);
    }
}
