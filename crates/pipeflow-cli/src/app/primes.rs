//! Random numbers through a deliberately slow prime filter, fanned out across
//! several stages and merged back before taking the first primes.
//!
//! ```text
//! generate(random) -> fan_out(width x keep_prime) -> fan_in -> take(count)
//! ```

use super::{config::PrimesConfig, telemetry::increment_primes_emitted};
use pipeflow::{CancellationToken, fan_in, fan_out, generate, stage, take};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Instant;
use tokio::sync::mpsc;

/// Trial division counting down from `n - 1`.
///
/// Intentionally slow: it is the bottleneck the fan-out spreads across
/// stages.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    (2..n).rev().all(|d| n % d != 0)
}

/// Stage function: keeps primes, drops everything else.
fn keep_prime(n: u64) -> Option<u64> {
    // Long CPU-bound call; hand the worker thread's other tasks elsewhere.
    tokio::task::block_in_place(|| is_prime(n)).then_some(n)
}

/// Uniform random candidates in `[0, max)`.
pub fn random_candidates(max: u64) -> impl FnMut() -> u64 + Send + 'static {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    move || rng.random_range(0..max)
}

/// Wires the prime pipeline over `produce` and returns the stream of the
/// first `config.count` primes.
///
/// The stream closes after `config.count` primes or once `cancel` is raised.
/// The generator and filters keep running until `cancel` is raised.
///
/// Must run on the multi-thread Tokio runtime: the filters test candidates
/// inside [`tokio::task::block_in_place`], which panics on a current-thread
/// runtime.
///
/// # Errors
///
/// Returns [`pipeflow::Error::InvalidConfig`] if the fan-out width is zero.
pub fn prime_pipeline<F>(
    cancel: &CancellationToken,
    config: &PrimesConfig,
    produce: F,
) -> pipeflow::Result<mpsc::Receiver<u64>>
where
    F: FnMut() -> u64 + Send + 'static,
{
    let candidates = generate(cancel.clone(), produce);

    let primes = if config.sequential {
        stage(cancel.clone(), candidates, keep_prime)
    } else {
        let filters = fan_out(cancel.clone(), candidates, config.width, keep_prime)?;
        fan_in(cancel.clone(), filters)
    };

    Ok(take(cancel.clone(), primes, config.count))
}

/// Prints the first `config.count` primes among random numbers and the total
/// execution time.
///
/// Returns the primes in the order they were printed.
///
/// # Errors
///
/// Fails if the pipeline cannot be built.
pub async fn run(config: &PrimesConfig, cancel: &CancellationToken) -> anyhow::Result<Vec<u64>> {
    if config.sequential {
        tracing::info!("Running a single prime filter");
    } else {
        tracing::info!(
            "Fanning out across {} prime filters ({} CPUs)",
            config.width,
            num_cpus::get()
        );
    }

    // Own signal so the generator and filters stop once enough primes were
    // taken, without touching the caller's token.
    let pipeline = cancel.child_token();
    let start = Instant::now();

    let mut primes = prime_pipeline(&pipeline, config, random_candidates(config.max))?;
    let mut found = Vec::with_capacity(config.count);
    while let Some(prime) = primes.recv().await {
        println!("{} - {prime}", found.len());
        increment_primes_emitted();
        found.push(prime);
    }
    pipeline.cancel();

    if found.len() < config.count {
        tracing::warn!("Stopped after {} of {} primes", found.len(), config.count);
    }
    println!(
        "Total Execution time: (in seconds): {:.6}",
        start.elapsed().as_secs_f64()
    );

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::collections::HashSet;

    fn counter() -> impl FnMut() -> u64 + Send + 'static {
        let mut next = 0;
        move || {
            next += 1;
            next
        }
    }

    fn config(count: usize, width: usize, sequential: bool) -> PrimesConfig {
        PrimesConfig {
            count,
            max: 1_000,
            width,
            sequential,
        }
    }

    async fn drain(mut rx: mpsc::Receiver<u64>) -> Vec<u64> {
        tokio::time::timeout(Duration::from_secs(5), async move {
            let mut out = Vec::new();
            while let Some(v) = rx.recv().await {
                out.push(v);
            }
            out
        })
        .await
        .expect("pipeline finishes")
    }

    #[test]
    fn trial_division_classifies_small_numbers() {
        let primes: Vec<u64> = (0..30).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(7_919));
        assert!(!is_prime(7_917));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sequential_pipeline_keeps_input_order() {
        let cancel = CancellationToken::new();
        let rx = prime_pipeline(&cancel, &config(6, 1, true), counter()).expect("pipeline builds");
        assert_eq!(drain(rx).await, [2, 3, 5, 7, 11, 13]);
        cancel.cancel();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fanned_out_pipeline_takes_exactly_count_distinct_primes() {
        let cancel = CancellationToken::new();
        let rx =
            prime_pipeline(&cancel, &config(25, 4, false), counter()).expect("pipeline builds");
        let primes = drain(rx).await;
        cancel.cancel();

        assert_eq!(primes.len(), 25);
        assert!(primes.iter().all(|p| is_prime(*p)));
        let unique: HashSet<_> = primes.iter().collect();
        assert_eq!(unique.len(), 25);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn zero_width_is_rejected() {
        let cancel = CancellationToken::new();
        assert!(prime_pipeline(&cancel, &config(1, 0, false), counter()).is_err());
        cancel.cancel();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn run_returns_random_primes_below_max() {
        let config = PrimesConfig {
            count: 5,
            max: 500,
            width: 2,
            sequential: false,
        };
        let cancel = CancellationToken::new();
        let primes = tokio::time::timeout(Duration::from_secs(5), run(&config, &cancel))
            .await
            .expect("run finishes")
            .expect("pipeline builds");

        assert_eq!(primes.len(), 5);
        assert!(primes.iter().all(|p| *p < 500 && is_prime(*p)));
        assert!(!cancel.is_cancelled(), "caller's token is left alone");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_run_stops_early() {
        let config = PrimesConfig {
            count: 1_000_000,
            max: 500,
            width: 2,
            sequential: false,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let primes = tokio::time::timeout(Duration::from_secs(5), run(&config, &cancel))
            .await
            .expect("run stops promptly")
            .expect("pipeline builds");
        assert!(primes.len() < config.count);
    }
}
