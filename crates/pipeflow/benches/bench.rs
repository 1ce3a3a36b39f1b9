use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use pipeflow::{CancellationToken, fan_in, fan_out, generate, stage, take};
use std::time::Instant;
use tokio::runtime::Builder;

const PRIMES: usize = 256;
// Large enough that trial division dominates the channel handoffs.
const FIRST_CANDIDATE: u64 = 10_000;

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    (2..n).rev().all(|d| n % d != 0)
}

fn counter() -> impl FnMut() -> u64 + Send + 'static {
    let mut next = FIRST_CANDIDATE;
    move || {
        next += 1;
        next
    }
}

fn keep_prime(n: u64) -> Option<u64> {
    is_prime(n).then_some(n)
}

/// One filtering stage between the generator and the consumer.
fn bench_single_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("primes/single_stage");
    group.sample_size(10);
    group.throughput(Throughput::Elements(PRIMES as u64));

    group.bench_function(format!("take/{PRIMES}"), |b| {
        let rt = Builder::new_multi_thread().enable_all().build().unwrap();

        b.to_async(&rt).iter_custom(|iters| async move {
            let start = Instant::now();
            for _ in 0..iters {
                let cancel = CancellationToken::new();
                let numbers = generate(cancel.clone(), counter());
                let primes = stage(cancel.clone(), numbers, keep_prime);
                let mut first = take(cancel.clone(), primes, PRIMES);
                while let Some(p) = first.recv().await {
                    black_box(p);
                }
                cancel.cancel();
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// The same filter fanned out across a growing number of stages.
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("primes/fan_out");
    group.sample_size(10);
    group.throughput(Throughput::Elements(PRIMES as u64));

    let max_width = num_cpus::get().max(1);
    for width in [1, 2, 4, 8, 16].into_iter().filter(|w| *w <= max_width) {
        group.bench_function(format!("take/{PRIMES}/width/{width}"), |b| {
            let rt = Builder::new_multi_thread().enable_all().build().unwrap();

            b.to_async(&rt).iter_custom(move |iters| async move {
                let start = Instant::now();
                for _ in 0..iters {
                    let cancel = CancellationToken::new();
                    let numbers = generate(cancel.clone(), counter());
                    let stages = fan_out(cancel.clone(), numbers, width, keep_prime).unwrap();
                    let merged = fan_in(cancel.clone(), stages);
                    let mut first = take(cancel.clone(), merged, PRIMES);
                    while let Some(p) = first.recv().await {
                        black_box(p);
                    }
                    cancel.cancel();
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_stage, bench_fan_out);
criterion_main!(benches);
