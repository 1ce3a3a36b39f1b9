use super::{Address, Cep};
use crate::app::{config::CepConfig, metered::Metered, report::RunClock, report::Summary};
use pipeflow::{CancellationToken, Processor, run_pool};

/// Looks up every code in `[config.start, config.end)` and summarises the
/// outcome.
///
/// Raising `cancel` stops the scan early; the summary then covers the results
/// collected so far and is marked as cancelled.
///
/// # Errors
///
/// Fails only if the pool cannot be started or fed; individual lookup
/// failures are counted in the summary.
#[tracing::instrument(skip_all, fields(start = %config.start, end = %config.end))]
pub async fn scan<P>(
    config: &CepConfig,
    lookup: P,
    cancel: CancellationToken,
) -> anyhow::Result<Summary>
where
    P: Processor<Cep, Output = Address>,
{
    tracing::info!(
        "Scanning {} postal codes with {} workers",
        config.len(),
        config.pool.worker_count
    );

    let clock = RunClock::start();
    let results = run_pool(
        config.pool.clone(),
        Cep::range(config.start, config.end),
        Metered::new(lookup),
        cancel.clone(),
    )
    .await?;

    Ok(clock.finish(&results, cancel.is_cancelled()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{CepArgs, DEFAULT_BASE_URL};
    use core::time::Duration;
    use pipeflow::{JobError, processor_fn};

    fn config(start: u32, end: u32, workers: usize) -> CepConfig {
        CepConfig::try_from(CepArgs {
            start: Cep::new_unchecked(start),
            end: Cep::new_unchecked(end),
            workers,
            queue_capacity: None,
            request_timeout: 1,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
        .expect("valid config")
    }

    fn found(cep: Cep) -> Address {
        Address {
            cep: cep.to_string(),
            localidade: "Guarulhos".to_string(),
            uf: "SP".to_string(),
            ..Address::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_failing_code_is_counted_and_sampled() {
        let lookup = processor_fn(|cep: Cep| async move {
            if cep.get() == 7_000_005 {
                Err(JobError::Transport("connection reset".to_string()))
            } else {
                Ok(found(cep))
            }
        });

        let summary = scan(&config(7_000_000, 7_000_010, 4), lookup, CancellationToken::new())
            .await
            .expect("scan runs");

        assert!(!summary.cancelled);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.valid, 9);
        assert_eq!(summary.invalid, 1);
        assert_eq!(
            summary.invalid_samples,
            ["07000005: Transport error: connection reset"]
        );
        assert_eq!(summary.valid_samples.len(), 5);
        assert!(summary.valid_samples.iter().all(|s| s.ends_with("Guarulhos/SP")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_scan_reports_partial_results() {
        let cancel = CancellationToken::new();
        let lookup = processor_fn(|cep: Cep| async move {
            if cep.get() >= 7_000_020 {
                futures::future::pending::<()>().await;
            }
            Ok(found(cep))
        });

        let config = config(7_000_000, 7_001_000, 2);
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { scan(&config, lookup, cancel).await }
        });

        // Well inside the 2s job timeout, so no stalled lookup has failed yet.
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();

        let summary = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("scan stops after cancel")
            .expect("scan task did not panic")
            .expect("cancellation is not an error");

        assert!(summary.cancelled);
        assert_eq!(summary.invalid, 0);
        assert!(summary.valid <= 20, "{} results", summary.valid);
        assert!(summary.to_string().starts_with("Run cancelled"));
    }
}
