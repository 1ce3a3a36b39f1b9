//! # Telemetry Features
//!
//! Console logging through `tracing-subscriber` is always on. OpenTelemetry
//! export is opt-in.
//!
//! ## Feature matrix
//!
//! - `traces`: Enables OpenTelemetry distributed tracing (via spans).
//! - `metrics`: Enables OpenTelemetry metrics (job counters and durations).
//! - `stdout`: Enables the stdout exporter.
//!
//! ## Feature constraints
//!
//! - `stdout` requires at least one of `traces` or `metrics`.
//!
//! ## Span behavior
//!
//! - Spans such as the per-lookup `lookup` span are exported when `traces` is
//!   enabled.
//! - Events outside of a span are only shown in log output (via
//!   `fmt::layer()`), not exported.
//!
//! ## Example usage
//!
//! ```bash
//! cargo run -p pipeflow-cli --features traces,metrics,stdout -- cep
//! ```

// Disallow using `stdout` without `traces` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "traces", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'traces' or 'metrics' to be enabled."
);

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Metrics-specific imports
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

// Either
#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry_semantic_conventions as semvcns;

// Tracing-specific imports
#[cfg(feature = "traces")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "traces")]
use opentelemetry_sdk::trace as sdktrace;

#[cfg(any(feature = "metrics", feature = "traces"))]
const SERVICE_NAME: &str = "pipeflow";

pub struct TelemetryProviders {
    #[cfg(feature = "traces")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and stops every exporter. Errors are printed, not returned, so
    /// a failing exporter cannot mask the run's own outcome.
    pub fn shutdown(self) {
        #[cfg(feature = "traces")]
        {
            if let Err(err) = self.tracer_provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = self.tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }

        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {err:#?}");
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {err:#?}");
            }
        }
    }
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "traces")]
    let tracer_provider = init_tracer();

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    #[cfg(any(feature = "metrics", feature = "traces"))]
    let scope = InstrumentationScope::builder(SERVICE_NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // Human-readable console output, unrelated to the `opentelemetry_stdout`
    // exporter.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .with_writer(std::io::stderr),
        );

    #[cfg(feature = "traces")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(&meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "traces")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(any(feature = "metrics", feature = "traces"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = sdkmetrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "traces")]
fn init_tracer() -> sdktrace::SdkTracerProvider {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let exporter = SpanExporter::default();
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();
        builder.with_span_processor(batch)
    };

    builder.build()
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static JOBS_PROCESSED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static JOB_FAILURES: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static JOB_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static PRIMES_EMITTED: OnceLock<Counter<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: &Meter) {
    let _ = JOBS_PROCESSED.set(
        meter
            .u64_counter("jobs_processed")
            .with_description("Jobs handled by the worker pool")
            .build(),
    );

    let _ = JOB_FAILURES.set(
        meter
            .u64_counter("job_failures")
            .with_description("Jobs that produced a failure result")
            .build(),
    );

    let _ = JOB_DURATION_MS.set(
        meter
            .f64_histogram("job_duration")
            .with_unit("ms")
            .with_description("Time spent processing one job")
            .build(),
    );

    let _ = PRIMES_EMITTED.set(
        meter
            .u64_counter("primes_emitted")
            .with_description("Primes delivered to the consumer")
            .build(),
    );
}

// Convenience functions that compile to no-ops when metrics are disabled
#[cfg(feature = "metrics")]
pub fn increment_jobs_processed() {
    if let Some(counter) = JOBS_PROCESSED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_jobs_processed() {}

#[cfg(feature = "metrics")]
pub fn increment_job_failures(kind: &'static str) {
    if let Some(counter) = JOB_FAILURES.get() {
        counter.add(1, &[KeyValue::new("kind", kind)]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_job_failures(_kind: &'static str) {}

#[cfg(feature = "metrics")]
pub fn record_job_duration(duration_ms: f64) {
    if let Some(histogram) = JOB_DURATION_MS.get() {
        histogram.record(duration_ms, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_job_duration(_duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_primes_emitted() {
    if let Some(counter) = PRIMES_EMITTED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_primes_emitted() {}
