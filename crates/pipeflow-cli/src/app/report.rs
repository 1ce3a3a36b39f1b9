use chrono::{DateTime, Local, SecondsFormat};
use core::{fmt, time::Duration};
use pipeflow::JobResult;
use std::time::Instant;

/// Samples kept per outcome.
pub const MAX_SAMPLES: usize = 5;

/// Wall-clock bounds of a run.
#[derive(Debug, Clone)]
pub struct RunClock {
    started_at: DateTime<Local>,
    start: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            start: Instant::now(),
        }
    }

    pub fn finish<J, T>(self, results: &[JobResult<J, T>], cancelled: bool) -> Summary
    where
        J: fmt::Display,
        T: fmt::Display,
    {
        Summary::new(results, self.started_at, Local::now(), self.start.elapsed(), cancelled)
    }
}

/// Aggregate counts and a few samples of a pool run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    pub valid_samples: Vec<String>,
    pub invalid_samples: Vec<String>,
    /// The run was stopped early; counts cover only the collected results.
    pub cancelled: bool,
}

impl Summary {
    pub fn new<J, T>(
        results: &[JobResult<J, T>],
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
        elapsed: Duration,
        cancelled: bool,
    ) -> Self
    where
        J: fmt::Display,
        T: fmt::Display,
    {
        let mut summary = Self {
            total: results.len(),
            valid: 0,
            invalid: 0,
            started_at,
            finished_at,
            elapsed,
            valid_samples: Vec::new(),
            invalid_samples: Vec::new(),
            cancelled,
        };

        for result in results {
            match &result.outcome {
                Ok(value) => {
                    summary.valid += 1;
                    if summary.valid_samples.len() < MAX_SAMPLES {
                        summary.valid_samples.push(format!("{} {value}", result.job));
                    }
                }
                Err(e) => {
                    summary.invalid += 1;
                    if summary.invalid_samples.len() < MAX_SAMPLES {
                        summary.invalid_samples.push(format!("{}: {e}", result.job));
                    }
                }
            }
        }

        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            writeln!(f, "Run cancelled, partial results follow")?;
        }
        writeln!(f, "Processed: {}", self.total)?;
        writeln!(f, "Valid:     {}", self.valid)?;
        writeln!(f, "Invalid:   {}", self.invalid)?;
        writeln!(
            f,
            "Started:   {}",
            self.started_at.to_rfc3339_opts(SecondsFormat::Millis, false)
        )?;
        writeln!(
            f,
            "Finished:  {}",
            self.finished_at.to_rfc3339_opts(SecondsFormat::Millis, false)
        )?;
        writeln!(f, "Elapsed:   {:.3}s", self.elapsed.as_secs_f64())?;

        write_samples(f, "Sample valid results", &self.valid_samples)?;
        write_samples(f, "Sample invalid results", &self.invalid_samples)
    }
}

fn write_samples(f: &mut fmt::Formatter<'_>, title: &str, samples: &[String]) -> fmt::Result {
    if samples.is_empty() {
        return writeln!(f, "{title}: none");
    }
    writeln!(f, "{title}:")?;
    for sample in samples {
        writeln!(f, "  {sample}")?;
    }
    Ok(())
}
