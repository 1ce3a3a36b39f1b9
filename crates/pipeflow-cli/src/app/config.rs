use super::cep::Cep;
use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use core::time::Duration;
use pipeflow::PoolConfig;

/// Default root of the postal-code lookup service.
pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

/// Extra time the pool grants a lookup on top of the HTTP client's own
/// timeout, so the client normally reports the timeout first.
const JOB_TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// Command-line arguments of the `pipeflow` binary.
///
/// Every flag falls back to an environment variable, and a `.env` file in the
/// working directory is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pipeflow",
    version,
    about = "Concurrent pipelines: a prime-number fan-out and a postal-code scanner"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Look up a range of Brazilian postal codes through a worker pool.
    Cep(CepArgs),
    /// Print the first primes found in a stream of random numbers.
    Primes(PrimesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CepArgs {
    /// First postal code to look up (inclusive), e.g. `07300000`.
    ///
    /// Environment variable: `START_KEY`
    #[arg(long, env = "START_KEY", default_value_t = Cep::new_unchecked(7_300_000))]
    pub start: Cep,

    /// Postal code to stop at (exclusive).
    ///
    /// Environment variable: `END_KEY`
    #[arg(long, env = "END_KEY", default_value_t = Cep::new_unchecked(7_301_000))]
    pub end: Cep,

    /// Number of concurrent lookups.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 64)]
    pub workers: usize,

    /// Capacity of the job queue and of the result queue. Defaults to the
    /// number of workers.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Per-lookup timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Root URL of the lookup service.
    ///
    /// Environment variable: `VIACEP_BASE_URL`
    #[arg(long, env = "VIACEP_BASE_URL", default_value_t = String::from(DEFAULT_BASE_URL))]
    pub base_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct PrimesArgs {
    /// Number of primes to print before stopping.
    ///
    /// Environment variable: `PRIME_COUNT`
    #[arg(long, env = "PRIME_COUNT", default_value_t = 20)]
    pub count: usize,

    /// Random candidates are drawn from `[0, max)`.
    ///
    /// Environment variable: `PRIME_MAX`
    #[arg(long, env = "PRIME_MAX", default_value_t = 50_000_000)]
    pub max: u64,

    /// Number of concurrent prime filters. Defaults to the CPU count.
    ///
    /// Environment variable: `PRIME_WIDTH`
    #[arg(long, env = "PRIME_WIDTH")]
    pub width: Option<usize>,

    /// Run a single prime filter instead of fanning out.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

#[derive(Debug, Clone)]
pub struct CepConfig {
    pub start: Cep,
    pub end: Cep,
    pub request_timeout: Duration,
    pub base_url: String,
    pub pool: PoolConfig,
}

impl CepConfig {
    /// Number of postal codes in `[start, end)`.
    pub const fn len(&self) -> u32 {
        self.end.get() - self.start.get()
    }
}

impl TryFrom<CepArgs> for CepConfig {
    type Error = anyhow::Error;

    fn try_from(args: CepArgs) -> Result<Self, Self::Error> {
        if args.start >= args.end {
            bail!(
                "START_KEY ({}) must be lower than END_KEY ({})",
                args.start,
                args.end
            );
        }

        if args.workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        let queue_capacity = args.queue_capacity.unwrap_or(args.workers);
        if queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be greater than 0");
        }

        if args.request_timeout == 0 {
            bail!("REQUEST_TIMEOUT must be greater than 0");
        }

        if args.base_url.trim().is_empty() {
            bail!("VIACEP_BASE_URL must not be empty");
        }

        let request_timeout = Duration::from_secs(args.request_timeout);
        let pool = PoolConfig::new(args.workers)
            .with_queue_capacity(queue_capacity)
            .with_result_capacity(queue_capacity)
            .with_job_timeout(request_timeout + JOB_TIMEOUT_GRACE);
        pool.validate()?;

        Ok(Self {
            start: args.start,
            end: args.end,
            request_timeout,
            base_url: args.base_url.trim_end_matches('/').to_string(),
            pool,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PrimesConfig {
    pub count: usize,
    pub max: u64,
    pub width: usize,
    pub sequential: bool,
}

impl TryFrom<PrimesArgs> for PrimesConfig {
    type Error = anyhow::Error;

    fn try_from(args: PrimesArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("PRIME_COUNT must be greater than 0");
        }

        // Below 3 the range holds no prime and the run would never end.
        if args.max < 3 {
            bail!("PRIME_MAX ({}) must be at least 3", args.max);
        }

        let width = args.width.unwrap_or_else(num_cpus::get);
        if width == 0 {
            bail!("PRIME_WIDTH must be greater than 0");
        }

        Ok(Self {
            count: args.count,
            max: args.max,
            width,
            sequential: args.sequential,
        })
    }
}

/// A validated subcommand, ready to run.
#[derive(Debug, Clone)]
pub enum RunConfig {
    Cep(CepConfig),
    Primes(PrimesConfig),
}

impl TryFrom<Command> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(command: Command) -> Result<Self, Self::Error> {
        Ok(match command {
            Command::Cep(args) => Self::Cep(CepConfig::try_from(args)?),
            Command::Primes(args) => Self::Primes(PrimesConfig::try_from(args)?),
        })
    }
}
