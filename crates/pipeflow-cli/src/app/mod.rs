pub mod cep;
pub mod config;
pub mod metered;
pub mod primes;
pub mod report;
pub mod telemetry;
