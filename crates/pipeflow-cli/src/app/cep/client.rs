use super::{Address, Cep, decode_address};
use anyhow::Context;
use core::{future::Future, time::Duration};
use pipeflow::{JobError, Processor};

/// HTTP client for `GET {base_url}/ws/{cep}/json`.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ViaCepClient {
    /// Builds a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pipeflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn url(&self, cep: Cep) -> String {
        format!("{}/ws/{cep}/json", self.base_url)
    }

    /// Looks up one postal code.
    ///
    /// # Errors
    ///
    /// - [`JobError::TimedOut`] if the request exceeds the client timeout.
    /// - [`JobError::Transport`] for connection and body read failures.
    /// - The errors of [`decode_address`] otherwise.
    #[tracing::instrument(level = "debug", skip_all, fields(cep = %cep))]
    pub async fn lookup(&self, cep: Cep) -> Result<Address, JobError> {
        let response = self
            .http
            .get(self.url(cep))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        decode_address(status, &body)
    }

    fn transport_error(&self, error: &reqwest::Error) -> JobError {
        if error.is_timeout() {
            JobError::TimedOut(self.timeout)
        } else {
            JobError::Transport(error.to_string())
        }
    }
}

impl Processor<Cep> for ViaCepClient {
    type Output = Address;

    fn process(&self, job: Cep) -> impl Future<Output = Result<Address, JobError>> + Send {
        self.lookup(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_zero_padded_code() {
        let client = ViaCepClient::new("https://viacep.com.br/", Duration::from_secs(10))
            .expect("client builds");
        assert_eq!(
            client.url(Cep::new_unchecked(7_300_000)),
            "https://viacep.com.br/ws/07300000/json"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        // Port 9 (discard) on loopback refuses connections on test machines.
        let client = ViaCepClient::new("http://127.0.0.1:9", Duration::from_secs(5))
            .expect("client builds");
        let outcome = client.process(Cep::new_unchecked(7_300_000)).await;
        assert!(
            matches!(outcome, Err(JobError::Transport(_) | JobError::TimedOut(_))),
            "{outcome:?}"
        );
    }
}
