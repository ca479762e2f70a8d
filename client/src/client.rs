//! Remote counter client.

use std::time::Duration;

use reqwest::{Method, Url};

use hstats_stats::Report;

use crate::ClientError;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_IDLE_PER_HOST: usize = 100;

/// Client for a remote hourly-stats server.
#[derive(Clone, Debug)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retries: u32,
    backoff: Duration,
}

impl StatsClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: token.into(),
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Extra attempts after a transient failure.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Delay before the first retry; doubled for each following one.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Count one event for `bucket.key`.
    pub async fn incr(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        self.send(Method::POST, &format!("stats/{bucket}/{key}")).await?;
        Ok(())
    }

    /// Fetch the report for `bucket`.
    pub async fn report(&self, bucket: &str) -> Result<Report, ClientError> {
        let body = self.send(Method::GET, &format!("stats/{bucket}")).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn send(&self, method: Method, path: &str) -> Result<Vec<u8>, ClientError> {
        if self.token.is_empty() {
            return Err(ClientError::NoToken);
        }
        let url = self.endpoint(path);

        let mut attempt = 0u32;
        loop {
            match self.attempt(method.clone(), url.clone()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient error: {e}, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, method: Method, url: Url) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }
        tracing::debug!(status = status.as_u16(), "request failed");
        Err(ClientError::from_status(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_path() {
        let client = StatsClient::new("http://localhost:8080/prefix/", "t").unwrap();
        assert_eq!(
            client.endpoint("stats/a/b").as_str(),
            "http://localhost:8080/prefix/stats/a/b"
        );
        let client = StatsClient::new("http://localhost:8080", "t").unwrap();
        assert_eq!(client.endpoint("stats/a").as_str(), "http://localhost:8080/stats/a");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            StatsClient::new("not a url", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn empty_token_fails_before_any_request() {
        let client = StatsClient::new("http://127.0.0.1:9", "").unwrap();
        assert!(matches!(client.incr("a", "b").await, Err(ClientError::NoToken)));
    }

    #[test]
    fn only_server_side_failures_are_transient() {
        assert!(ClientError::from_status(503).is_transient());
        assert!(ClientError::from_status(500).is_transient());
        assert!(!ClientError::from_status(429).is_transient());
        assert!(!ClientError::from_status(401).is_transient());
        assert!(matches!(ClientError::from_status(418), ClientError::Status(418)));
    }
}
