use std::sync::Arc;
use std::time::Duration;

use matsync_common::resilience::BackoffStrategy;
use matsync_common::time::{Sleeper, TokioSleeper};
use matsync_domain::MatSyncError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: Option<String>,
}

/// HTTP client with built-in retry and timeout support.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: u32,
    backoff: BackoffStrategy,
    sleeper: Arc<dyn Sleeper>,
    auth: Option<BasicAuth>,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, MatSyncError> {
        Self::builder().build()
    }

    /// Create a request builder, with basic auth applied when configured.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        let builder = self.client.request(method, url);
        match &self.auth {
            Some(auth) => builder.basic_auth(&auth.username, auth.password.as_ref()),
            None => builder,
        }
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Server errors and connection failures are retried; any other response
    /// is returned to the caller unchanged.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, MatSyncError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                MatSyncError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                MatSyncError::from(infra)
            })?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && attempt < attempts {
                        self.sleeper.sleep(self.backoff.calculate_delay(attempt)).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if attempt < attempts && should_retry_error(&err) {
                        self.sleeper.sleep(self.backoff.calculate_delay(attempt)).await;
                        continue;
                    }

                    let infra: InfraError = err.into();
                    return Err(MatSyncError::from(infra));
                }
            }
        }

        Err(MatSyncError::Internal("http client exhausted retries without producing a result".into()))
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
    user_agent: Option<String>,
    auth: Option<BasicAuth>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            auth: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.auth = Some(BasicAuth { username: username.into(), password });
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Fails when the underlying reqwest client cannot be constructed.
    pub fn build(self) -> Result<HttpClient, MatSyncError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            MatSyncError::from(infra)
        })?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            backoff: BackoffStrategy::Exponential {
                initial_delay: self.base_backoff,
                base: 2.0,
                max_delay: self.base_backoff.saturating_mul(256),
            },
            sleeper: self.sleeper,
            auth: self.auth,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}
