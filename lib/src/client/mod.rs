//! Rate-limit aware API client
//!
//! [`ResilientClient`] runs every request through the same retry loop:
//! the [`RetryPolicy`] classifies each attempt, the loop sleeps and retries
//! or gives up accordingly. Sends are spaced by a [`Pacer`] shared across
//! every thread using the client. The wire and the clock are behind the
//! [`Transport`] and [`Sleeper`] traits so the loop can be driven by fakes.

pub mod pacer;
pub mod policy;
pub mod transport;

pub use pacer::Pacer;
pub use policy::{Decision, RetryPolicy};
pub use transport::{
    ApiRequest, ApiResponse, HttpTransport, Method, RequestOptions, Sleeper, ThreadSleeper,
    Transport,
};

use crate::error::{ExportError, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;

pub struct ResilientClient<T: Transport, S: Sleeper = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    pacer: Pacer,
}

impl<T: Transport> ResilientClient<T, ThreadSleeper> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_sleeper(transport, ThreadSleeper, policy)
    }
}

impl<T: Transport, S: Sleeper> ResilientClient<T, S> {
    pub fn with_sleeper(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            pacer: Pacer::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request and decode a JSON payload
    pub fn request_json<D: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<D> {
        let body = self.request_text(method, path, options)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Request a raw text payload
    pub fn request_text(
        &self,
        method: Method,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<String> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            options: options.unwrap_or_default(),
        };
        self.execute(&request).map(|resp| resp.body)
    }

    /// Run the retry loop for one request
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut attempt = 1;
        loop {
            debug!(
                "{} {} (attempt {}/{})",
                request.method.as_str(),
                request.path,
                attempt,
                self.policy.max_retries
            );

            let wait = self
                .pacer
                .reserve(self.sleeper.now(), self.policy.request_delay);
            if !wait.is_zero() {
                debug!("Waiting {:?} for a send slot", wait);
                self.sleeper.sleep(wait);
            }

            // No status means no response at all: never retried
            let response = self.transport.send(request)?;

            match self
                .policy
                .decide(response.status, attempt, &response.url, &response.body)
            {
                Decision::Succeed => {
                    // Courtesy pause: hold the caller until the next slot opens
                    let pause = self.pacer.remaining(self.sleeper.now());
                    if !pause.is_zero() {
                        self.sleeper.sleep(pause);
                    }
                    return Ok(response);
                }
                Decision::Retry { delay, cause } => {
                    if matches!(cause, ExportError::RateLimited) {
                        self.pacer.hold_until(self.sleeper.now() + delay);
                    }
                    warn!(
                        "{} {} failed ({}), retrying in {:?} (attempt {}/{})",
                        request.method.as_str(),
                        request.path,
                        cause,
                        delay,
                        attempt,
                        self.policy.max_retries
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                Decision::Fail(err) => return Err(err),
            }
        }
    }
}
