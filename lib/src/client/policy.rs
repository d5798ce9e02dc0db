use crate::error::ExportError;
use std::time::Duration;

/// Retry and pacing knobs of the [`ResilientClient`](super::ResilientClient)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per request, the first one included
    pub max_retries: u32,
    /// First 5xx backoff; doubles on every further attempt
    pub base_delay: Duration,
    /// Fixed wait after a 429
    pub rate_limit_cooldown: Duration,
    /// Courtesy pause after every successful response
    pub request_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            rate_limit_cooldown: Duration::from_secs(60),
            request_delay: Duration::from_millis(500),
        }
    }
}

/// What the request loop should do next
#[derive(Debug)]
pub enum Decision {
    Succeed,
    /// Wait `delay`, then try again; `cause` is kept in case it was the last try
    Retry { delay: Duration, cause: ExportError },
    Fail(ExportError),
}

impl RetryPolicy {
    /// Exponential backoff before the attempt after `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exp)
    }

    /// Classify the status of one attempt
    ///
    /// Pure: no I/O and no sleeping, the caller interprets the decision.
    /// Retryable statuses on the final attempt become
    /// [`ExportError::RetriesExhausted`]. `url` and `body` only feed the
    /// error of a fatal status.
    pub fn decide(&self, status: u16, attempt: u32, url: &str, body: &str) -> Decision {
        let (cause, delay) = match status {
            200..=299 => return Decision::Succeed,
            401 => return Decision::Fail(ExportError::Auth),
            429 => (ExportError::RateLimited, self.rate_limit_cooldown),
            500..=u16::MAX => (ExportError::Server { status }, self.backoff(attempt)),
            _ => {
                return Decision::Fail(ExportError::Status {
                    status,
                    url: url.to_string(),
                    body: truncate_body(body),
                })
            }
        };

        if attempt >= self.max_retries.max(1) {
            Decision::Fail(ExportError::RetriesExhausted {
                attempts: attempt,
                source: Box::new(cause),
            })
        } else {
            Decision::Retry { delay, cause }
        }
    }
}

const MAX_BODY_IN_ERROR: usize = 200;

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_BODY_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            rate_limit_cooldown: Duration::from_secs(5),
            request_delay: Duration::ZERO,
        }
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    #[case(6, 3200)]
    fn test_backoff_doubles(#[case] attempt: u32, #[case] expected_ms: u64) {
        assert_eq!(policy().backoff(attempt), Duration::from_millis(expected_ms));
    }

    #[rstest]
    #[case(200)]
    #[case(204)]
    fn test_success(#[case] status: u16) {
        assert!(matches!(
            policy().decide(status, 1, "u", ""),
            Decision::Succeed
        ));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_401_fails_on_any_attempt(#[case] attempt: u32) {
        assert!(matches!(
            policy().decide(401, attempt, "u", ""),
            Decision::Fail(ExportError::Auth)
        ));
    }

    #[test]
    fn test_429_waits_cooldown() {
        match policy().decide(429, 1, "u", "") {
            Decision::Retry { delay, cause } => {
                assert_eq!(delay, Duration::from_secs(5));
                assert!(matches!(cause, ExportError::RateLimited));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[rstest]
    #[case(500, 1, 100)]
    #[case(503, 2, 200)]
    fn test_5xx_backs_off(#[case] status: u16, #[case] attempt: u32, #[case] ms: u64) {
        match policy().decide(status, attempt, "u", "") {
            Decision::Retry { delay, cause } => {
                assert_eq!(delay, Duration::from_millis(ms));
                assert_eq!(cause.status(), Some(status));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[rstest]
    #[case(500)]
    #[case(429)]
    fn test_last_attempt_exhausts(#[case] status: u16) {
        match policy().decide(status, 3, "u", "") {
            Decision::Fail(ExportError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source.status(), Some(status));
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[rstest]
    #[case(400)]
    #[case(403)]
    #[case(404)]
    fn test_other_status_is_fatal(#[case] status: u16) {
        match policy().decide(status, 1, "https://x/y", "nope") {
            Decision::Fail(ExportError::Status { status: s, url, body }) => {
                assert_eq!(s, status);
                assert_eq!(url, "https://x/y");
                assert_eq!(body, "nope");
            }
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_single_attempt_budget() {
        let policy = RetryPolicy {
            max_retries: 1,
            ..policy()
        };
        assert!(matches!(
            policy.decide(502, 1, "u", ""),
            Decision::Fail(ExportError::RetriesExhausted { .. })
        ));
    }

    #[test]
    fn test_error_body_is_truncated() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), MAX_BODY_IN_ERROR + 3);
    }
}
