use std::fmt;
use thiserror::Error;

/// A single failed HTTP attempt as seen by the transport.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// One failed attempt against one endpoint, kept for the aggregated error.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub endpoint: String,
    /// Zero-based attempt number on this endpoint
    pub attempt: u32,
    pub message: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (attempt {}): {}", self.endpoint, self.attempt + 1, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Every endpoint and retry failed and nothing was cached for the key.
    #[error("all endpoints failed for {key}: {}", join_attempts(.attempts))]
    Exhausted {
        key: String,
        attempts: Vec<AttemptFailure>,
    },

    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ResilienceError {
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            ResilienceError::Exhausted { attempts, .. } => attempts,
            ResilienceError::InvalidUrl { .. } => &[],
        }
    }
}

fn join_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
