// src/core/error.rs

use thiserror::Error;

/// Failure of a single HTTP probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response head arrived but the body could not be read.
    #[error("reading body of {status} response failed: {source}")]
    Body {
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    /// Public DNS has no address for the hostname.
    #[error("{host} has no public DNS record")]
    Unresolvable { host: String },

    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    /// Status code of the partial response. Only a failed body read has one:
    /// every other variant fails before a response head arrives.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeError::Body { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by the scanner itself.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to obtain baseline on {ip}{path}: {source}")]
    Baseline {
        ip: String,
        path: String,
        #[source]
        source: ProbeError,
    },

    #[error("the worker pool needs at least one thread")]
    NoWorkers,

    #[error("invalid header {0:?}, expected `Name: value`")]
    InvalidHeader(String),

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_body_errors_carry_a_status() {
        assert_eq!(ProbeError::Transport("timed out".into()).status(), None);
        assert_eq!(ProbeError::InvalidUrl("http://[::1".into()).status(), None);
        assert_eq!(ProbeError::Unresolvable { host: "a.example.com".into() }.status(), None);
    }
}
