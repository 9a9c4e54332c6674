use serde::Serialize;
use thiserror::Error;

/// Failure inside one step of a portal search.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The anti-forgery token could not be obtained. Never retried.
    #[error("{0}")]
    Authentication(String),

    #[error("{}", network_message(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Page structure could not be interpreted at all (e.g. a bad selector).
    #[error("parse error: {0}")]
    Parse(String),
}

fn network_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, message),
        None => message.to_string(),
    }
}

impl PortalError {
    pub fn network(message: impl Into<String>) -> Self {
        PortalError::Network {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else {
            e.to_string()
        };
        PortalError::Network {
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// Terminal error of a whole search run, returned in place of any results.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ScrapeError {
    pub message: String,
}

impl From<PortalError> for ScrapeError {
    fn from(e: PortalError) -> Self {
        ScrapeError {
            message: e.to_string(),
        }
    }
}
