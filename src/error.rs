//! Failure taxonomy for price extraction and profile loading

use thiserror::Error;

/// Why a single extraction attempt produced no price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Transport-level failure: DNS, timeout, non-success status, redirect loop.
    #[error("network error: {0}")]
    Network(String),

    /// The page loaded but none of the profile's probes yielded text.
    #[error("price element not found on page")]
    ElementNotFound,

    /// The extracted text had no digits to form a price from.
    #[error("could not parse price from page")]
    Unparseable,
}

impl ExtractError {
    /// HTTP status a transport layer conventionally answers with for this failure.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ElementNotFound => 404,
            Self::Network(_) | Self::Unparseable => 500,
        }
    }

    /// Short stable label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::ElementNotFound => "element_not_found",
            Self::Unparseable => "unparseable",
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid selector \"{selector}\" in profile {profile}: {reason}")]
    InvalidSelector {
        profile: String,
        selector: String,
        reason: String,
    },

    #[error("failed to parse profile definitions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),
}
