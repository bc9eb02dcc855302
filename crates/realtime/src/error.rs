//! Break watch errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the workspace.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type.
///
/// None of these are fatal: feed errors abort the current tick only and
/// observation errors drop a single snapshot entry.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// The vehicle feed could not be reached or answered with a failure status.
    #[error("code: fetch_error, description: {0}")]
    Fetch(String),

    /// The feed answered, but the body was not in the expected wrapped-JSON shape.
    #[error("code: decode_error, description: {0}")]
    Decode(String),

    /// A single snapshot entry was malformed.
    #[error("code: invalid_observation, description: {0}")]
    Observation(String),

    /// Configuration or request input was invalid.
    #[error("code: bad_request, description: {0}")]
    BadRequest(String),

    /// The requested resource could not be found.
    #[error("code: not_found, description: {0}")]
    NotFound(String),

    /// A non recoverable internal error occurred.
    #[error("code: internal_error, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code associated with the variant.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_error",
            Self::Decode(_) => "decode_error",
            Self::Observation(_) => "invalid_observation",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the error should abort the whole tick rather than a single entry.
    #[must_use]
    pub const fn is_feed_error(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Decode(_))
    }

    /// Returns the error description.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // if type is Error, keep the variant and fold in the added context
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::Fetch(_) => Self::Fetch(chain),
                Self::Decode(_) => Self::Decode(chain),
                Self::Observation(_) => Self::Observation(chain),
                Self::BadRequest(_) => Self::BadRequest(chain),
                Self::NotFound(_) => Self::NotFound(chain),
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        Self::Internal(chain)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[macro_export]
macro_rules! fetch_error {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Fetch(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Fetch(format!($err))
    };
}

#[macro_export]
macro_rules! decode_error {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Decode(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Decode(format!($err))
    };
}

#[macro_export]
macro_rules! observation_error {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Observation(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Observation(format!($err))
    };
}

#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}
