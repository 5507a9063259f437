// ── Core error types ──
//
// User-facing errors from sberhome-core. These are NOT transport-specific --
// consumers never see HTTP plumbing failures directly. The
// `From<sberhome_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    /// The device id is not in the cache (never refreshed, or the device
    /// disappeared from the inventory).
    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    /// A capability read needed a state entry the device does not carry.
    #[error("State not found: {key}")]
    StateNotFound { key: String },

    /// A capability read needed an attribute descriptor the device does
    /// not carry.
    #[error("Attribute not found: {key}")]
    AttributeNotFound { key: String },

    /// Degenerate scaling range (`min == max`): the affine map would
    /// divide by zero.
    #[error("Invalid value range: ({min}, {max})")]
    InvalidRange { min: i64, max: i64 },

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Gateway rejection after the retry budget, or transport failure.
    #[error("Gateway error: {message}")]
    Api {
        message: String,
        /// The vendor error code, when the gateway returned one.
        code: Option<i64>,
        /// HTTP status code, when applicable.
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sberhome_api::Error> for CoreError {
    fn from(err: sberhome_api::Error) -> Self {
        match err {
            sberhome_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sberhome_api::Error::Gateway {
                code,
                status,
                message,
            } => CoreError::Api {
                message,
                code: Some(code),
                status: Some(status),
            },
            sberhome_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                code: None,
                status: e.status().map(u16::from),
            },
            sberhome_api::Error::InvalidUrl(e) => CoreError::Internal(format!("Invalid URL: {e}")),
            sberhome_api::Error::Tls(msg) => CoreError::Api {
                message: format!("TLS error: {msg}"),
                code: None,
                status: None,
            },
            sberhome_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
