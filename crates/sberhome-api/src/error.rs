use thiserror::Error;

/// Vendor error code meaning "session token no longer valid".
///
/// The gateway returns it in the error body (`{"code": 16, ...}`) when the
/// short-lived smart-home JWT has expired server-side. It is the only code
/// the client recovers from on its own.
pub const SESSION_EXPIRED_CODE: i64 = 16;

/// Top-level error type for the `sberhome-api` crate.
///
/// Covers authentication, transport, and gateway failure modes.
/// `sberhome-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token exchange rejected (revoked OAuth credential, upstream outage).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Gateway ─────────────────────────────────────────────────────
    /// Structured error from the gateway (`{"code": N, "message": "..."}`),
    /// surfaced after the single re-authentication retry is spent.
    /// Not retryable by this client.
    #[error("Gateway error {code} (HTTP {status}): {message}")]
    Gateway {
        code: i64,
        status: u16,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is the vendor's "session expired" sentinel
    /// that re-authentication would resolve.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Gateway {
                code: SESSION_EXPIRED_CODE,
                ..
            }
        )
    }

    /// Extract the gateway error code, if available.
    pub fn gateway_code(&self) -> Option<i64> {
        match self {
            Self::Gateway { code, .. } => Some(*code),
            _ => None,
        }
    }
}
