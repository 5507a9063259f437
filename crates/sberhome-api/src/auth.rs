// Smart-home token exchange
//
// The gateway authenticates with a short-lived JWT obtained from the
// vendor's cloud token endpoint. The OAuth authorization-code flow that
// produces the long-lived bearer credential happens outside this crate
// (browser redirect through the companion app); we only consume its result.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default base URL of the vendor cloud that issues smart-home tokens.
pub const DEFAULT_AUTH_BASE: &str = "https://mp.aihome.dev";

const TOKEN_PATH: &str = "/v11/smarthome/token";

/// Source of fresh gateway session tokens.
///
/// Every call performs a fresh network exchange; caching the token between
/// calls is [`GatewayClient`](crate::gateway::GatewayClient)'s job, which
/// lets it drop a dead token and ask for a new one exactly once per
/// rejected request.
pub trait TokenProvider: Send + Sync {
    /// Fetch a fresh gateway JWT.
    fn fetch_token(&self) -> impl Future<Output = Result<SecretString, Error>> + Send;
}

/// `{"token": "..."}` from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Token provider backed by the vendor cloud token endpoint.
///
/// Holds the persisted OAuth bearer credential and trades it for a gateway
/// JWT on demand (`GET /v11/smarthome/token`).
pub struct CloudTokenProvider {
    http: reqwest::Client,
    token_url: Url,
    bearer: SecretString,
}

impl CloudTokenProvider {
    /// Create a provider against the default vendor cloud.
    pub fn new(bearer: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let base = Url::parse(DEFAULT_AUTH_BASE)?;
        Self::with_base_url(base, bearer, transport)
    }

    /// Create a provider against a custom auth base URL (used by tests).
    pub fn with_base_url(
        base_url: Url,
        bearer: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            token_url: base_url.join(TOKEN_PATH)?,
            bearer,
        })
    }
}

impl TokenProvider for CloudTokenProvider {
    async fn fetch_token(&self) -> Result<SecretString, Error> {
        debug!("fetching fresh smart-home token");

        let resp = self
            .http
            .get(self.token_url.clone())
            .bearer_auth(self.bearer.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Authentication {
                message: format!("token exchange rejected (HTTP {status}): {preview}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("token response: {e}"),
                body,
            })?;

        debug!("token exchange successful");
        Ok(SecretString::from(token.token))
    }
}
