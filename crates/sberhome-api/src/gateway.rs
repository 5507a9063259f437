// Gateway HTTP client
//
// Wraps `reqwest::Client` with gateway-specific URL construction, the
// `X-AUTH-jwt` session header, and the lazy re-authentication policy:
// a token is fetched only when no live token is installed, and a request
// rejected with the vendor's "session expired" code gets exactly one
// retry with a fresh token.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::{Error, SESSION_EXPIRED_CODE};
use crate::models::{DeviceTree, GatewayFault, StateEntry, TreeEnvelope};
use crate::transport::TransportConfig;

/// Default base endpoint of the vendor gateway.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.iot.sberdevices.ru/gateway/v1";

const AUTH_HEADER: &str = "X-AUTH-jwt";

/// Session token slot. `alive` is dropped when the gateway rejects the
/// token, forcing a refetch on the next request.
struct TokenSlot {
    alive: bool,
    jwt: Option<SecretString>,
}

/// HTTP client for the vendor gateway.
///
/// Owns the current session token and the re-authentication policy.
/// Token fetches go through the injected [`TokenProvider`]; the token
/// slot sits behind a mutex so concurrent requests trigger at most one
/// exchange per expiry (single-flight).
pub struct GatewayClient<P> {
    http: reqwest::Client,
    base_url: Url,
    provider: P,
    token: Mutex<TokenSlot>,
}

/// `PUT /devices/{id}/state` request body.
#[derive(Serialize)]
struct StateWrite<'a> {
    device_id: &'a str,
    desired_state: &'a [StateEntry],
    timestamp: String,
}

impl<P: TokenProvider> GatewayClient<P> {
    /// Create a client against the production gateway.
    pub fn new(provider: P, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_GATEWAY_URL)?;
        Self::with_base_url(base_url, provider, transport)
    }

    /// Create a client against a custom gateway base URL (used by tests).
    pub fn with_base_url(
        base_url: Url,
        provider: P,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            provider,
            token: Mutex::new(TokenSlot {
                alive: false,
                jwt: None,
            }),
        })
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Return the live session token, fetching one first if none is
    /// installed. Installing a token only affects outbound headers;
    /// there is no server-side session to create.
    async fn ensure_token(&self) -> Result<SecretString, Error> {
        let mut slot = self.token.lock().await;
        if !slot.alive {
            let jwt = self.provider.fetch_token().await?;
            slot.jwt = Some(jwt);
            slot.alive = true;
            debug!("installed fresh session token");
        }
        slot.jwt.clone().ok_or_else(|| Error::Authentication {
            message: "token provider yielded no token".into(),
        })
    }

    /// Drop the live flag so the next request refetches.
    async fn invalidate_token(&self) {
        self.token.lock().await.alive = false;
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Build a full URL for a gateway path (relative to the versioned base).
    fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Issue a request and decode the JSON response.
    ///
    /// Bounded retry: if the gateway answers with the session-expired code
    /// on the first attempt, the token is invalidated and the request is
    /// sent once more with a fresh one. A second rejection, or any other
    /// error code, propagates as [`Error::Gateway`]. Non-auth HTTP errors
    /// never retry.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, Error> {
        let url = self.endpoint_url(path)?;
        let mut retry = true;

        loop {
            let jwt = self.ensure_token().await?;

            debug!("{method} {url}");
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .header(AUTH_HEADER, jwt.expose_secret());
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let resp = builder.send().await.map_err(Error::Transport)?;
            let status = resp.status();
            let text = resp.text().await.map_err(Error::Transport)?;

            if status.is_success() {
                // Some write endpoints answer with an empty body.
                let payload = if text.is_empty() { "null" } else { &text };
                return serde_json::from_str(payload).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: text.clone(),
                });
            }

            let fault: GatewayFault =
                serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                    message: format!("error body (HTTP {status}): {e}"),
                    body: text.clone(),
                })?;

            if fault.code == SESSION_EXPIRED_CODE && retry {
                debug!("session token rejected, re-authenticating once");
                self.invalidate_token().await;
                retry = false;
                continue;
            }

            return Err(Error::Gateway {
                code: fault.code,
                status: status.as_u16(),
                message: fault.message,
            });
        }
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full device inventory tree.
    ///
    /// `GET /device_groups/tree`
    pub async fn device_tree(&self) -> Result<DeviceTree, Error> {
        debug!("fetching device tree");
        let envelope: TreeEnvelope = self
            .request(Method::GET, "device_groups/tree", None::<&()>)
            .await?;
        Ok(envelope.result)
    }

    /// Push desired-state entries to one device.
    ///
    /// `PUT /devices/{id}/state` with the device id, the entries, and a
    /// millisecond-precision UTC send timestamp. The gateway applies the
    /// whole entry set transactionally; there is no partial success.
    pub async fn set_device_state(
        &self,
        device_id: &str,
        desired_state: &[StateEntry],
    ) -> Result<(), Error> {
        debug!(device_id, entries = desired_state.len(), "writing device state");

        let body = StateWrite {
            device_id,
            desired_state,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        let _: serde_json::Value = self
            .request(
                Method::PUT,
                &format!("devices/{device_id}/state"),
                Some(&body),
            )
            .await?;
        Ok(())
    }
}
