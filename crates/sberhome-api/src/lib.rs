// sberhome-api: Async Rust client for the SberDevices cloud gateway (transport + wire model)

pub mod auth;
pub mod error;
pub mod gateway;
pub mod models;
pub mod transport;

pub use auth::{CloudTokenProvider, TokenProvider};
pub use error::{Error, SESSION_EXPIRED_CODE};
pub use gateway::{DEFAULT_GATEWAY_URL, GatewayClient};
pub use transport::{TlsMode, TransportConfig};
