// ── Switch capability ──

use std::sync::Arc;

use sberhome_api::TokenProvider;
use sberhome_api::models::{Device, StateEntry};

use crate::device::DeviceHandle;
use crate::error::CoreError;

const KEY_ON_OFF: &str = "on_off";
const KEY_VOLTAGE: &str = "voltage";
const KEY_CURRENT: &str = "current";
const KEY_POWER: &str = "power";

/// Semantic smart-socket facade bound to one cached device.
pub struct Switch<P: TokenProvider> {
    handle: DeviceHandle<P>,
}

impl<P: TokenProvider> Switch<P> {
    pub fn new(handle: DeviceHandle<P>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &DeviceHandle<P> {
        &self.handle
    }

    fn device(&self) -> Result<Arc<Device>, CoreError> {
        self.handle.device()
    }

    /// Refresh the shared cache (all devices).
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.handle.refresh().await
    }

    pub fn is_on(&self) -> Result<bool, CoreError> {
        let device = self.device()?;
        device
            .state(KEY_ON_OFF)
            .and_then(StateEntry::as_bool)
            .ok_or_else(|| CoreError::StateNotFound {
                key: KEY_ON_OFF.into(),
            })
    }

    pub async fn turn_on(&self) -> Result<(), CoreError> {
        self.handle.set_on_off(true).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        self.handle.set_on_off(false).await
    }

    // ── Telemetry ────────────────────────────────────────────────────
    // Sockets without metering simply omit these reported keys.

    /// Mains voltage in volts, when the socket meters it.
    pub fn voltage(&self) -> Result<Option<f64>, CoreError> {
        let device = self.device()?;
        Ok(reported_number(&device, KEY_VOLTAGE))
    }

    /// Load current in amperes, when the socket meters it.
    pub fn current(&self) -> Result<Option<f64>, CoreError> {
        let device = self.device()?;
        Ok(reported_number(&device, KEY_CURRENT))
    }

    /// Active power in watts, when the socket meters it.
    pub fn power(&self) -> Result<Option<f64>, CoreError> {
        let device = self.device()?;
        Ok(reported_number(&device, KEY_POWER))
    }
}

/// Reported-state numeric reader. Firmware variants report whole-number
/// readings as integers, so both encodings are accepted.
#[allow(clippy::cast_precision_loss)]
fn reported_number(device: &Device, key: &str) -> Option<f64> {
    let entry = device.reported(key)?;
    entry
        .as_float()
        .or_else(|| entry.as_integer().map(|i| i as f64))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn socket() -> Device {
        serde_json::from_value(json!({
            "id": "socket-1",
            "name": {"name": "Heater plug"},
            "image_set_type": "dt_socket_sber",
            "desired_state": [
                {"key": "on_off", "bool_value": true}
            ],
            "reported_state": [
                {"key": "voltage", "float_value": 231.4},
                {"key": "current", "float_value": 0.87},
                {"key": "power", "integer_value": 200}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn telemetry_reads_floats() {
        let device = socket();
        assert_eq!(reported_number(&device, "voltage"), Some(231.4));
        assert_eq!(reported_number(&device, "current"), Some(0.87));
    }

    #[test]
    fn telemetry_accepts_integer_encoded_readings() {
        assert_eq!(reported_number(&socket(), "power"), Some(200.0));
    }

    #[test]
    fn telemetry_is_none_when_not_metered() {
        let mut device = socket();
        device.reported_state.clear();
        assert_eq!(reported_number(&device, "voltage"), None);
    }
}
