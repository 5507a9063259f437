// Per-device facade over the shared cache.

use std::sync::Arc;

use sberhome_api::TokenProvider;
use sberhome_api::models::{AttributeDescriptor, Device, StateEntry};

use crate::error::CoreError;
use crate::home::Home;

/// Accessor bound to one device id.
///
/// Holds a [`Home`] clone rather than device data, so reads always hit
/// the current cache and writes go through the shared gateway client.
pub struct DeviceHandle<P: TokenProvider> {
    home: Home<P>,
    id: String,
}

impl<P: TokenProvider> Clone for DeviceHandle<P> {
    fn clone(&self) -> Self {
        Self {
            home: self.home.clone(),
            id: self.id.clone(),
        }
    }
}

impl<P: TokenProvider> DeviceHandle<P> {
    pub(crate) fn new(home: Home<P>, id: String) -> Self {
        Self { home, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current cached device. Fails when the cache was never
    /// populated or the device disappeared from the inventory.
    pub fn device(&self) -> Result<Arc<Device>, CoreError> {
        self.home.get_cached_device(&self.id)
    }

    /// Refresh the cache. Note: this refetches *all* devices, not just
    /// this one -- the gateway has no per-device inventory endpoint.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.home.update_devices_cache().await
    }

    // ── Typed lookups ────────────────────────────────────────────────
    // Absence is "capability not present on this device", not an error.

    /// Desired-state entry by key.
    pub fn state(&self, key: &str) -> Option<StateEntry> {
        self.device().ok()?.state(key).cloned()
    }

    /// Reported-state (telemetry) entry by key.
    pub fn reported(&self, key: &str) -> Option<StateEntry> {
        self.device().ok()?.reported(key).cloned()
    }

    /// Capability descriptor by key.
    pub fn attribute(&self, key: &str) -> Option<AttributeDescriptor> {
        self.device().ok()?.attribute(key).cloned()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Send a batch of desired-state entries; merges into the cache on
    /// success (see [`Home::set_device_state`]).
    pub async fn set_states(&self, entries: &[StateEntry]) -> Result<(), CoreError> {
        self.home.set_device_state(&self.id, entries).await
    }

    pub async fn set_state(&self, entry: StateEntry) -> Result<(), CoreError> {
        self.set_states(&[entry]).await
    }

    pub async fn set_bool(&self, key: &str, value: bool) -> Result<(), CoreError> {
        self.set_state(StateEntry::bool(key, value)).await
    }

    pub async fn set_integer(&self, key: &str, value: i64) -> Result<(), CoreError> {
        self.set_state(StateEntry::integer(key, value)).await
    }

    pub async fn set_on_off(&self, on: bool) -> Result<(), CoreError> {
        self.set_bool("on_off", on).await
    }
}
