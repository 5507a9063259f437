// ── Home abstraction ──
//
// The single owner of the gateway client and the device cache. Capability
// facades and device handles hold clones of `Home`, never their own copy
// of device data, so every reader observes the same cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use sberhome_api::models::{Device, StateEntry};
use sberhome_api::{GatewayClient, TokenProvider};

use crate::device::DeviceHandle;
use crate::error::CoreError;
use crate::store::{DeviceStore, flatten_tree};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. The cache starts empty; call
/// [`update_devices_cache`](Self::update_devices_cache) at least once
/// before reading.
pub struct Home<P: TokenProvider> {
    inner: Arc<HomeInner<P>>,
}

struct HomeInner<P: TokenProvider> {
    gateway: GatewayClient<P>,
    store: DeviceStore,
}

impl<P: TokenProvider> Clone for Home<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: TokenProvider> Home<P> {
    pub fn new(gateway: GatewayClient<P>) -> Self {
        Self {
            inner: Arc::new(HomeInner {
                gateway,
                store: DeviceStore::new(),
            }),
        }
    }

    /// The underlying device cache.
    pub fn store(&self) -> &DeviceStore {
        &self.inner.store
    }

    /// A handle bound to one device id.
    pub fn device(&self, id: impl Into<String>) -> DeviceHandle<P> {
        DeviceHandle::new(self.clone(), id.into())
    }

    // ── Cache lifecycle ──────────────────────────────────────────────

    /// Refetch the full inventory tree and replace the cache wholesale.
    pub async fn update_devices_cache(&self) -> Result<(), CoreError> {
        let tree = self.inner.gateway.device_tree().await?;
        let devices = flatten_tree(tree);
        debug!(devices = devices.len(), "device cache refreshed");
        self.inner.store.replace_all(devices);
        Ok(())
    }

    /// Snapshot of all cached devices, keyed by id. Superseded (not
    /// mutated) by a later refresh.
    pub fn get_cached_devices(&self) -> HashMap<String, Arc<Device>> {
        self.inner.store.snapshot()
    }

    /// Look up one cached device by id.
    pub fn get_cached_device(&self, id: &str) -> Result<Arc<Device>, CoreError> {
        self.inner
            .store
            .get(id)
            .ok_or_else(|| CoreError::DeviceNotFound { id: id.to_owned() })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Push desired-state entries to a device, then merge them into the
    /// local cache so subsequent reads reflect the command without a
    /// refetch. The cache is left untouched when the gateway rejects the
    /// write.
    pub async fn set_device_state(&self, id: &str, entries: &[StateEntry]) -> Result<(), CoreError> {
        self.inner.gateway.set_device_state(id, entries).await?;
        self.inner.store.merge_desired_state(id, entries);
        Ok(())
    }
}
