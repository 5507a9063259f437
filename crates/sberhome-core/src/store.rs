// ── Flattened device cache ──
//
// The gateway returns the inventory as a group tree, but consumers address
// devices by id. The tree shape carries no meaning for this integration,
// so it is reduced to a flat id -> device map on every refresh. Point
// lookups are O(1); a refresh replaces the whole map (no incremental
// diffing); desired-state writes are merged in place so local reads stay
// consistent without a round trip.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::trace;

use sberhome_api::models::{Device, DeviceTree, StateEntry};

/// Reduce a device tree to a flat `id -> Device` map.
///
/// Visits every node exactly once via an explicit stack (the tree is
/// acyclic by construction). Ids are unique across the tree per the
/// vendor contract; should a duplicate ever appear, the last visit wins.
pub fn flatten_tree(tree: DeviceTree) -> HashMap<String, Arc<Device>> {
    let mut map = HashMap::new();
    let mut stack = vec![tree];

    while let Some(node) = stack.pop() {
        for device in node.devices {
            map.insert(device.id.clone(), Arc::new(device));
        }
        stack.extend(node.children);
    }

    map
}

/// Thread-safe flat device cache.
///
/// Created empty, populated wholesale by [`replace_all`](Self::replace_all)
/// on each refresh, and torn down with the owning client. Holds no other
/// persisted state.
pub struct DeviceStore {
    devices: DashMap<String, Arc<Device>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DeviceStore {
    pub(crate) fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            devices: DashMap::new(),
            last_refresh,
        }
    }

    /// Replace the entire map with a fresh flatten result.
    pub(crate) fn replace_all(&self, devices: HashMap<String, Arc<Device>>) {
        self.devices.clear();
        for (id, device) in devices {
            self.devices.insert(id, device);
        }
        let _ = self.last_refresh.send(Some(Utc::now()));
    }

    /// Point lookup by device id.
    pub fn get(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Point-in-time snapshot of the whole map. A later refresh does not
    /// alter a snapshot already handed out.
    pub fn snapshot(&self) -> HashMap<String, Arc<Device>> {
        self.devices
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Overwrite existing desired-state entries with the just-sent values.
    ///
    /// For each entry whose key matches an existing `desired_state` entry
    /// on the target device, the value is replaced in place. Unmatched
    /// keys are silently ignored -- gateway writes only ever target
    /// pre-declared attributes. Purely a local cache update.
    pub fn merge_desired_state(&self, id: &str, entries: &[StateEntry]) {
        let Some(mut slot) = self.devices.get_mut(id) else {
            trace!(id, "merge skipped: device not cached");
            return;
        };
        let device = Arc::make_mut(slot.value_mut());
        for entry in entries {
            if let Some(existing) = device
                .desired_state
                .iter_mut()
                .find(|e| e.key == entry.key)
            {
                existing.value = entry.value.clone();
            }
        }
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> DeviceTree {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flatten_collects_devices_from_every_level() {
        let tree = tree(json!({
            "devices": [{"id": "a"}],
            "children": [{
                "devices": [{"id": "b"}],
                "children": []
            }]
        }));

        let map = flatten_tree(tree);

        assert_eq!(map.len(), 2);
        assert!(map.contains_key("a"));
        assert!(map.contains_key("b"));
    }

    #[test]
    fn flatten_handles_empty_groups_and_deep_nesting() {
        let tree = tree(json!({
            "devices": [],
            "children": [
                {"devices": [], "children": []},
                {
                    "devices": [{"id": "x"}, {"id": "y"}],
                    "children": [{
                        "devices": [],
                        "children": [{
                            "devices": [{"id": "z"}],
                            "children": []
                        }]
                    }]
                }
            ]
        }));

        let map = flatten_tree(tree);

        let mut ids: Vec<&str> = map.keys().map(String::as_str).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["x", "y", "z"]);
    }

    #[test]
    fn flatten_of_empty_tree_is_empty() {
        assert!(flatten_tree(DeviceTree::default()).is_empty());
    }

    #[test]
    fn merge_overwrites_only_matching_keys() {
        let store = DeviceStore::new();
        store.replace_all(flatten_tree(tree(json!({
            "devices": [{
                "id": "lamp-1",
                "desired_state": [
                    {"key": "on_off", "bool_value": false},
                    {"key": "light_brightness", "integer_value": 100}
                ]
            }],
            "children": []
        }))));

        store.merge_desired_state(
            "lamp-1",
            &[
                StateEntry::bool("on_off", true),
                StateEntry::integer("nonexistent", 5),
            ],
        );

        let device = store.get("lamp-1").unwrap();
        // Matched key updated in place.
        assert_eq!(device.state("on_off").and_then(StateEntry::as_bool), Some(true));
        // Sibling untouched, unmatched key ignored, length unchanged.
        assert_eq!(
            device
                .state("light_brightness")
                .and_then(StateEntry::as_integer),
            Some(100)
        );
        assert_eq!(device.desired_state.len(), 2);
    }

    #[test]
    fn merge_on_unknown_device_is_a_noop() {
        let store = DeviceStore::new();
        store.merge_desired_state("ghost", &[StateEntry::bool("on_off", true)]);
        assert!(store.is_empty());
    }

    #[test]
    fn replace_all_drops_stale_entries() {
        let store = DeviceStore::new();
        store.replace_all(flatten_tree(tree(json!({
            "devices": [{"id": "old"}], "children": []
        }))));
        store.replace_all(flatten_tree(tree(json!({
            "devices": [{"id": "new"}], "children": []
        }))));

        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());
        assert_eq!(store.len(), 1);
        assert!(store.last_refresh().is_some());
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let store = DeviceStore::new();
        store.replace_all(flatten_tree(tree(json!({
            "devices": [{"id": "a"}], "children": []
        }))));

        let snap = store.snapshot();
        store.replace_all(HashMap::new());

        assert_eq!(snap.len(), 1);
        assert!(store.is_empty());
    }
}
