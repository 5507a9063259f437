// sberhome-core: Cached device layer between sberhome-api and consumers.

pub mod device;
pub mod error;
pub mod home;
pub mod light;
pub mod scale;
pub mod store;
pub mod switch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use device::DeviceHandle;
pub use error::CoreError;
pub use home::Home;
pub use light::{ColorMode, Light, SupportedColorModes, TurnOn};
pub use scale::{
    BRIGHTNESS_RANGE, COLOR_TEMP_RANGE, HUE_RANGE, SATURATION_RANGE, brightness_to_value,
    scale_ranged, value_to_brightness,
};
pub use store::{DeviceStore, flatten_tree};
pub use switch::Switch;

// Wire types surface directly in this crate's API; re-export the crates
// consumers need to name them.
pub use sberhome_api;
