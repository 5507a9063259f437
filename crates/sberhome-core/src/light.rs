// ── Light capability ──
//
// Semantic light facade over a device handle: on/off, 0..255 brightness,
// Kelvin colour temperature, and hue/saturation colour, all converted
// between the standard ranges and the device's native ranges.
//
// The bulb firmware is modal: `light_mode` selects "white" (brightness +
// colour temperature drive the output) or "colour" (the h/s/v triple
// drives it). Which conversions are meaningful at a given moment depends
// on that mode, so every write that touches a mode-specific attribute
// also pins `light_mode`.

use std::sync::Arc;

use sberhome_api::TokenProvider;
use sberhome_api::models::{AttributeDescriptor, Device, HsvValue, StateEntry};

use crate::device::DeviceHandle;
use crate::error::CoreError;
use crate::scale::{
    BRIGHTNESS_RANGE, COLOR_TEMP_RANGE, HUE_RANGE, SATURATION_RANGE, brightness_to_value,
    scale_ranged, value_to_brightness,
};

const KEY_ON_OFF: &str = "on_off";
const KEY_MODE: &str = "light_mode";
const KEY_BRIGHTNESS: &str = "light_brightness";
const KEY_COLOUR_TEMP: &str = "light_colour_temp";
const KEY_COLOUR: &str = "light_colour";

const MODE_WHITE: &str = "white";
const MODE_COLOUR: &str = "colour";

/// Which output stage currently drives the bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Brightness + colour temperature.
    White,
    /// The h/s/v triple.
    Colour,
    /// `light_mode` missing or carrying an unrecognized value.
    Unknown,
}

/// Which semantic controls the device advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SupportedColorModes {
    pub brightness: bool,
    pub color_temp: bool,
    pub white: bool,
    pub hs: bool,
}

/// A turn-on command. Unset fields leave the corresponding device
/// attribute alone; `white` forces white mode with the given brightness
/// even when the bulb is currently in colour mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnOn {
    /// Target brightness, standard 0..255.
    pub brightness: Option<i64>,
    /// White-mode brightness, standard 0..255.
    pub white: Option<i64>,
    /// Colour temperature in Kelvin.
    pub color_temp_kelvin: Option<i64>,
    /// Hue (0..360) and saturation (0..100).
    pub hs: Option<(i64, i64)>,
}

/// Semantic light facade bound to one cached device.
pub struct Light<P: TokenProvider> {
    handle: DeviceHandle<P>,
}

impl<P: TokenProvider> Light<P> {
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

    pub fn supported_color_modes(&self) -> Result<SupportedColorModes, CoreError> {
        let device = self.device()?;
        Ok(supported_modes_of(&device))
    }

    pub fn color_mode(&self) -> Result<ColorMode, CoreError> {
        let device = self.device()?;
        Ok(color_mode_of(&device))
    }

    /// Current brightness on the standard 0..255 scale, or `None` when
    /// the device has no brightness control. In colour mode this reads
    /// the colour value channel.
    pub fn brightness(&self) -> Result<Option<i64>, CoreError> {
        let device = self.device()?;
        brightness_of(&device)
    }

    /// Current colour temperature in Kelvin, or `None` when unsupported.
    pub fn color_temp_kelvin(&self) -> Result<Option<i64>, CoreError> {
        let device = self.device()?;
        color_temp_kelvin_of(&device)
    }

    /// Current hue/saturation on the standard scales, or `None` when the
    /// bulb has no colour support.
    pub fn hs_color(&self) -> Result<Option<(i64, i64)>, CoreError> {
        let device = self.device()?;
        hs_color_of(&device)
    }

    /// Turn the light on, applying any requested brightness / colour
    /// temperature / colour in a single atomic gateway write.
    pub async fn turn_on(&self, request: TurnOn) -> Result<(), CoreError> {
        let device = self.device()?;
        let states = build_turn_on_states(&device, request)?;
        self.handle.set_states(&states).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        self.handle.set_on_off(false).await
    }
}

// ── Pure device-level logic ──────────────────────────────────────────

pub(crate) fn color_mode_of(device: &Device) -> ColorMode {
    match device.state(KEY_MODE).and_then(StateEntry::as_enum) {
        Some(MODE_WHITE) => ColorMode::White,
        Some(MODE_COLOUR) => ColorMode::Colour,
        _ => ColorMode::Unknown,
    }
}

pub(crate) fn supported_modes_of(device: &Device) -> SupportedColorModes {
    let mode_values = device
        .attribute(KEY_MODE)
        .and_then(|a| a.enum_values().map(<[String]>::to_vec))
        .unwrap_or_default();

    SupportedColorModes {
        brightness: device.attribute(KEY_BRIGHTNESS).is_some(),
        color_temp: device.attribute(KEY_COLOUR_TEMP).is_some(),
        white: mode_values.iter().any(|v| v == MODE_WHITE),
        hs: mode_values.iter().any(|v| v == MODE_COLOUR),
    }
}

fn int_range_of(device: &Device, key: &str) -> Result<(i64, i64), CoreError> {
    device
        .attribute(key)
        .and_then(AttributeDescriptor::int_range)
        .ok_or_else(|| CoreError::AttributeNotFound { key: key.into() })
}

/// Per-channel colour sub-ranges as `(h, s, v)` pairs.
fn color_ranges_of(device: &Device) -> Result<((i64, i64), (i64, i64), (i64, i64)), CoreError> {
    let ranges = device
        .attribute(KEY_COLOUR)
        .and_then(|a| a.color_ranges().cloned())
        .ok_or_else(|| CoreError::AttributeNotFound {
            key: KEY_COLOUR.into(),
        })?;
    Ok((
        (ranges.h.min, ranges.h.max),
        (ranges.s.min, ranges.s.max),
        (ranges.v.min, ranges.v.max),
    ))
}

fn colour_state_of(device: &Device) -> Result<HsvValue, CoreError> {
    device
        .state(KEY_COLOUR)
        .and_then(|e| e.as_color().copied())
        .ok_or_else(|| CoreError::StateNotFound {
            key: KEY_COLOUR.into(),
        })
}

pub(crate) fn brightness_of(device: &Device) -> Result<Option<i64>, CoreError> {
    if !supported_modes_of(device).brightness {
        return Ok(None);
    }

    if color_mode_of(device) == ColorMode::Colour {
        let (_, _, v_range) = color_ranges_of(device)?;
        let v = colour_state_of(device)?.v;
        return Ok(Some(value_to_brightness(v_range, v)?));
    }

    let raw = device
        .state(KEY_BRIGHTNESS)
        .and_then(StateEntry::as_integer)
        .ok_or_else(|| CoreError::StateNotFound {
            key: KEY_BRIGHTNESS.into(),
        })?;
    let range = int_range_of(device, KEY_BRIGHTNESS)?;
    Ok(Some(value_to_brightness(range, raw)?))
}

pub(crate) fn color_temp_kelvin_of(device: &Device) -> Result<Option<i64>, CoreError> {
    if !supported_modes_of(device).color_temp {
        return Ok(None);
    }

    let raw = device
        .state(KEY_COLOUR_TEMP)
        .and_then(StateEntry::as_integer)
        .ok_or_else(|| CoreError::StateNotFound {
            key: KEY_COLOUR_TEMP.into(),
        })?;
    let range = int_range_of(device, KEY_COLOUR_TEMP)?;
    Ok(Some(scale_ranged(raw, range, COLOR_TEMP_RANGE)?))
}

pub(crate) fn hs_color_of(device: &Device) -> Result<Option<(i64, i64)>, CoreError> {
    if !supported_modes_of(device).hs {
        return Ok(None);
    }

    let (h_range, s_range, _) = color_ranges_of(device)?;
    let colour = colour_state_of(device)?;
    Ok(Some((
        scale_ranged(colour.h, h_range, HUE_RANGE)?,
        scale_ranged(colour.s, s_range, SATURATION_RANGE)?,
    )))
}

/// Assemble the desired-state entries for a turn-on command.
///
/// Always starts with `on_off = true`; each requested field appends the
/// mode pin plus the rescaled attribute values, in the same order the
/// gateway app sends them.
pub(crate) fn build_turn_on_states(
    device: &Device,
    request: TurnOn,
) -> Result<Vec<StateEntry>, CoreError> {
    let mode = color_mode_of(device);
    let mut states = vec![StateEntry::bool(KEY_ON_OFF, true)];

    // Brightness while in colour mode: the value channel carries it, and
    // the current colour must be re-sent alongside.
    if let (Some(brightness), ColorMode::Colour) = (request.brightness, mode) {
        let range = int_range_of(device, KEY_BRIGHTNESS)?;
        let (h_range, s_range, v_range) = color_ranges_of(device)?;
        let (h, s) = hs_color_of(device)?.ok_or_else(|| CoreError::StateNotFound {
            key: KEY_COLOUR.into(),
        })?;

        states.push(StateEntry::enumeration(KEY_MODE, MODE_COLOUR));
        states.push(StateEntry::integer(
            KEY_BRIGHTNESS,
            brightness_to_value(range, brightness)?,
        ));
        states.push(StateEntry::color(
            KEY_COLOUR,
            HsvValue {
                h: scale_ranged(h, HUE_RANGE, h_range)?,
                s: scale_ranged(s, SATURATION_RANGE, s_range)?,
                v: brightness_to_value(v_range, brightness)?,
            },
        ));
    }

    // White-mode brightness: requested explicitly, or implied when the
    // bulb is not in colour mode.
    let white_brightness = request.brightness.or(request.white);
    if mode != ColorMode::Colour || request.white.is_some() {
        if let Some(brightness) = white_brightness {
            let range = int_range_of(device, KEY_BRIGHTNESS)?;
            states.push(StateEntry::enumeration(KEY_MODE, MODE_WHITE));
            states.push(StateEntry::integer(
                KEY_BRIGHTNESS,
                brightness_to_value(range, brightness)?,
            ));
        }
    }

    if let Some(kelvin) = request.color_temp_kelvin {
        let range = int_range_of(device, KEY_COLOUR_TEMP)?;
        // Kelvin below the vendor-wide minimum maps negative; the device
        // range floor is the lowest it can do.
        let t = scale_ranged(kelvin, COLOR_TEMP_RANGE, range)?.max(0);

        states.push(StateEntry::enumeration(KEY_MODE, MODE_WHITE));
        states.push(StateEntry::integer(KEY_COLOUR_TEMP, t));
    }

    if let Some((h, s)) = request.hs {
        let (h_range, s_range, v_range) = color_ranges_of(device)?;
        let brightness = request
            .brightness
            .or(brightness_of(device)?)
            .unwrap_or(BRIGHTNESS_RANGE.1);

        states.push(StateEntry::enumeration(KEY_MODE, MODE_COLOUR));
        states.push(StateEntry::color(
            KEY_COLOUR,
            HsvValue {
                h: scale_ranged(h, HUE_RANGE, h_range)?,
                s: scale_ranged(s, SATURATION_RANGE, s_range)?,
                v: brightness_to_value(v_range, brightness)?,
            },
        ));
    }

    Ok(states)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    /// Full-featured bulb in white mode at native brightness 525 / temp 500.
    fn bulb() -> Device {
        serde_json::from_value(json!({
            "id": "lamp-1",
            "name": {"name": "Desk lamp"},
            "image_set_type": "bulb_e27",
            "attributes": [
                {"key": "on_off", "bool_values": {}},
                {"key": "light_brightness", "int_values": {"range": {"min": 50, "max": 1000}}},
                {"key": "light_colour_temp", "int_values": {"range": {"min": 0, "max": 1000}}},
                {"key": "light_mode", "enum_values": {"values": ["white", "colour"]}},
                {"key": "light_colour", "color_values": {
                    "h": {"min": 0, "max": 360},
                    "s": {"min": 0, "max": 1000},
                    "v": {"min": 50, "max": 1000}
                }}
            ],
            "desired_state": [
                {"key": "on_off", "bool_value": true},
                {"key": "light_mode", "enum_value": "white"},
                {"key": "light_brightness", "integer_value": 525},
                {"key": "light_colour_temp", "integer_value": 500},
                {"key": "light_colour", "color_value": {"h": 180, "s": 500, "v": 525}}
            ]
        }))
        .unwrap()
    }

    fn colour_bulb() -> Device {
        let mut device = bulb();
        if let Some(entry) = device
            .desired_state
            .iter_mut()
            .find(|e| e.key == "light_mode")
        {
            *entry = StateEntry::enumeration("light_mode", "colour");
        }
        device
    }

    #[test]
    fn mode_follows_light_mode_state() {
        assert_eq!(color_mode_of(&bulb()), ColorMode::White);
        assert_eq!(color_mode_of(&colour_bulb()), ColorMode::Colour);

        let mut stripped = bulb();
        stripped.desired_state.retain(|e| e.key != "light_mode");
        assert_eq!(color_mode_of(&stripped), ColorMode::Unknown);
    }

    #[test]
    fn supported_modes_follow_attributes() {
        let modes = supported_modes_of(&bulb());
        assert_eq!(
            modes,
            SupportedColorModes {
                brightness: true,
                color_temp: true,
                white: true,
                hs: true,
            }
        );

        let mut plain = bulb();
        plain.attributes.retain(|a| a.key == "on_off");
        assert_eq!(supported_modes_of(&plain), SupportedColorModes::default());
    }

    #[test]
    fn brightness_reads_white_channel_in_white_mode() {
        // ceil((525 - 50) * 255 / 950) = 128
        assert_eq!(brightness_of(&bulb()).unwrap(), Some(128));
    }

    #[test]
    fn brightness_reads_value_channel_in_colour_mode() {
        // Same native 525, but sourced from the colour value channel.
        assert_eq!(brightness_of(&colour_bulb()).unwrap(), Some(128));
    }

    #[test]
    fn color_temp_converts_to_kelvin() {
        // 2700 + 500 * 3800 / 1000 = 4600
        assert_eq!(color_temp_kelvin_of(&bulb()).unwrap(), Some(4600));
    }

    #[test]
    fn hs_color_converts_to_standard_ranges() {
        assert_eq!(hs_color_of(&bulb()).unwrap(), Some((180, 50)));
    }

    #[test]
    fn unsupported_capabilities_read_as_none() {
        let mut plain = bulb();
        plain.attributes.retain(|a| a.key == "on_off");
        assert_eq!(brightness_of(&plain).unwrap(), None);
        assert_eq!(color_temp_kelvin_of(&plain).unwrap(), None);
        assert_eq!(hs_color_of(&plain).unwrap(), None);
    }

    #[test]
    fn plain_turn_on_sends_only_on_off() {
        let states = build_turn_on_states(&bulb(), TurnOn::default()).unwrap();
        assert_eq!(states, vec![StateEntry::bool("on_off", true)]);
    }

    #[test]
    fn white_brightness_pins_white_mode() {
        let request = TurnOn {
            brightness: Some(128),
            ..TurnOn::default()
        };
        let states = build_turn_on_states(&bulb(), request).unwrap();
        assert_eq!(
            states,
            vec![
                StateEntry::bool("on_off", true),
                StateEntry::enumeration("light_mode", "white"),
                // ceil(50 + 128 * 950 / 255) = 527
                StateEntry::integer("light_brightness", 527),
            ]
        );
    }

    #[test]
    fn colour_mode_brightness_resends_current_colour() {
        let request = TurnOn {
            brightness: Some(128),
            ..TurnOn::default()
        };
        let states = build_turn_on_states(&colour_bulb(), request).unwrap();
        assert_eq!(
            states,
            vec![
                StateEntry::bool("on_off", true),
                StateEntry::enumeration("light_mode", "colour"),
                StateEntry::integer("light_brightness", 527),
                StateEntry::color(
                    "light_colour",
                    HsvValue {
                        h: 180,
                        s: 500,
                        v: 527,
                    }
                ),
            ]
        );
    }

    #[test]
    fn kelvin_request_scales_into_device_range() {
        let request = TurnOn {
            color_temp_kelvin: Some(4600),
            ..TurnOn::default()
        };
        let states = build_turn_on_states(&bulb(), request).unwrap();
        assert_eq!(
            states,
            vec![
                StateEntry::bool("on_off", true),
                StateEntry::enumeration("light_mode", "white"),
                StateEntry::integer("light_colour_temp", 500),
            ]
        );
    }

    #[test]
    fn kelvin_below_vendor_minimum_clamps_to_zero() {
        let request = TurnOn {
            color_temp_kelvin: Some(2000),
            ..TurnOn::default()
        };
        let states = build_turn_on_states(&bulb(), request).unwrap();
        assert_eq!(
            states[2],
            StateEntry::integer("light_colour_temp", 0)
        );
    }

    #[test]
    fn hs_request_scales_channels_and_keeps_brightness() {
        let request = TurnOn {
            hs: Some((90, 25)),
            ..TurnOn::default()
        };
        let states = build_turn_on_states(&bulb(), request).unwrap();
        assert_eq!(
            states,
            vec![
                StateEntry::bool("on_off", true),
                StateEntry::enumeration("light_mode", "colour"),
                StateEntry::color(
                    "light_colour",
                    HsvValue {
                        h: 90,
                        s: 250,
                        // current brightness 128 -> native value channel
                        v: 527,
                    }
                ),
            ]
        );
    }
}
