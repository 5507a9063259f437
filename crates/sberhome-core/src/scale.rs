// ── Range scaling ──
//
// Devices report and accept values in vendor-defined integer ranges
// (brightness 50..1000, colour temperature 0..1000, per-device h/s/v
// sub-ranges). Consumers speak standard semantic ranges. Conversion is a
// plain affine map with ceiling rounding: when a standard percentage is
// converted into a device-native range, rounding down could under-drive
// the device, so we always round up.

use crate::error::CoreError;

/// Standard colour-temperature range in Kelvin. Vendor-wide constant;
/// the gateway does not expose per-device Kelvin bounds.
pub const COLOR_TEMP_RANGE: (i64, i64) = (2700, 6500);

/// Standard hue range in degrees.
pub const HUE_RANGE: (i64, i64) = (0, 360);

/// Standard saturation range in percent.
pub const SATURATION_RANGE: (i64, i64) = (0, 100);

/// Standard brightness range.
pub const BRIGHTNESS_RANGE: (i64, i64) = (0, 255);

/// Map `value` from the `from` range onto the `to` range, rounding up.
///
/// Fails with [`CoreError::InvalidRange`] when the source range is
/// degenerate (`min == max`) instead of propagating a division by zero.
pub fn scale_ranged(value: i64, from: (i64, i64), to: (i64, i64)) -> Result<i64, CoreError> {
    let (from_min, from_max) = from;
    if from_min == from_max {
        return Err(CoreError::InvalidRange {
            min: from_min,
            max: from_max,
        });
    }
    let (to_min, to_max) = to;

    #[allow(clippy::cast_precision_loss)]
    let scaled = to_min as f64
        + (value - from_min) as f64 * (to_max - to_min) as f64 / (from_max - from_min) as f64;

    #[allow(clippy::cast_possible_truncation)]
    Ok(scaled.ceil() as i64)
}

/// Convert a device-native value into standard 0..255 brightness.
pub fn value_to_brightness(range: (i64, i64), value: i64) -> Result<i64, CoreError> {
    scale_ranged(value, range, BRIGHTNESS_RANGE)
}

/// Convert standard 0..255 brightness into a device-native value.
pub fn brightness_to_value(range: (i64, i64), brightness: i64) -> Result<i64, CoreError> {
    scale_ranged(brightness, BRIGHTNESS_RANGE, range)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn scales_with_ceiling_rounding() {
        // ceil(128 * 100 / 255) = 51, not 50.
        assert_eq!(scale_ranged(128, (0, 255), (0, 100)).unwrap(), 51);
    }

    #[test]
    fn maps_endpoints_exactly() {
        assert_eq!(scale_ranged(2700, COLOR_TEMP_RANGE, (0, 1000)).unwrap(), 0);
        assert_eq!(
            scale_ranged(6500, COLOR_TEMP_RANGE, (0, 1000)).unwrap(),
            1000
        );
        assert_eq!(scale_ranged(0, (0, 360), (0, 360)).unwrap(), 0);
    }

    #[test]
    fn handles_offset_source_ranges() {
        // Vendor brightness ranges often start above zero.
        assert_eq!(scale_ranged(50, (50, 1000), (0, 255)).unwrap(), 0);
        assert_eq!(scale_ranged(1000, (50, 1000), (0, 255)).unwrap(), 255);
    }

    #[test]
    fn round_trip_into_finer_range_stays_within_one_unit() {
        for v in 0..=255 {
            let native = scale_ranged(v, BRIGHTNESS_RANGE, (0, 1000)).unwrap();
            let back = scale_ranged(native, (0, 1000), BRIGHTNESS_RANGE).unwrap();
            assert!(
                (back - v).abs() <= 1,
                "round trip drifted: {v} -> {native} -> {back}"
            );
        }
    }

    #[test]
    fn degenerate_source_range_is_rejected() {
        let err = scale_ranged(5, (7, 7), (0, 100)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { min: 7, max: 7 }));
    }

    #[test]
    fn brightness_helpers_invert_each_other_at_endpoints() {
        let range = (50, 1000);
        assert_eq!(value_to_brightness(range, 1000).unwrap(), 255);
        assert_eq!(brightness_to_value(range, 255).unwrap(), 1000);
        assert_eq!(brightness_to_value(range, 0).unwrap(), 50);
    }

    #[test]
    fn kelvin_below_device_minimum_can_go_negative() {
        // Callers clamp to the device range floor; the map itself is pure.
        let t = scale_ranged(2000, COLOR_TEMP_RANGE, (0, 1000)).unwrap();
        assert!(t < 0);
    }
}
