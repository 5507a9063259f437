// Gateway wire types
//
// Models for the SberDevices gateway JSON API. The device inventory comes
// back as a recursive group tree; attribute state is a loosely keyed
// key/value list on the wire, decoded here into a closed set of typed
// variants so the rest of the system never touches raw JSON. Fields use
// `#[serde(default)]` liberally because the API is inconsistent about
// field presence across device firmware revisions.

use serde::{Deserialize, Serialize};

// ── Envelopes ────────────────────────────────────────────────────────

/// `GET /device_groups/tree` wraps its payload: `{ "result": { ... } }`.
#[derive(Debug, Deserialize)]
pub struct TreeEnvelope {
    pub result: DeviceTree,
}

/// Error body shape for non-success responses: `{ "code": N, "message": "..." }`.
#[derive(Debug, Deserialize)]
pub struct GatewayFault {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

// ── Device tree ──────────────────────────────────────────────────────

/// One node of the vendor's hierarchical device grouping.
///
/// A node carries its directly attached devices plus child groups,
/// recursively. The tree is acyclic by construction; the shape carries no
/// meaning for this integration and is flattened away by `sberhome-core`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceTree {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub children: Vec<DeviceTree>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Full device object from the inventory tree.
///
/// The gateway can return dozens of fields per device. We model the ones
/// the integration needs explicitly; everything else lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: DeviceName,
    #[serde(default)]
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
    /// Vendor UI asset class, e.g. `"bulb"` or `"dt_socket_sber"`.
    /// The only reliable device-kind discriminator the API exposes.
    #[serde(default)]
    pub image_set_type: Option<String>,
    /// Static capability descriptors (read-only for the cache's lifetime).
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
    /// Last commanded values, keyed by attribute name.
    #[serde(default)]
    pub desired_state: Vec<StateEntry>,
    /// Device-observed telemetry (voltage, current, power, ...).
    #[serde(default)]
    pub reported_state: Vec<StateEntry>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Device {
    /// Human-readable display name.
    pub fn display_name(&self) -> &str {
        &self.name.name
    }

    /// Whether the device presents as a light bulb.
    pub fn is_light(&self) -> bool {
        self.image_set_type
            .as_deref()
            .is_some_and(|t| t.contains("bulb"))
    }

    /// Whether the device presents as a smart socket.
    pub fn is_socket(&self) -> bool {
        self.image_set_type
            .as_deref()
            .is_some_and(|t| t.contains("dt_socket_sber"))
    }

    /// Find a desired-state entry by key.
    pub fn state(&self, key: &str) -> Option<&StateEntry> {
        self.desired_state.iter().find(|e| e.key == key)
    }

    /// Find a reported-state (telemetry) entry by key.
    pub fn reported(&self, key: &str) -> Option<&StateEntry> {
        self.reported_state.iter().find(|e| e.key == key)
    }

    /// Find a capability descriptor by key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.key == key)
    }
}

/// The gateway nests the display name: `{"name": {"name": "..."}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceName {
    #[serde(default)]
    pub name: String,
}

/// Manufacturer metadata block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

// ── State entries ────────────────────────────────────────────────────

/// One desired- or reported-state entry: a key plus exactly one typed value.
///
/// On the wire the value lives in a type-named sibling field
/// (`bool_value`, `integer_value`, ...), flattened here into [`StateValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: String,
    #[serde(flatten)]
    pub value: StateValue,
}

impl StateEntry {
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value: StateValue::Bool { bool_value: value },
        }
    }

    pub fn integer(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: StateValue::Integer {
                integer_value: value,
            },
        }
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: StateValue::Float { float_value: value },
        }
    }

    pub fn enumeration(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: StateValue::Enum {
                enum_value: value.into(),
            },
        }
    }

    pub fn color(key: impl Into<String>, value: HsvValue) -> Self {
        Self {
            key: key.into(),
            value: StateValue::Color { color_value: value },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            StateValue::Bool { bool_value } => Some(bool_value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            StateValue::Integer { integer_value } => Some(integer_value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            StateValue::Float { float_value } => Some(float_value),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match &self.value {
            StateValue::Enum { enum_value } => Some(enum_value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&HsvValue> {
        match &self.value {
            StateValue::Color { color_value } => Some(color_value),
            _ => None,
        }
    }
}

/// The closed set of value payloads a state entry can carry.
///
/// Untagged: the wire discriminates by field name, not a type tag.
/// `Integer` is listed before `Float` so whole numbers keep their type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool { bool_value: bool },
    Integer { integer_value: i64 },
    Float { float_value: f64 },
    Enum { enum_value: String },
    Color { color_value: HsvValue },
}

/// Composite colour value in the device's native h/s/v sub-ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvValue {
    pub h: i64,
    pub s: i64,
    pub v: i64,
}

// ── Attribute descriptors ────────────────────────────────────────────

/// Static capability metadata for one attribute key.
///
/// Immutable for the cache's lifetime; describes the value space a
/// desired-state entry with the same key may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub key: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    /// Integer value range `(min, max)`, if this is an integer attribute.
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match &self.kind {
            AttributeKind::Integer { int_values } => {
                Some((int_values.range.min, int_values.range.max))
            }
            _ => None,
        }
    }

    /// Allowed enum values, if this is an enum attribute.
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeKind::Enum { enum_values } => Some(&enum_values.values),
            _ => None,
        }
    }

    /// Per-channel colour sub-ranges, if this is a colour attribute.
    pub fn color_ranges(&self) -> Option<&ColorRanges> {
        match &self.kind {
            AttributeKind::Color { color_values } => Some(color_values),
            _ => None,
        }
    }
}

/// Descriptor payload, discriminated by field name on the wire.
///
/// `Other` soaks up attribute types the integration does not model so one
/// exotic device cannot fail the whole tree decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeKind {
    Integer { int_values: IntValues },
    Enum { enum_values: EnumValues },
    Color { color_values: ColorRanges },
    Float { float_values: FloatValues },
    Bool { bool_values: BoolValues },
    Other(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntValues {
    pub range: IntRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValues {
    #[serde(default)]
    pub values: Vec<String>,
}

/// Colour attribute metadata: independent ranges per h/s/v channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRanges {
    pub h: IntRange,
    pub s: IntRange,
    pub v: IntRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatValues {
    #[serde(default)]
    pub range: Option<FloatRange>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoolValues {}
