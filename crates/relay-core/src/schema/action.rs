//! Action schema for the relayed pipeline

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name of the boolean marker field that flags an action for distribution.
pub const GLOBAL_MARKER: &str = "global";

/// Name of the discriminant field on the wire.
pub const KIND_FIELD: &str = "type";

/// An application state-update message.
///
/// Only the discriminant and the global marker are interpreted; every other
/// field is carried verbatim in `fields` so payloads survive the process
/// boundary unchanged. A `type` that is not a string or a `global` that is
/// not a bool is not interpreted either: it stays in `fields` and travels on
/// as ordinary payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Action {
    /// Discriminant (`type` on the wire). `None` only for malformed payloads.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Request for distribution to every other process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,

    /// Set by the reception listener; never serialized.
    ///
    /// An action carrying this flag arrived from another process and must not
    /// be sent again.
    #[serde(skip)]
    pub distributed: bool,

    /// Remaining payload fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Action::from_fields)
    }
}

/// Remove `key` from `fields` only if `extract` accepts its value.
fn take_typed<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key).and_then(extract)?;
    fields.shift_remove(key);
    Some(value)
}

impl Action {
    /// Build an action from a raw JSON object.
    ///
    /// Never fails: ill-typed `type` or `global` values are left in `fields`.
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        let kind = take_typed(&mut fields, KIND_FIELD, |v| v.as_str().map(str::to_owned));
        let global = take_typed(&mut fields, GLOBAL_MARKER, Value::as_bool);
        Self {
            kind,
            global,
            distributed: false,
            fields,
        }
    }

    /// Create a local action of the given kind with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            global: None,
            distributed: false,
            fields: Map::new(),
        }
    }

    /// Builder: attach a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder: set the global marker.
    pub fn global(mut self) -> Self {
        self.global = Some(true);
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Display name for logs and errors.
    pub fn label(&self) -> &str {
        self.kind().unwrap_or("<untyped>")
    }

    /// Whether the global marker is present and set to `true`.
    pub fn has_global_marker(&self) -> bool {
        self.global == Some(true)
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }

    /// Copy sent over the channel: global marker stripped, distributed clear.
    pub fn to_wire(&self) -> Action {
        Action {
            kind: self.kind.clone(),
            global: None,
            distributed: false,
            fields: self.fields.clone(),
        }
    }

    /// Form injected into a receiving pipeline.
    pub fn into_received(mut self) -> Action {
        self.global = None;
        self.distributed = true;
        self
    }

    /// The action with every marker cleared, for comparing payloads.
    pub fn without_markers(&self) -> Action {
        self.to_wire()
    }
}
