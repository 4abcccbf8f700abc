// ── Node and attribute wire types ──
//
// Every Hive entity (hub, thermostat, wall controller, radiator valve)
// is a flat `Node` carrying a bag of named `Attribute`s. Nodes are never
// mutated locally: the server's copy is re-fetched and replaced wholesale.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::null_as_default;
use crate::value::{FromValue, Typed, Value};

/// Attribute holding the node's schema URI.
pub const NODE_TYPE_ATTRIBUTE: &str = "nodeType";

/// One of the three value slots on an [`Attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Last value reported by the device.
    Reported,
    /// Value the apps display.
    Display,
    /// Pending value requested by a client.
    Target,
}

/// A named property of a node.
///
/// Any field may be absent; absence is kept distinct from a value of the
/// wrong type (see [`Typed`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<Value>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_received_time: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_changed_time: Option<i64>,
}

static EMPTY_ATTRIBUTE: Attribute = Attribute::EMPTY;

impl Attribute {
    /// An attribute with every field absent.
    pub const EMPTY: Self = Self {
        reported_value: None,
        display_value: None,
        target_value: None,
        report_received_time: None,
        report_changed_time: None,
    };

    /// An attribute carrying only a target value (mutation payloads).
    pub fn target(value: impl Into<Value>) -> Self {
        Self {
            target_value: Some(value.into()),
            ..Self::default()
        }
    }

    /// An attribute carrying only a reported value.
    pub fn reported(value: impl Into<Value>) -> Self {
        Self {
            reported_value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn value(&self, slot: Slot) -> Option<&Value> {
        match slot {
            Slot::Reported => self.reported_value.as_ref(),
            Slot::Display => self.display_value.as_ref(),
            Slot::Target => self.target_value.as_ref(),
        }
    }

    /// Extract a slot as `T`.
    pub fn get<T: FromValue>(&self, slot: Slot) -> Typed<T> {
        Typed::from_slot(self.value(slot))
    }

    pub fn reported_as<T: FromValue>(&self) -> Typed<T> {
        self.get(Slot::Reported)
    }

    pub fn display_as<T: FromValue>(&self) -> Typed<T> {
        self.get(Slot::Display)
    }

    pub fn target_as<T: FromValue>(&self) -> Typed<T> {
        self.get(Slot::Target)
    }

    /// `true` when every field is absent.
    pub fn is_empty(&self) -> bool {
        self == &Self::EMPTY
    }

    pub fn report_received_at(&self) -> Option<DateTime<Utc>> {
        self.report_received_time
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// A Hive node as returned by `/omnia/nodes`.
///
/// `href` is the node's addressable resource: it is what gets re-fetched
/// and what mutations are sent to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub href: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_id: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub attributes: HashMap<String, Attribute>,
    /// Passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<serde_json::Value>,
}

impl Node {
    /// A node carrying a single attribute and nothing else, used as the
    /// body of a mutation.
    pub fn partial(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            attributes: HashMap::from([(name.into(), attribute)]),
            ..Self::default()
        }
    }

    /// Look up an attribute. A missing attribute is normal for devices
    /// without that capability and yields an empty attribute.
    pub fn attr(&self, name: &str) -> &Attribute {
        self.attributes.get(name).unwrap_or(&EMPTY_ATTRIBUTE)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// The node's schema URI, from the `nodeType` attribute.
    pub fn node_type(&self) -> Result<&str, Error> {
        let Some(attr) = self.attributes.get(NODE_TYPE_ATTRIBUTE) else {
            return Err(Error::MissingNodeType.with_op("nodetype"));
        };

        match attr.reported_value.as_ref() {
            Some(Value::String(s)) => Ok(s),
            other => Err(Error::InvalidNodeType {
                found: other.map_or_else(|| "nothing".to_owned(), |v| v.kind().to_string()),
            }
            .with_op("nodetype")),
        }
    }

    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen.and_then(DateTime::from_timestamp_millis)
    }
}
