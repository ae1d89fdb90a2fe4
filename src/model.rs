//! Schema-store records: classes, properties, instances and graph edges.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RdfClass {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
        }
    }
}

/// How a property's values are interpreted.
///
/// `Plain` properties hold terminal scalars until an instance-valued value
/// promotes them to `Instance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Plain,
    Abstract,
    Instance,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Plain => "plain",
            PropertyKind::Abstract => "abstract",
            PropertyKind::Instance => "instance",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(PropertyKind::Plain),
            "abstract" => Ok(PropertyKind::Abstract),
            "instance" => Ok(PropertyKind::Instance),
            other => Err(format!("unknown property kind: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub class_name: String,
}

/// Object of a graph edge. Exactly one kind per edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EdgeValue {
    Class(String),
    Instance(String),
    Terminal(Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub subject: String,
    pub predicate: String,
    pub position: i32,
    pub value: EdgeValue,
    /// Set when the object instance was created as part of the subject's insert.
    #[serde(default)]
    pub owned: bool,
}

impl Edge {
    pub fn object_instance(&self) -> Option<&str> {
        match &self.value {
            EdgeValue::Instance(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// A persisted vocabulary document with its version counter.
#[derive(Clone, Debug, Serialize)]
pub struct StoredDocument {
    pub payload: Value,
    pub version: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
