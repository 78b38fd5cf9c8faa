//! Versioned genealogical records and their natural keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Genealogical object classes tracked by both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Person,
    Family,
    Event,
    Place,
    Citation,
    Source,
    Repository,
    Media,
    Note,
    Tag,
}

impl RecordType {
    /// All record types, in the order they are diffed.
    pub const ALL: [RecordType; 10] = [
        RecordType::Person,
        RecordType::Family,
        RecordType::Event,
        RecordType::Place,
        RecordType::Citation,
        RecordType::Source,
        RecordType::Repository,
        RecordType::Media,
        RecordType::Note,
        RecordType::Tag,
    ];

    /// Wire-level class name used in transaction payloads.
    pub fn class_name(&self) -> &'static str {
        match self {
            RecordType::Person => "Person",
            RecordType::Family => "Family",
            RecordType::Event => "Event",
            RecordType::Place => "Place",
            RecordType::Citation => "Citation",
            RecordType::Source => "Source",
            RecordType::Repository => "Repository",
            RecordType::Media => "Media",
            RecordType::Note => "Note",
            RecordType::Tag => "Tag",
        }
    }

    /// Reverse lookup of [`class_name`](Self::class_name). Returns `None` for
    /// reference-only relation classes that are not primary records.
    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.class_name() == name)
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Natural key of a record within one store: `(handle, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub handle: String,
    pub kind: RecordType,
}

impl RecordKey {
    pub fn new(handle: impl Into<String>, kind: RecordType) -> Self {
        Self { handle: handle.into(), kind }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.handle)
    }
}

/// A versioned entity owned by whichever store currently holds it.
///
/// Two records are compared by payload equality during diffing, never by
/// identity; `gramps_id` is the store-local identifier and is cleared from
/// the incoming copy before a merge so the surviving identifier is always
/// the base record's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub handle: String,
    pub kind: RecordType,
    /// Store-local identifier (user-visible ID, not the handle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gramps_id: Option<String>,
    /// Last-changed timestamp, seconds since epoch.
    pub change: i64,
    /// Implementation-defined payload; opaque to the sync engine.
    pub data: Value,
}

impl Record {
    pub fn new(handle: impl Into<String>, kind: RecordType, change: i64, data: Value) -> Self {
        Self { handle: handle.into(), kind, gramps_id: None, change, data }
    }

    pub fn with_gramps_id(mut self, id: impl Into<String>) -> Self {
        self.gramps_id = Some(id.into());
        self
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.handle.clone(), self.kind)
    }

    /// Payload equality, the comparison used by the diff engine.
    pub fn same_payload(&self, other: &Record) -> bool {
        self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn class_name_round_trips() {
        for kind in RecordType::ALL {
            assert_eq!(RecordType::from_class_name(kind.class_name()), Some(kind));
        }
        assert_eq!(RecordType::from_class_name("PersonRef"), None);
    }

    #[test]
    fn payload_equality_ignores_change_and_id() {
        let a = Record::new("h1", RecordType::Person, 100, json!({"name": "Ada"}));
        let mut b = Record::new("h1", RecordType::Person, 200, json!({"name": "Ada"}));
        b.gramps_id = Some("I0001".into());
        assert!(a.same_payload(&b));
        assert_ne!(a, b);
    }
}
