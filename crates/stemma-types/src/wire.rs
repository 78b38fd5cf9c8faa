//! Wire types exchanged with the remote web API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of one record mutation inside a transaction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Add,
    Update,
    Delete,
}

/// One record mutation inside a transaction payload.
///
/// Serializes to `{"type", "handle", "_class", "old", "new"}` as consumed by
/// the remote transaction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub handle: String,
    #[serde(rename = "_class")]
    pub class: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// State of a server-side background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Received,
    Started,
    Retry,
    Progress,
    Success,
    Failure,
    Revoked,
    /// Forward compatibility with states this client does not know.
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure | TaskState::Revoked)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskState::Pending => "PENDING",
            TaskState::Received => "RECEIVED",
            TaskState::Started => "STARTED",
            TaskState::Retry => "RETRY",
            TaskState::Progress => "PROGRESS",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
            TaskState::Revoked => "REVOKED",
            TaskState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Reference to a background task, returned by a 202 response as
/// `{"task": {"id": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTask {
    pub id: String,
}

/// Polled status of a background task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    /// Free-form result object; `result_object.progress` is read best-effort.
    #[serde(default)]
    pub result_object: Option<Value>,
    /// Server-provided error detail for failed tasks.
    #[serde(default)]
    pub info: Option<String>,
}

impl TaskStatus {
    /// Best-effort progress fraction; negative when absent or malformed.
    pub fn progress(&self) -> f64 {
        self.result_object
            .as_ref()
            .and_then(|o| o.get("progress"))
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite())
            .unwrap_or(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_uses_wire_field_names() {
        let entry = TransactionEntry {
            kind: EntryKind::Update,
            handle: "h1".into(),
            class: "Person".into(),
            old: Some(json!({"a": 1})),
            new: Some(json!({"a": 2})),
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["type"], "update");
        assert_eq!(v["_class"], "Person");
        assert_eq!(v["old"]["a"], 1);
        assert_eq!(v["new"]["a"], 2);
    }

    #[test]
    fn unknown_task_state_deserializes() {
        let status: TaskStatus = serde_json::from_value(json!({"state": "FROZEN"})).unwrap();
        assert_eq!(status.state, TaskState::Unknown);
        assert!(!status.state.is_terminal());
    }

    #[test]
    fn progress_falls_back_when_malformed() {
        let status: TaskStatus = serde_json::from_value(json!({
            "state": "PROGRESS",
            "result_object": {"progress": "half"}
        }))
        .unwrap();
        assert!(status.progress() < 0.0);

        let status: TaskStatus = serde_json::from_value(json!({
            "state": "PROGRESS",
            "result_object": {"progress": 0.25}
        }))
        .unwrap();
        assert_eq!(status.progress(), 0.25);
    }
}
