// ============================================================================
// Policy Instance State
// ============================================================================
//
// One durable record per managed index. The engine mutates it on every tick
// and the store persists it as a single upsert; the document form below is
// the wire shape and must round-trip to an equal value.

use crate::core::LifecycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance status.
///
/// ```text
/// RUNNING ──delete action succeeds──> DELETED
/// ```
///
/// The transition is one-way; a DELETED instance ignores further ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "DELETED")]
    Deleted,
}

impl Status {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Status::Deleted)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Running => write!(f, "RUNNING"),
            Status::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Recorded failure, kept as a plain kind/message pair so the document form
/// stays stable across error type changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(error: &LifecycleError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of the most recently executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepState {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl StepState {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        attempt: u32,
        error: Option<ErrorInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            attempt,
            error,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of the most recently executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionState {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ActionState {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        attempt: u32,
        error: Option<ErrorInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            attempt,
            error,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of the most recently evaluated condition. `result` is absent when
/// evaluation failed before producing a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionState {
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ConditionState {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        result: Option<bool>,
        error: Option<ErrorInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time,
            result,
            error,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Durable progress record of a policy bound to one index.
///
/// `current_step` is `None` before the first tick and again after the final
/// step completed; in between it always names a step of the bound policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyInstanceState {
    pub policy_name: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_step: Option<StepState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_action: Option<ActionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_condition: Option<ConditionState>,
}

impl PolicyInstanceState {
    pub fn new(policy_name: impl Into<String>) -> Self {
        Self {
            policy_name: policy_name.into(),
            status: Status::Running,
            current_step: None,
            snapshot_name: None,
            last_executed_step: None,
            last_executed_action: None,
            last_executed_condition: None,
        }
    }

    /// True before the very first tick ran anything.
    pub fn is_fresh(&self) -> bool {
        self.current_step.is_none() && self.last_executed_step.is_none()
    }

    /// True once the final step completed and no further progression is
    /// expected.
    pub fn is_complete(&self) -> bool {
        self.current_step.is_none() && self.last_executed_step.is_some()
    }

    pub fn to_doc(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("state serialization cannot fail")
    }

    pub fn from_doc(doc: &serde_json::Value) -> crate::core::Result<Self> {
        serde_json::from_value(doc.clone())
            .map_err(|e| LifecycleError::Store(format!("malformed state document: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LifecycleError;

    fn sample_states() -> Vec<PolicyInstanceState> {
        let now = Utc::now();
        let failed = ErrorInfo::from_error(&LifecycleError::ActionExecution(
            "rollover".into(),
            "alias missing".into(),
        ));
        let mut deleted = PolicyInstanceState::new("retention");
        deleted.status = Status::Deleted;
        deleted.last_executed_step = Some(StepState::new("delete", now, 0, None));
        deleted.last_executed_action = Some(ActionState::new("delete", now, 1, None));

        let mut mid_flight = PolicyInstanceState::new("retention");
        mid_flight.current_step = Some("rollover".into());
        mid_flight.snapshot_name = Some("hot-2d9f".into());
        mid_flight.last_executed_step = Some(StepState::new("rollover", now, 2, Some(failed.clone())));
        mid_flight.last_executed_action = Some(ActionState::new("rollover", now, 2, Some(failed)));
        mid_flight.last_executed_condition =
            Some(ConditionState::new("size", now, Some(true), None));

        vec![PolicyInstanceState::new("retention"), deleted, mid_flight]
    }

    #[test]
    fn test_doc_round_trip() {
        for state in sample_states() {
            let doc = state.to_doc();
            let parsed = PolicyInstanceState::from_doc(&doc).unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_wire_field_names() {
        let mut state = PolicyInstanceState::new("retention");
        state.current_step = Some("rollover".into());
        state.last_executed_condition =
            Some(ConditionState::new("size", Utc::now(), Some(false), None));

        let doc = state.to_doc();
        assert_eq!(doc["policy_name"], "retention");
        assert_eq!(doc["status"], "RUNNING");
        assert_eq!(doc["current_step"], "rollover");
        assert_eq!(doc["last_executed_condition"]["name"], "size");
        assert_eq!(doc["last_executed_condition"]["result"], false);
        // Absent optionals stay off the wire entirely.
        assert!(doc.get("snapshot_name").is_none());
        assert!(doc.get("last_executed_action").is_none());
    }

    #[test]
    fn test_fresh_vs_complete() {
        let mut state = PolicyInstanceState::new("retention");
        assert!(state.is_fresh());
        assert!(!state.is_complete());

        state.last_executed_step = Some(StepState::new("delete", Utc::now(), 0, None));
        assert!(!state.is_fresh());
        assert!(state.is_complete());

        state.current_step = Some("delete".into());
        assert!(!state.is_fresh());
        assert!(!state.is_complete());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let doc = serde_json::json!({
            "policy_name": "retention",
            "status": "RUNNING",
            "stray": true,
        });
        assert!(PolicyInstanceState::from_doc(&doc).is_err());
    }
}
