use super::Condition;
use crate::backend::SnapshotState;
use crate::core::{LifecycleError, Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Polls the snapshot recorded in the instance state (started by a prior
/// snapshot action) until the repository reports it as successful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotCreatedCondition {
    pub repository: String,
}

impl SnapshotCreatedCondition {
    pub const TYPE: &'static str = "snapshot_created";

    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SnapshotCreatedCondition>(
        SnapshotCreatedCondition::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Condition for SnapshotCreatedCondition {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        _index: &str,
        ctx: &ExecutionContext,
        state: &PolicyInstanceState,
    ) -> Result<bool> {
        let snapshot = state.snapshot_name.as_deref().ok_or_else(|| {
            LifecycleError::ConditionEvaluation(
                Self::TYPE.to_string(),
                "no snapshot has been started for this index".to_string(),
            )
        })?;
        match ctx.backend.snapshot_state(snapshot, &self.repository).await? {
            SnapshotState::Success => Ok(true),
            SnapshotState::InProgress => Ok(false),
            SnapshotState::Failed => Err(LifecycleError::ConditionEvaluation(
                Self::TYPE.to_string(),
                format!(
                    "snapshot '{}' in repository '{}' failed",
                    snapshot, self.repository
                ),
            )),
        }
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
