use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Starts a snapshot of the index into `repository` and returns immediately.
///
/// The generated snapshot name (`<name_prefix>-<uuid>`) is recorded in the
/// instance state, which makes the action idempotent: a retry with a name
/// already recorded starts no second snapshot. Completion is observed by a
/// `snapshot_created` condition gating a later step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotAsyncAction {
    pub name_prefix: String,
    pub repository: String,
}

impl SnapshotAsyncAction {
    pub const TYPE: &'static str = "snapshot";

    pub fn new(name_prefix: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            repository: repository.into(),
        }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SnapshotAsyncAction>(
        SnapshotAsyncAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for SnapshotAsyncAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        state: &mut PolicyInstanceState,
    ) -> Result<()> {
        if let Some(existing) = &state.snapshot_name {
            debug!(
                "snapshot '{}' already started for index '{}', not starting another",
                existing, index
            );
            return Ok(());
        }
        let snapshot = format!("{}-{}", self.name_prefix, Uuid::new_v4());
        ctx.backend
            .start_snapshot(index, &snapshot, &self.repository)
            .await?;
        state.snapshot_name = Some(snapshot);
        Ok(())
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
