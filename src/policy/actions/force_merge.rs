use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Starts a force merge down to `max_num_segments` segments per shard and
/// returns immediately. Completion is observed by a `force_merge_done`
/// condition gating a later step. Re-issuing the merge on retry is safe; the
/// backend treats an already-merged index as a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForceMergeAsyncAction {
    pub max_num_segments: u32,
}

impl ForceMergeAsyncAction {
    pub const TYPE: &'static str = "force_merge";

    pub fn new(max_num_segments: u32) -> Self {
        Self { max_num_segments }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<ForceMergeAsyncAction>(
        ForceMergeAsyncAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for ForceMergeAsyncAction {
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
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend
            .start_force_merge(index, self.max_num_segments)
            .await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
