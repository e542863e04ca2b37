use super::Condition;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Polls a force merge started by a prior step: true once every shard of the
/// index reports at most `max_num_segments` segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForceMergeDoneCondition {
    pub max_num_segments: u32,
}

impl ForceMergeDoneCondition {
    pub const TYPE: &'static str = "force_merge_done";

    pub fn new(max_num_segments: u32) -> Self {
        Self { max_num_segments }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<ForceMergeDoneCondition>(
        ForceMergeDoneCondition::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Condition for ForceMergeDoneCondition {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &PolicyInstanceState,
    ) -> Result<bool> {
        let segments = ctx.backend.max_segments_per_shard(index).await?;
        Ok(segments <= self.max_num_segments)
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
