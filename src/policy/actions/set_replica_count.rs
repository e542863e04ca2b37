use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Changes the replica count of the index, e.g. dropping replicas before
/// archival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetReplicaCountAction {
    pub replica_count: u32,
}

impl SetReplicaCountAction {
    pub const TYPE: &'static str = "set_replica_count";

    pub fn new(replica_count: u32) -> Self {
        Self { replica_count }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SetReplicaCountAction>(
        SetReplicaCountAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for SetReplicaCountAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.set_replica_count(index, self.replica_count).await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
