use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState, Status};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Deletes the index. Terminal: on success the instance status flips to
/// DELETED and no further ticks run for this index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteAction {}

impl DeleteAction {
    pub const TYPE: &'static str = "delete";

    pub fn new() -> Self {
        Self {}
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<DeleteAction>(DeleteAction::TYPE, doc)?))
}

#[async_trait]
impl Action for DeleteAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.delete_index(index).await?;
        info!("index '{}' deleted, retiring policy instance", index);
        state.status = Status::Deleted;
        Ok(())
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
