use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sets the recovery priority of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPriorityAction {
    pub priority: u32,
}

impl SetPriorityAction {
    pub const TYPE: &'static str = "set_priority";

    pub fn new(priority: u32) -> Self {
        Self { priority }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SetPriorityAction>(
        SetPriorityAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for SetPriorityAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.set_priority(index, self.priority).await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
