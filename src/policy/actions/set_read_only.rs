use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Blocks writes to the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetReadOnlyAction {}

impl SetReadOnlyAction {
    pub const TYPE: &'static str = "set_read_only";

    pub fn new() -> Self {
        Self {}
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SetReadOnlyAction>(
        SetReadOnlyAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for SetReadOnlyAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.set_write_block(index).await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
