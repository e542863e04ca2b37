use super::Action;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rolls the write alias over to a fresh index. Without an explicit `alias`
/// the backend resolves the write alias of the index itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolloverAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl RolloverAction {
    pub const TYPE: &'static str = "rollover";

    pub fn new() -> Self {
        Self { alias: None }
    }

    pub fn with_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
        }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    Ok(Box::new(parse_fields::<RolloverAction>(
        RolloverAction::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Action for RolloverAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.rollover(index, self.alias.as_deref()).await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
