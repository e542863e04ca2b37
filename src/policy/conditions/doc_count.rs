use super::Condition;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True once the index holds at least `max_doc_count` documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocCountCondition {
    pub max_doc_count: u64,
}

impl DocCountCondition {
    pub const TYPE: &'static str = "doc_count";

    pub fn new(max_doc_count: u64) -> Self {
        Self { max_doc_count }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<DocCountCondition>(
        DocCountCondition::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Condition for DocCountCondition {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &PolicyInstanceState,
    ) -> Result<bool> {
        let info = ctx.backend.index_info(index).await?;
        Ok(info.doc_count >= self.max_doc_count)
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
