use super::Condition;
use crate::core::{ByteSize, Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True once the index's primary store size reaches `max_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeCondition {
    pub max_size: ByteSize,
}

impl SizeCondition {
    pub const TYPE: &'static str = "size";

    pub fn new(max_size: ByteSize) -> Self {
        Self { max_size }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<SizeCondition>(SizeCondition::TYPE, doc)?))
}

#[async_trait]
impl Condition for SizeCondition {
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
        Ok(info.size_bytes >= self.max_size.as_bytes())
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
