use super::Condition;
use crate::core::{Result, TimeSpan, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True once the index has existed for at least `max_age`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgeCondition {
    pub max_age: TimeSpan,
}

impl AgeCondition {
    pub const TYPE: &'static str = "age";

    pub fn new(max_age: TimeSpan) -> Self {
        Self { max_age }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<AgeCondition>(AgeCondition::TYPE, doc)?))
}

#[async_trait]
impl Condition for AgeCondition {
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
        Ok(info.created_at + self.max_age.as_chrono() <= ctx.now)
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
