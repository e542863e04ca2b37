use super::Condition;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True once the alias holds more than `max_index_count` member indices.
/// Used to prune the oldest members of a rolling alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexCountCondition {
    pub alias: String,
    pub max_index_count: usize,
}

impl IndexCountCondition {
    pub const TYPE: &'static str = "index_count";

    pub fn new(alias: impl Into<String>, max_index_count: usize) -> Self {
        Self {
            alias: alias.into(),
            max_index_count,
        }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
    Ok(Box::new(parse_fields::<IndexCountCondition>(
        IndexCountCondition::TYPE,
        doc,
    )?))
}

#[async_trait]
impl Condition for IndexCountCondition {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        _index: &str,
        ctx: &ExecutionContext,
        _state: &PolicyInstanceState,
    ) -> Result<bool> {
        let members = ctx.backend.alias_members(&self.alias).await?;
        Ok(members.len() > self.max_index_count)
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
