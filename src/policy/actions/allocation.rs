use super::Action;
use crate::backend::AllocationRules;
use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::{parse_fields, tagged_doc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Pins the index to nodes by attribute (require/include/exclude routing),
/// e.g. moving an aging index onto warm-tier hardware.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationAction {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub require: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub include: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub exclude: HashMap<String, String>,
}

impl AllocationAction {
    pub const TYPE: &'static str = "allocation";

    pub fn require(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            require: HashMap::from([(attribute.into(), value.into())]),
            ..Self::default()
        }
    }

    fn rules(&self) -> AllocationRules {
        AllocationRules {
            require: self.require.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

pub(super) fn parse(doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
    let action = parse_fields::<AllocationAction>(AllocationAction::TYPE, doc)?;
    if action.require.is_empty() && action.include.is_empty() && action.exclude.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add(AllocationAction::TYPE, "at least one allocation rule");
        return Err(errors);
    }
    Ok(Box::new(action))
}

#[async_trait]
impl Action for AllocationAction {
    fn type_tag(&self) -> &'static str {
        Self::TYPE
    }

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        _state: &mut PolicyInstanceState,
    ) -> Result<()> {
        ctx.backend.update_allocation(index, &self.rules()).await
    }

    fn to_doc(&self) -> Value {
        tagged_doc(Self::TYPE, self)
    }
}
