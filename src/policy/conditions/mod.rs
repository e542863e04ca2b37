// ============================================================================
// Conditions
// ============================================================================
//
// A condition is a side-effect-free predicate over an index's observable
// state. Within a step all conditions form an AND-combined gate: the step's
// actions run only once every condition reports true in the same tick.
// Evaluation may fail; failures are recoverable and simply hold the gate.

pub mod age;
pub mod doc_count;
pub mod force_merge_done;
pub mod index_count;
pub mod size;
pub mod snapshot_created;

pub use age::AgeCondition;
pub use doc_count::DocCountCondition;
pub use force_merge_done::ForceMergeDoneCondition;
pub use index_count::IndexCountCondition;
pub use size::SizeCondition;
pub use snapshot_created::SnapshotCreatedCondition;

use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::TYPE_FIELD;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Boolean predicate over one index.
///
/// `execute` must not mutate anything; it may read backend state and the
/// instance state (async conditions poll jobs recorded there).
#[async_trait]
pub trait Condition: Send + Sync + fmt::Debug {
    /// The declarative type tag, also used as the recorded condition name.
    fn type_tag(&self) -> &'static str;

    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        state: &PolicyInstanceState,
    ) -> Result<bool>;

    /// Document form including the `type` tag.
    fn to_doc(&self) -> Value;
}

type ConditionParser = fn(&Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors>;

/// Maps a declarative type tag to the parser producing the typed condition.
pub struct ConditionRegistry {
    parsers: HashMap<&'static str, ConditionParser>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: &'static str, parser: ConditionParser) {
        self.parsers.insert(tag, parser);
    }

    /// Registry with all built-in conditions.
    pub fn with_default_conditions() -> Self {
        let mut registry = Self::new();
        registry.register(AgeCondition::TYPE, age::parse);
        registry.register(DocCountCondition::TYPE, doc_count::parse);
        registry.register(ForceMergeDoneCondition::TYPE, force_merge_done::parse);
        registry.register(IndexCountCondition::TYPE, index_count::parse);
        registry.register(SizeCondition::TYPE, size::parse);
        registry.register(SnapshotCreatedCondition::TYPE, snapshot_created::parse);
        registry
    }

    pub fn parse(&self, doc: &Value) -> std::result::Result<Box<dyn Condition>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(object) = doc.as_object() else {
            errors.add(TYPE_FIELD, "condition must be an object");
            return Err(errors);
        };
        let Some(tag) = object.get(TYPE_FIELD).and_then(Value::as_str) else {
            errors.add(TYPE_FIELD, "missing condition type");
            return Err(errors);
        };
        match self.parsers.get(tag) {
            Some(parser) => parser(doc),
            None => {
                errors.add(TYPE_FIELD, format!("unknown condition type '{}'", tag));
                Err(errors)
            }
        }
    }

    pub fn registered_tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.parsers.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::with_default_conditions()
    }
}
