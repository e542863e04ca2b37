// ============================================================================
// Actions
// ============================================================================
//
// An action performs one side-effecting operation against an index. Within a
// step actions run strictly in declared order; the first failure stops the
// sequence and is retried at the same position on a later tick. Asynchronous
// actions only start a backend job and must be idempotent on retry; their
// completion is observed by a paired condition gating a later step.

pub mod allocation;
pub mod close;
pub mod delete;
pub mod force_merge;
pub mod rollover;
pub mod set_priority;
pub mod set_read_only;
pub mod set_replica_count;
pub mod snapshot;

pub use allocation::AllocationAction;
pub use close::CloseAction;
pub use delete::DeleteAction;
pub use force_merge::ForceMergeAsyncAction;
pub use rollover::RolloverAction;
pub use set_priority::SetPriorityAction;
pub use set_read_only::SetReadOnlyAction;
pub use set_replica_count::SetReplicaCountAction;
pub use snapshot::SnapshotAsyncAction;

use crate::core::{Result, ValidationErrors};
use crate::instance::{ExecutionContext, PolicyInstanceState};
use crate::policy::docform::TYPE_FIELD;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Side-effecting operation on one index.
#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    /// The declarative type tag, also used as the recorded action name.
    fn type_tag(&self) -> &'static str;

    /// Whether this action only starts a backend job instead of completing
    /// within the call.
    fn is_async(&self) -> bool {
        false
    }

    /// Actions receive the state mutably so async variants can record the
    /// job they started (e.g. the generated snapshot name).
    async fn execute(
        &self,
        index: &str,
        ctx: &ExecutionContext,
        state: &mut PolicyInstanceState,
    ) -> Result<()>;

    /// Document form including the `type` tag.
    fn to_doc(&self) -> Value;
}

type ActionParser = fn(&Value) -> std::result::Result<Box<dyn Action>, ValidationErrors>;

/// Maps a declarative type tag to the parser producing the typed action.
pub struct ActionRegistry {
    parsers: HashMap<&'static str, ActionParser>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: &'static str, parser: ActionParser) {
        self.parsers.insert(tag, parser);
    }

    /// Registry with all built-in actions.
    pub fn with_default_actions() -> Self {
        let mut registry = Self::new();
        registry.register(AllocationAction::TYPE, allocation::parse);
        registry.register(CloseAction::TYPE, close::parse);
        registry.register(DeleteAction::TYPE, delete::parse);
        registry.register(ForceMergeAsyncAction::TYPE, force_merge::parse);
        registry.register(RolloverAction::TYPE, rollover::parse);
        registry.register(SetPriorityAction::TYPE, set_priority::parse);
        registry.register(SetReadOnlyAction::TYPE, set_read_only::parse);
        registry.register(SetReplicaCountAction::TYPE, set_replica_count::parse);
        registry.register(SnapshotAsyncAction::TYPE, snapshot::parse);
        registry
    }

    pub fn parse(&self, doc: &Value) -> std::result::Result<Box<dyn Action>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(object) = doc.as_object() else {
            errors.add(TYPE_FIELD, "action must be an object");
            return Err(errors);
        };
        let Some(tag) = object.get(TYPE_FIELD).and_then(Value::as_str) else {
            errors.add(TYPE_FIELD, "missing action type");
            return Err(errors);
        };
        match self.parsers.get(tag) {
            Some(parser) => parser(doc),
            None => {
                errors.add(TYPE_FIELD, format!("unknown action type '{}'", tag));
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

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_default_actions()
    }
}
