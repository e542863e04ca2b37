// ============================================================================
// IndexWarden Library
// ============================================================================
//
// Policy-driven lifecycle management for storage indices. Operators declare
// a policy - an ordered list of steps, each combining a condition gate with
// an action list - and the engine executes it per index as a durable,
// retryable state machine. The storage cluster itself is reached only
// through the `IndexBackend` collaborator trait; scheduling of ticks belongs
// to the caller.
//
// ```ignore
// use indexwarden::{
//     parse_policy, EngineSettings, MemoryStateStore, PolicyInstanceManager,
// };
// use serde_json::json;
// use std::sync::Arc;
//
// let policy = parse_policy(&json!({
//     "steps": [
//         {
//             "name": "rollover",
//             "conditions": [{"type": "size", "max_size": "5gb"}],
//             "actions": [{"type": "rollover"}],
//         },
//         {
//             "name": "delete",
//             "conditions": [{"type": "age", "max_age": "30d"}],
//             "actions": [{"type": "delete"}],
//         },
//     ]
// }))?;
//
// let manager = PolicyInstanceManager::new(
//     EngineSettings::new(),
//     backend, // Arc<dyn IndexBackend>, implemented by the embedder
//     Arc::new(MemoryStateStore::new()),
// )?;
// manager.put_policy("retention", policy).await;
// manager.manage("logs-000001", "retention").await?;
//
// // Driven by the embedder's scheduler:
// manager.tick_all().await;
// ```

pub mod backend;
pub mod config;
pub mod core;
pub mod instance;
pub mod policy;

// Re-export main types for convenience
pub use crate::core::{ByteSize, LifecycleError, Result, TimeSpan, ValidationError, ValidationErrors};
pub use backend::{AllocationRules, IndexBackend, IndexInfo, SnapshotState};
pub use config::EngineSettings;
pub use instance::{
    ActionState, ConditionState, ErrorInfo, ExecutionContext, FileStateStore, ManagerStats,
    MemoryStateStore, PolicyInstance, PolicyInstanceManager, PolicyInstanceState, StateStore,
    StepState, Status, TickOutcome,
};
pub use policy::{
    parse_policy, Action, ActionRegistry, Condition, ConditionRegistry, ParsingContext, Policy,
    Step,
};
