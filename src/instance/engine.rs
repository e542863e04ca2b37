// ============================================================================
// Policy Instance engine
// ============================================================================
//
// Binds one policy to one index and executes it tick by tick. Every tick
// loads the durable state, evaluates the current step's condition gate,
// executes the step's actions in order, and persists a single state upsert.
// Failures from conditions and actions never escape to the caller; they are
// converted into recorded state fields and retried on a later tick. Only
// state store failures propagate.

use crate::core::{LifecycleError, Result};
use crate::instance::state::{
    ActionState, ConditionState, ErrorInfo, PolicyInstanceState, StepState,
};
use crate::instance::store::StateStore;
use crate::instance::ExecutionContext;
use crate::policy::{Policy, Step};
use log::{debug, trace, warn};
use std::sync::Arc;

/// What a tick accomplished. Purely informational; all durable effects are
/// already persisted when the tick returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Instance is DELETED; nothing ran.
    Skipped,
    /// The final step completed on an earlier tick; nothing left to run.
    Complete,
    /// The condition gate did not pass (false result or evaluation error);
    /// no step or action progress this tick.
    NotReady,
    /// An action failed and was recorded; the same action retries on the
    /// next eligible tick.
    ActionFailed { step: String, action: String },
    /// Every action of the step succeeded; `next` is the new current step,
    /// `None` when the policy just finished.
    Advanced { step: String, next: Option<String> },
    /// A delete action succeeded; the instance is retired.
    Deleted,
    /// Simulate-only tick: the gate passed and the listed actions would
    /// have run. Nothing was executed or persisted.
    Simulated { step: String, would_run: Vec<String> },
}

/// Runtime binding of a policy to one index.
pub struct PolicyInstance {
    index: String,
    policy_name: String,
    policy: Arc<Policy>,
    store: Arc<dyn StateStore>,
}

enum Gate {
    Pass,
    Hold,
}

impl PolicyInstance {
    pub fn new(
        index: impl Into<String>,
        policy_name: impl Into<String>,
        policy: Arc<Policy>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            index: index.into(),
            policy_name: policy_name.into(),
            policy,
            store,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// Run one tick. Callers must serialize ticks per index; the manager
    /// does so with a per-index lock.
    pub async fn tick(&self, ctx: &ExecutionContext) -> Result<TickOutcome> {
        let mut state = match self.store.get(&self.index).await? {
            Some(state) => state,
            None => PolicyInstanceState::new(&self.policy_name),
        };
        trace!(
            "tick for index '{}' with policy '{}' in status '{}'",
            self.index, state.policy_name, state.status
        );

        if state.status.is_deleted() {
            debug!("skipping tick for index '{}': instance is deleted", self.index);
            return Ok(TickOutcome::Skipped);
        }

        // Resolve the current step: the recorded one, or the first step of
        // the policy before the first tick ever ran.
        let current = state.current_step.clone();
        let step = match current {
            Some(name) => match self.policy.step(&name) {
                Some(step) => step,
                None => {
                    warn!(
                        "index '{}' points at step '{}' which does not exist in policy '{}'",
                        self.index, name, state.policy_name
                    );
                    let error = LifecycleError::Validation(format!(
                        "step '{}' does not exist in policy '{}'",
                        name, state.policy_name
                    ));
                    state.last_executed_step = Some(StepState::new(
                        name,
                        ctx.now,
                        0,
                        Some(ErrorInfo::from_error(&error)),
                    ));
                    self.persist(ctx, &state).await?;
                    return Ok(TickOutcome::NotReady);
                }
            },
            None if state.is_complete() => {
                debug!(
                    "skipping tick for index '{}': policy '{}' already completed",
                    self.index, state.policy_name
                );
                return Ok(TickOutcome::Complete);
            }
            None => match self.policy.first_step() {
                Some(step) => step,
                None => return Ok(TickOutcome::Complete),
            },
        };
        let step_name = step.name().to_string();
        state.current_step = Some(step_name.clone());

        // Condition gate, evaluated once before the whole action sequence.
        if let Gate::Hold = self.evaluate_gate(step, ctx, &mut state).await {
            self.persist(ctx, &state).await?;
            return Ok(TickOutcome::NotReady);
        }

        let (start_index, first_attempt) = resume_position(step, &state);

        if ctx.simulate {
            let would_run = step.actions()[start_index..]
                .iter()
                .map(|action| action.type_tag().to_string())
                .collect();
            return Ok(TickOutcome::Simulated {
                step: step_name,
                would_run,
            });
        }

        let step_attempt = match &state.last_executed_step {
            Some(prev) if prev.name == step_name && prev.has_error() => prev.attempt + 1,
            _ => 0,
        };
        let step_start = ctx.now;

        for (i, action) in step.actions().iter().enumerate().skip(start_index) {
            let attempt = if i == start_index { first_attempt } else { 0 };
            match action.execute(&self.index, ctx, &mut state).await {
                Ok(()) => {
                    state.last_executed_action =
                        Some(ActionState::new(action.type_tag(), ctx.now, attempt, None));
                    if state.status.is_deleted() {
                        state.last_executed_step =
                            Some(StepState::new(step_name.clone(), step_start, step_attempt, None));
                        self.persist(ctx, &state).await?;
                        return Ok(TickOutcome::Deleted);
                    }
                }
                Err(error) => {
                    warn!(
                        "action '{}' failed for index '{}' in step '{}': {}",
                        action.type_tag(),
                        self.index,
                        step_name,
                        error
                    );
                    let info = ErrorInfo::from_error(&error);
                    state.last_executed_action = Some(ActionState::new(
                        action.type_tag(),
                        ctx.now,
                        attempt,
                        Some(info.clone()),
                    ));
                    state.last_executed_step = Some(StepState::new(
                        step_name.clone(),
                        step_start,
                        step_attempt,
                        Some(info),
                    ));
                    self.persist(ctx, &state).await?;
                    return Ok(TickOutcome::ActionFailed {
                        step: step_name,
                        action: action.type_tag().to_string(),
                    });
                }
            }
        }

        // Whole step done: record it and advance. One tick never cascades
        // into the next step.
        state.last_executed_step =
            Some(StepState::new(step_name.clone(), step_start, step_attempt, None));
        let next = self
            .policy
            .next_step(&step_name)
            .map(|step| step.name().to_string());
        state.current_step = next.clone();
        self.persist(ctx, &state).await?;
        Ok(TickOutcome::Advanced {
            step: step_name,
            next,
        })
    }

    /// AND-combine the step's conditions. Any false result or evaluation
    /// error holds the gate; the outcome of the last evaluated condition is
    /// recorded either way.
    async fn evaluate_gate(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
        state: &mut PolicyInstanceState,
    ) -> Gate {
        for condition in step.conditions() {
            match condition.execute(&self.index, ctx, state).await {
                Ok(result) => {
                    state.last_executed_condition = Some(ConditionState::new(
                        condition.type_tag(),
                        ctx.now,
                        Some(result),
                        None,
                    ));
                    if !result {
                        return Gate::Hold;
                    }
                }
                Err(error) => {
                    debug!(
                        "condition '{}' failed for index '{}': {}",
                        condition.type_tag(),
                        self.index,
                        error
                    );
                    state.last_executed_condition = Some(ConditionState::new(
                        condition.type_tag(),
                        ctx.now,
                        None,
                        Some(ErrorInfo::from_error(&error)),
                    ));
                    return Gate::Hold;
                }
            }
        }
        Gate::Pass
    }

    async fn persist(&self, ctx: &ExecutionContext, state: &PolicyInstanceState) -> Result<()> {
        if ctx.simulate {
            return Ok(());
        }
        self.store.put(&self.index, state).await
    }
}

/// Where the action sequence starts this tick. When the recorded action
/// outcome is a failure naming an action of this step, the sequence resumes
/// at that position with an incremented attempt; actions that already
/// succeeded are not re-run.
fn resume_position(step: &Step, state: &PolicyInstanceState) -> (usize, u32) {
    if let Some(last) = &state.last_executed_action {
        if last.has_error() {
            if let Some(position) = step
                .actions()
                .iter()
                .position(|action| action.type_tag() == last.name)
            {
                return (position, last.attempt + 1);
            }
        }
    }
    (0, 0)
}
