// ============================================================================
// Policy / Step model
// ============================================================================
//
// A policy is an immutable ordered list of named steps; each step combines an
// AND-combined condition gate with an ordered action list. Policies are
// validated completely at parse time so execution never sees a malformed one.

pub mod actions;
pub mod conditions;
pub mod docform;

pub use actions::{Action, ActionRegistry};
pub use conditions::{Condition, ConditionRegistry};

use crate::core::ValidationErrors;
use serde_json::Value;

pub const STEPS_FIELD: &str = "steps";
pub const NAME_FIELD: &str = "name";
pub const CONDITIONS_FIELD: &str = "conditions";
pub const ACTIONS_FIELD: &str = "actions";

/// Named unit of work: a condition gate plus an ordered action list.
#[derive(Debug)]
pub struct Step {
    name: String,
    conditions: Vec<Box<dyn Condition>>,
    actions: Vec<Box<dyn Action>>,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<Box<dyn Condition>>,
        actions: Vec<Box<dyn Action>>,
    ) -> Self {
        Self {
            name: name.into(),
            conditions,
            actions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> &[Box<dyn Condition>] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    pub fn to_doc(&self) -> Value {
        serde_json::json!({
            NAME_FIELD: self.name,
            CONDITIONS_FIELD: self.conditions.iter().map(|c| c.to_doc()).collect::<Vec<_>>(),
            ACTIONS_FIELD: self.actions.iter().map(|a| a.to_doc()).collect::<Vec<_>>(),
        })
    }
}

/// Ordered sequence of steps applied to an index over its lifetime.
/// Immutable after parse.
#[derive(Debug)]
pub struct Policy {
    steps: Vec<Step>,
}

impl Policy {
    /// Build a policy directly from code. Callers are responsible for the
    /// invariants `parse` enforces (unique, non-empty step names).
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// The step following `name`, or `None` when `name` is the last step
    /// (or unknown).
    pub fn next_step(&self, name: &str) -> Option<&Step> {
        let position = self.steps.iter().position(|step| step.name == name)?;
        self.steps.get(position + 1)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    pub fn to_doc(&self) -> Value {
        serde_json::json!({
            STEPS_FIELD: self.steps.iter().map(|s| s.to_doc()).collect::<Vec<_>>(),
        })
    }

    /// Parse and validate a declarative policy document. All failures are
    /// collected; a policy with any validation error is rejected whole.
    pub fn parse(
        doc: &Value,
        parsing: &ParsingContext,
    ) -> std::result::Result<Policy, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(object) = doc.as_object() else {
            errors.add(STEPS_FIELD, "policy must be an object");
            return Err(errors);
        };
        for key in object.keys() {
            if key != STEPS_FIELD {
                errors.add(key, "unknown attribute");
            }
        }
        let steps_doc = match object.get(STEPS_FIELD) {
            Some(Value::Array(steps)) if !steps.is_empty() => steps.as_slice(),
            Some(Value::Array(_)) | None => {
                errors.add(STEPS_FIELD, "at least one step");
                return Err(errors);
            }
            Some(_) => {
                errors.add(STEPS_FIELD, "must be a list of steps");
                return Err(errors);
            }
        };

        let mut steps = Vec::with_capacity(steps_doc.len());
        let mut seen_names: Vec<String> = Vec::new();
        for (i, step_doc) in steps_doc.iter().enumerate() {
            let attribute = format!("{}[{}]", STEPS_FIELD, i);
            match parse_step(step_doc, parsing, &attribute, &mut errors) {
                Some(step) => {
                    if seen_names.contains(&step.name) {
                        errors.add(format!("{}.{}", attribute, NAME_FIELD), "no duplicates");
                    } else {
                        seen_names.push(step.name.clone());
                    }
                    steps.push(step);
                }
                None => continue,
            }
        }
        errors.into_result(Policy { steps })
    }
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.to_doc() == other.to_doc()
    }
}

fn parse_step(
    doc: &Value,
    parsing: &ParsingContext,
    attribute: &str,
    errors: &mut ValidationErrors,
) -> Option<Step> {
    let Some(object) = doc.as_object() else {
        errors.add(attribute, "step must be an object");
        return None;
    };
    for key in object.keys() {
        if ![NAME_FIELD, CONDITIONS_FIELD, ACTIONS_FIELD].contains(&key.as_str()) {
            errors.add(format!("{}.{}", attribute, key), "unknown attribute");
        }
    }

    let name = match object.get(NAME_FIELD).and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        Some(_) => {
            errors.add(format!("{}.{}", attribute, NAME_FIELD), "legal name");
            return None;
        }
        None => {
            errors.add(format!("{}.{}", attribute, NAME_FIELD), "required");
            return None;
        }
    };

    let mut conditions = Vec::new();
    if let Some(docs) = list_attribute(object, CONDITIONS_FIELD, attribute, errors) {
        for (j, condition_doc) in docs.iter().enumerate() {
            match parsing.conditions.parse(condition_doc) {
                Ok(condition) => conditions.push(condition),
                Err(nested) => {
                    errors.merge_under(&format!("{}.{}[{}]", attribute, CONDITIONS_FIELD, j), nested)
                }
            }
        }
    }

    let mut step_actions = Vec::new();
    if let Some(docs) = list_attribute(object, ACTIONS_FIELD, attribute, errors) {
        for (j, action_doc) in docs.iter().enumerate() {
            match parsing.actions.parse(action_doc) {
                Ok(action) => step_actions.push(action),
                Err(nested) => {
                    errors.merge_under(&format!("{}.{}[{}]", attribute, ACTIONS_FIELD, j), nested)
                }
            }
        }
    }

    if object.get(CONDITIONS_FIELD).map_or(true, value_list_empty)
        && object.get(ACTIONS_FIELD).map_or(true, value_list_empty)
    {
        errors.add(
            format!("{}.{}|{}", attribute, CONDITIONS_FIELD, ACTIONS_FIELD),
            "at least one condition or action",
        );
    }

    Some(Step::new(name, conditions, step_actions))
}

fn list_attribute<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &str,
    attribute: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a Vec<Value>> {
    match object.get(field) {
        Some(Value::Array(list)) => Some(list),
        Some(_) => {
            errors.add(format!("{}.{}", attribute, field), "must be a list");
            None
        }
        None => None,
    }
}

fn value_list_empty(value: &Value) -> bool {
    value.as_array().is_none_or(|list| list.is_empty())
}

/// Bundles the condition/action registries a parse run resolves type tags
/// against.
pub struct ParsingContext {
    pub conditions: ConditionRegistry,
    pub actions: ActionRegistry,
}

impl ParsingContext {
    pub fn new(conditions: ConditionRegistry, actions: ActionRegistry) -> Self {
        Self {
            conditions,
            actions,
        }
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::new(
            ConditionRegistry::with_default_conditions(),
            ActionRegistry::with_default_actions(),
        )
    }
}

/// Parse a policy document against the built-in condition/action registries.
pub fn parse_policy(doc: &Value) -> std::result::Result<Policy, ValidationErrors> {
    Policy::parse(doc, &ParsingContext::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retention_doc() -> Value {
        json!({
            "steps": [
                {
                    "name": "rollover",
                    "conditions": [{"type": "size", "max_size": "5gb"}],
                    "actions": [{"type": "rollover"}],
                },
                {
                    "name": "delete",
                    "conditions": [{"type": "age", "max_age": "30d"}],
                    "actions": [{"type": "delete"}],
                },
            ]
        })
    }

    #[test]
    fn test_parse_and_lookups() {
        let policy = parse_policy(&retention_doc()).unwrap();
        assert_eq!(policy.step_names(), vec!["rollover", "delete"]);
        assert_eq!(policy.first_step().unwrap().name(), "rollover");
        assert_eq!(policy.next_step("rollover").unwrap().name(), "delete");
        assert!(policy.next_step("delete").is_none());
        assert!(policy.step("nope").is_none());
        assert_eq!(policy.step("delete").unwrap().actions().len(), 1);
    }

    #[test]
    fn test_doc_round_trip() {
        let doc = retention_doc();
        let policy = parse_policy(&doc).unwrap();
        assert_eq!(policy.to_doc(), doc);

        let reparsed = parse_policy(&policy.to_doc()).unwrap();
        assert_eq!(reparsed, policy);
    }

    #[test]
    fn test_empty_policy_rejected() {
        assert!(parse_policy(&json!({"steps": []})).is_err());
        assert!(parse_policy(&json!({})).is_err());
    }

    #[test]
    fn test_duplicate_step_names_rejected() {
        let doc = json!({
            "steps": [
                {"name": "same", "actions": [{"type": "close"}]},
                {"name": "same", "actions": [{"type": "delete"}]},
            ]
        });
        let errors = parse_policy(&doc).unwrap_err();
        assert!(errors.to_string().contains("no duplicates"));
    }

    #[test]
    fn test_step_needs_condition_or_action() {
        let doc = json!({"steps": [{"name": "idle"}]});
        let errors = parse_policy(&doc).unwrap_err();
        assert!(errors.to_string().contains("at least one condition or action"));
    }

    #[test]
    fn test_unknown_attributes_rejected() {
        let doc = json!({
            "steps": [
                {"name": "ok", "actions": [{"type": "close"}], "schedule": "daily"},
            ],
            "owner": "ops",
        });
        let errors = parse_policy(&doc).unwrap_err();
        let rendered = errors.to_string();
        assert!(rendered.contains("steps[0].schedule"));
        assert!(rendered.contains("owner"));
    }

    #[test]
    fn test_all_errors_collected_in_one_pass() {
        let doc = json!({
            "steps": [
                {"name": "", "actions": [{"type": "close"}]},
                {"name": "x", "conditions": [{"type": "bogus"}], "actions": [{"type": "delete"}]},
            ]
        });
        let errors = parse_policy(&doc).unwrap_err();
        assert!(errors.errors().len() >= 2);
    }
}
