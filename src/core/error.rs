use thiserror::Error;

/// Errors produced by policy parsing, condition evaluation, action execution
/// and state persistence.
///
/// Everything except `Validation` is recoverable: the engine records the
/// failure in the instance state and retries on a later tick.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Condition '{0}' evaluation failed: {1}")]
    ConditionEvaluation(String, String),

    #[error("Action '{0}' execution failed: {1}")]
    ActionExecution(String, String),

    #[error("Index '{0}' not found")]
    IndexNotFound(String),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

impl LifecycleError {
    /// Short machine-readable tag, used for the `kind` field of recorded
    /// errors in the persisted instance state.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::Validation(_) => "validation",
            LifecycleError::ConditionEvaluation(_, _) => "condition_evaluation",
            LifecycleError::ActionExecution(_, _) => "action_execution",
            LifecycleError::IndexNotFound(_) => "not_found",
            LifecycleError::Store(_) => "store",
            LifecycleError::Backend(_) => "backend",
        }
    }

    /// A vanished index is a normal outcome for a tick, not a crash.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LifecycleError::IndexNotFound(_))
    }
}

// ============================================================================
// Validation Errors
// ============================================================================

/// A single parse-time validation failure, tied to the attribute path that
/// caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}': {}", self.attribute, self.message)
    }
}

/// Collects all validation failures of a parse run so a malformed policy is
/// rejected with every offending attribute reported at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(attribute, message));
    }

    /// Re-parent errors from a nested parse under `prefix`.
    pub fn merge_under(&mut self, prefix: &str, other: ValidationErrors) {
        for error in other.errors {
            self.errors.push(ValidationError::new(
                format!("{}.{}", prefix, error.attribute),
                error.message,
            ));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Finish a parse: `Ok(value)` if nothing was collected, otherwise the
    /// collected errors.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for LifecycleError {
    fn from(errors: ValidationErrors) -> Self {
        LifecycleError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(LifecycleError::Validation("x".into()).kind(), "validation");
        assert_eq!(
            LifecycleError::IndexNotFound("idx".into()).kind(),
            "not_found"
        );
        assert!(LifecycleError::IndexNotFound("idx".into()).is_not_found());
        assert!(!LifecycleError::Store("io".into()).is_not_found());
    }

    #[test]
    fn test_validation_errors_collect() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("steps", "at least one step");
        errors.add("steps[0].name", "no duplicates");
        assert_eq!(errors.errors().len(), 2);
        assert!(errors.to_string().contains("steps[0].name"));

        let result: std::result::Result<(), _> = errors.into_result(());
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_under_prefixes_attributes() {
        let mut inner = ValidationErrors::new();
        inner.add("max_age", "invalid duration");

        let mut outer = ValidationErrors::new();
        outer.merge_under("steps[1].conditions[0]", inner);

        assert_eq!(
            outer.errors()[0].attribute,
            "steps[1].conditions[0].max_age"
        );
    }
}
