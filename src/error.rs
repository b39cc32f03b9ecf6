//! Error taxonomy for evaluation and the callers around it

use thiserror::Error;

/// Failure of a single `(rule, context)` evaluation.
///
/// Evaluation is a pure function, so these are never worth retrying with the
/// same input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A component's payload is absent or invalid for its kind
    #[error("rule {rule_id}: component {component_id} is malformed: {reason}")]
    MalformedRule {
        rule_id: String,
        component_id: String,
        reason: String,
    },

    /// The calculation context cannot be priced (e.g. negative price)
    #[error("rule {rule_id}: invalid calculation context: {reason}")]
    InvalidContext { rule_id: String, reason: String },
}

impl EvalError {
    pub fn malformed(rule_id: &str, component_id: &str, reason: String) -> Self {
        EvalError::MalformedRule {
            rule_id: rule_id.to_string(),
            component_id: component_id.to_string(),
            reason,
        }
    }

    pub fn invalid_context(rule_id: &str, reason: impl Into<String>) -> Self {
        EvalError::InvalidContext {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Offending component, when the error is tied to one
    pub fn component_id(&self) -> Option<&str> {
        match self {
            EvalError::MalformedRule { component_id, .. } => Some(component_id),
            EvalError::InvalidContext { .. } => None,
        }
    }
}

/// Which kind of rule a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Registration,
    Insurance,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Registration => f.write_str("registration"),
            RuleKind::Insurance => f.write_str("insurance"),
        }
    }
}

/// Caller-level pricing failure
#[derive(Debug, Error)]
pub enum PricingError {
    /// No active rule for the state / vehicle type; surfaced, never defaulted silently
    #[error("no active {kind} rule for state {state_code} and vehicle type {vehicle_type}")]
    NoActiveRule {
        kind: RuleKind,
        state_code: String,
        vehicle_type: String,
    },

    #[error(transparent)]
    Evaluation(#[from] EvalError),
}
