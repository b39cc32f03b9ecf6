//! Motor insurance rules and their evaluator

mod context;
mod evaluator;
mod rule;

pub use context::InsuranceCalculationContext;
pub use evaluator::evaluate_insurance;
pub use rule::{InsuranceRule, ALL_STATES};
