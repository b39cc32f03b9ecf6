//! Registration (RTO) rules and their evaluator

mod context;
mod evaluator;
mod rule;

pub use context::{CalculationContext, VariantConfig};
pub use evaluator::{evaluate_registration, quote_all_types, RegistrationQuotes};
pub use rule::{RegistrationRule, RuleStatus};

pub(crate) use rule::default_version;
