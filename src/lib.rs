//! On-road pricing - rule-driven registration and motor insurance evaluation
//!
//! This library provides:
//! - A typed formula component model (fixed, percentage, conditional, switch, slab)
//! - Registration (RTO) evaluation with tenure-prorated road tax
//! - Motor insurance evaluation: IDV, own damage, third party, add-ons and GST
//! - Reconciliation of breakdowns into flat, storage-ready price records
//! - Active-rule selection and chunked batch repricing

pub mod aggregate;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod insurance;
pub mod loader;
pub mod registration;
pub mod result;

// Re-export commonly used types
pub use aggregate::{PriceRecord, Vehicle};
pub use batch::{BatchReport, PriceRow, RepricingRunner};
pub use catalog::RuleBook;
pub use config::PricingConfig;
pub use error::{EvalError, PricingError};
pub use formula::{FormulaComponent, FuelType, RegistrationType, Rounding};
pub use insurance::{evaluate_insurance, InsuranceCalculationContext, InsuranceRule};
pub use registration::{evaluate_registration, quote_all_types, CalculationContext, RegistrationRule};
pub use result::{CalculationResult, CalculationResultItem, InsuranceCalculationResult};
