//! Formula component model: the closed set of computation primitives a rule is built from

mod component;
mod rounding;
mod validate;
mod variables;

pub use component::{
    Basis, ComponentKind, ComponentRole, FormulaComponent, FuelMatrix, Literal, SecondarySlab,
    SlabRange, SlabRate, SwitchCase, VariantTreatment,
};
pub use rounding::{round2, round_to, safe_div, Rounding};
pub use validate::{validate_sections, MAX_NESTING_DEPTH};
pub use variables::{FuelType, Operator, RegistrationType, Variable, VariableValue};
