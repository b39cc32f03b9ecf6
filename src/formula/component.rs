//! Formula component schema
//!
//! A rule is an ordered list of [`FormulaComponent`]s. Each component carries a
//! small common header (id, label, rounding, optional role) and a kind-specific
//! payload. The payload is a tagged union so a slab can never be confused with a
//! percentage, and a slab range states explicitly whether it yields a rate or a
//! literal amount.

use serde::{Deserialize, Serialize};

use super::rounding::Rounding;
use super::variables::{FuelType, Operator, RegistrationType, Variable};

/// One line-item computation step in a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaComponent {
    /// Stable identifier, carried across rule versions
    pub id: String,
    /// Display name, e.g. "Road Tax"
    pub label: String,
    #[serde(default)]
    pub rounding: Rounding,
    /// Explicit aggregation tag; untagged components are classified by label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ComponentRole>,
    /// Whether the tenure ratio applies. Defaults per kind, see [`FormulaComponent::treatment`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_treatment: Option<VariantTreatment>,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ComponentKind {
    /// Literal amount
    Fixed {
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fuel_matrix: Option<FuelMatrix>,
    },
    /// `percentage% x basis`
    Percentage {
        percentage: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        basis: Option<Basis>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fuel_matrix: Option<FuelMatrix>,
    },
    /// Two-way branch on a variable compared against a literal
    Conditional {
        condition_variable: Variable,
        condition_operator: Operator,
        condition_value: Literal,
        #[serde(default)]
        then_block: Vec<FormulaComponent>,
        #[serde(default)]
        else_block: Vec<FormulaComponent>,
    },
    /// Multi-way dispatch on a variable's stringified value, first match wins
    Switch {
        switch_variable: Variable,
        cases: Vec<SwitchCase>,
    },
    /// Range lookup on a variable, first matching range wins
    Slab {
        #[serde(default = "default_slab_variable")]
        slab_variable: Variable,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        basis: Option<Basis>,
        ranges: Vec<SlabRange>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        secondary_slabs: Vec<SecondarySlab>,
    },
}

fn default_slab_variable() -> Variable {
    Variable::EngineCc
}

/// What a percentage is taken of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Basis {
    ExShowroom,
    /// Insured declared value (insurance rules only)
    Idv,
    /// Sum of own-damage lines so far (insurance rules only)
    OdPremium,
    /// Sum of every line produced before this component
    #[serde(alias = "PREVIOUS_TAX_TOTAL")]
    RunningTotal,
    /// Sum of the lines produced so far by the component with this id
    TargetComponent(String),
}

/// Explicit aggregation tag for a component's lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentRole {
    Tax,
    Cess,
    RegistrationFee,
    SmartCard,
    Postal,
    OwnDamage,
    ThirdParty,
    Addon,
}

/// How a component reacts to the registration type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantTreatment {
    /// Same amount for every registration type
    None,
    /// Scaled by the tenure ratio (road tax)
    ProRata,
}

/// Per-fuel override of a percentage or fixed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct FuelMatrix {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petrol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diesel: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cng: Option<f64>,
}

impl FuelMatrix {
    /// Override for the given fuel, if the matrix defines one
    pub fn value_for(&self, fuel: Option<FuelType>) -> Option<f64> {
        match fuel? {
            FuelType::Petrol => self.petrol,
            FuelType::Diesel => self.diesel,
            FuelType::Ev => self.ev,
            FuelType::Cng => self.cng,
        }
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = f64> + '_ {
        [self.petrol, self.diesel, self.ev, self.cng].into_iter().flatten()
    }
}

/// What a matched slab range yields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlabRate {
    /// Rate applied to the component's basis
    Percentage(f64),
    /// Literal rupee figure (e.g. a third-party premium)
    Amount(f64),
}

impl SlabRate {
    pub fn value(&self) -> f64 {
        match self {
            SlabRate::Percentage(v) | SlabRate::Amount(v) => *v,
        }
    }
}

/// One row of a slab table; bounds are inclusive, `max = None` is unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabRange {
    #[serde(default)]
    pub id: String,
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    pub rate: SlabRate,
    /// Surcharge on the computed amount, emitted as its own line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cess_percentage: Option<f64>,
    /// Fuels this row applies to; empty means every fuel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_fuels: Vec<FuelType>,
}

impl SlabRange {
    pub fn percentage(min: f64, max: Option<f64>, percentage: f64) -> Self {
        Self::new(min, max, SlabRate::Percentage(percentage))
    }

    pub fn amount(min: f64, max: Option<f64>, amount: f64) -> Self {
        Self::new(min, max, SlabRate::Amount(amount))
    }

    fn new(min: f64, max: Option<f64>, rate: SlabRate) -> Self {
        Self {
            id: String::new(),
            min,
            max,
            rate,
            cess_percentage: None,
            applicable_fuels: Vec::new(),
        }
    }

    pub fn with_cess(mut self, cess_percentage: f64) -> Self {
        self.cess_percentage = Some(cess_percentage);
        self
    }

    pub fn for_fuels(mut self, fuels: &[FuelType]) -> Self {
        self.applicable_fuels = fuels.to_vec();
        self
    }

    /// Inclusive bounds check
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    pub fn admits_fuel(&self, fuel: Option<FuelType>) -> bool {
        self.applicable_fuels.is_empty()
            || fuel.is_some_and(|f| self.applicable_fuels.contains(&f))
    }
}

/// Alternate slab keyed on another variable, used instead of the primary
/// ranges when its fuel / registration-type gate matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondarySlab {
    #[serde(default)]
    pub id: String,
    pub variable: Variable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_fuels: Vec<FuelType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicable_reg_types: Vec<RegistrationType>,
    pub ranges: Vec<SlabRange>,
}

impl SecondarySlab {
    pub fn gate_matches(&self, fuel: Option<FuelType>, reg_type: Option<RegistrationType>) -> bool {
        let fuel_ok = self.applicable_fuels.is_empty()
            || fuel.is_some_and(|f| self.applicable_fuels.contains(&f));
        let reg_ok = self.applicable_reg_types.is_empty()
            || reg_type.is_some_and(|r| self.applicable_reg_types.contains(&r));
        fuel_ok && reg_ok
    }
}

/// One arm of a switch component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub match_value: Literal,
    #[serde(default)]
    pub block: Vec<FormulaComponent>,
}

/// Literal operand of a condition or switch case.
///
/// Stored rules hold these as strings, numbers or booleans depending on the
/// authoring tool; all are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLiteral", into = "String")]
pub struct Literal(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLiteral {
    Text(String),
    Integer(i64),
    Number(f64),
    Flag(bool),
}

impl From<RawLiteral> for Literal {
    fn from(raw: RawLiteral) -> Self {
        match raw {
            RawLiteral::Text(s) => Literal(s),
            RawLiteral::Integer(i) => Literal(i.to_string()),
            RawLiteral::Number(n) => Literal(n.to_string()),
            RawLiteral::Flag(b) => Literal(b.to_string()),
        }
    }
}

impl From<Literal> for String {
    fn from(literal: Literal) -> Self {
        literal.0
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal(value.to_string())
    }
}

impl Literal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FormulaComponent {
    fn with_kind(id: &str, label: &str, kind: ComponentKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            rounding: Rounding::default(),
            role: None,
            variant_treatment: None,
            kind,
        }
    }

    pub fn fixed(id: &str, label: &str, amount: f64) -> Self {
        Self::with_kind(id, label, ComponentKind::Fixed { amount, fuel_matrix: None })
    }

    pub fn percentage(id: &str, label: &str, percentage: f64) -> Self {
        Self::with_kind(
            id,
            label,
            ComponentKind::Percentage { percentage, basis: None, fuel_matrix: None },
        )
    }

    pub fn slab(id: &str, label: &str, variable: Variable, ranges: Vec<SlabRange>) -> Self {
        Self::with_kind(
            id,
            label,
            ComponentKind::Slab {
                slab_variable: variable,
                basis: None,
                ranges,
                secondary_slabs: Vec::new(),
            },
        )
    }

    pub fn conditional(
        id: &str,
        label: &str,
        variable: Variable,
        operator: Operator,
        value: &str,
        then_block: Vec<FormulaComponent>,
        else_block: Vec<FormulaComponent>,
    ) -> Self {
        Self::with_kind(
            id,
            label,
            ComponentKind::Conditional {
                condition_variable: variable,
                condition_operator: operator,
                condition_value: Literal::from(value),
                then_block,
                else_block,
            },
        )
    }

    pub fn switch(id: &str, label: &str, variable: Variable, cases: Vec<SwitchCase>) -> Self {
        Self::with_kind(id, label, ComponentKind::Switch { switch_variable: variable, cases })
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_role(mut self, role: ComponentRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_treatment(mut self, treatment: VariantTreatment) -> Self {
        self.variant_treatment = Some(treatment);
        self
    }

    /// Set the basis of a percentage or slab component; ignored for other kinds
    pub fn with_basis(mut self, new_basis: Basis) -> Self {
        match &mut self.kind {
            ComponentKind::Percentage { basis, .. } | ComponentKind::Slab { basis, .. } => {
                *basis = Some(new_basis);
            }
            _ => {}
        }
        self
    }

    /// Set the fuel matrix of a percentage or fixed component; ignored for other kinds
    pub fn with_fuel_matrix(mut self, matrix: FuelMatrix) -> Self {
        match &mut self.kind {
            ComponentKind::Percentage { fuel_matrix, .. } | ComponentKind::Fixed { fuel_matrix, .. } => {
                *fuel_matrix = Some(matrix);
            }
            _ => {}
        }
        self
    }

    /// Add a secondary slab; ignored for non-slab kinds
    pub fn with_secondary_slab(mut self, secondary: SecondarySlab) -> Self {
        if let ComponentKind::Slab { secondary_slabs, .. } = &mut self.kind {
            secondary_slabs.push(secondary);
        }
        self
    }

    /// Effective variant treatment: slabs are pro-rata unless told otherwise
    pub fn treatment(&self) -> VariantTreatment {
        self.variant_treatment.unwrap_or(match self.kind {
            ComponentKind::Slab { .. } => VariantTreatment::ProRata,
            _ => VariantTreatment::None,
        })
    }

    /// Short kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ComponentKind::Fixed { .. } => "FIXED",
            ComponentKind::Percentage { .. } => "PERCENTAGE",
            ComponentKind::Conditional { .. } => "CONDITIONAL",
            ComponentKind::Switch { .. } => "SWITCH",
            ComponentKind::Slab { .. } => "SLAB",
        }
    }

    /// Nested component blocks (conditional branches, switch arms)
    pub fn blocks(&self) -> Vec<&[FormulaComponent]> {
        match &self.kind {
            ComponentKind::Conditional { then_block, else_block, .. } => {
                vec![then_block.as_slice(), else_block.as_slice()]
            }
            ComponentKind::Switch { cases, .. } => cases.iter().map(|c| c.block.as_slice()).collect(),
            _ => Vec::new(),
        }
    }
}

impl SwitchCase {
    pub fn new(match_value: &str, block: Vec<FormulaComponent>) -> Self {
        Self {
            id: String::new(),
            label: match_value.to_string(),
            match_value: Literal::from(match_value),
            block,
        }
    }
}
