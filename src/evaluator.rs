//! Shared component walk used by the registration and insurance evaluators
//!
//! Both evaluators dispatch on the same component kinds; they differ only in
//! the variables they expose, the absolute bases available (ex-showroom vs.
//! IDV) and the tenure ratio. Those differences live behind [`EvaluationScope`].

use log::trace;

use crate::error::EvalError;
use crate::formula::{
    Basis, ComponentKind, ComponentRole, FormulaComponent, FuelMatrix, FuelType, Literal, Operator,
    RegistrationType, SecondarySlab, SlabRange, SlabRate, SwitchCase, VariantTreatment, Variable,
};
use crate::result::{sum_amounts, CalculationResultItem};

/// Variable universe and absolute bases an evaluation runs against
pub trait EvaluationScope {
    /// Resolve a named variable; `None` when the context does not carry it
    fn variable(&self, variable: Variable) -> Option<crate::formula::VariableValue>;

    /// Value of an absolute basis; `None` when the basis does not exist in this scope
    fn basis_value(&self, basis: &Basis) -> Option<f64>;

    fn fuel(&self) -> Option<FuelType>;

    fn reg_type(&self) -> Option<RegistrationType>;

    /// Multiplier for pro-rata (road tax) components
    fn tenure_ratio(&self) -> f64 {
        1.0
    }
}

/// Basis used by percentage and slab components that do not name one
#[derive(Debug, Clone)]
pub struct DefaultBasis {
    pub amount: f64,
    pub label: String,
}

impl DefaultBasis {
    pub fn new(amount: f64, label: impl Into<String>) -> Self {
        Self { amount, label: label.into() }
    }
}

/// Availability of the `OD_PREMIUM` basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OwnDamageBasis {
    Unavailable,
    /// Own-damage lines are being produced; the basis is the running total
    Accumulating,
    Closed(f64),
}

/// Walks component lists in declaration order, appending to one breakdown
pub(crate) struct Walker<'a, S: EvaluationScope> {
    rule_id: &'a str,
    scope: &'a S,
    items: Vec<CalculationResultItem>,
    own_damage: OwnDamageBasis,
}

impl<'a, S: EvaluationScope> Walker<'a, S> {
    pub fn new(rule_id: &'a str, scope: &'a S) -> Self {
        Self {
            rule_id,
            scope,
            items: Vec::new(),
            own_damage: OwnDamageBasis::Unavailable,
        }
    }

    pub fn with_own_damage(mut self, own_damage: OwnDamageBasis) -> Self {
        self.own_damage = own_damage;
        self
    }

    /// Freeze the own-damage basis at the current running total
    pub fn close_own_damage(&mut self) {
        self.own_damage = OwnDamageBasis::Closed(self.running_total());
    }

    pub fn items(&self) -> &[CalculationResultItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CalculationResultItem> {
        self.items
    }

    pub fn running_total(&self) -> f64 {
        sum_amounts(&self.items)
    }

    /// Evaluate a block; nested blocks are flattened into the same breakdown
    pub fn run(&mut self, components: &[FormulaComponent], default: &DefaultBasis) -> Result<(), EvalError> {
        for component in components {
            self.evaluate(component, default)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, component: &FormulaComponent, default: &DefaultBasis) -> Result<(), EvalError> {
        match &component.kind {
            ComponentKind::Fixed { amount, fuel_matrix } => {
                let value = self.fuel_value(*amount, fuel_matrix.as_ref());
                let (raw, ratio_note) = self.scaled(component, value);
                self.push(component, raw, format!("Fixed {:.2}{}", value, ratio_note));
            }
            ComponentKind::Percentage { percentage, basis, fuel_matrix } => {
                let rate = self.fuel_value(*percentage, fuel_matrix.as_ref());
                let (basis_amount, basis_label) = self.resolve_basis(component, basis.as_ref(), default)?;
                let (raw, ratio_note) = self.scaled(component, basis_amount * rate / 100.0);
                self.push(
                    component,
                    raw,
                    format!("{:.2}% of {} ({:.2}){}", rate, basis_label, basis_amount, ratio_note),
                );
            }
            ComponentKind::Conditional {
                condition_variable,
                condition_operator,
                condition_value,
                then_block,
                else_block,
            } => {
                if self.condition_holds(*condition_variable, *condition_operator, condition_value) {
                    self.run(then_block, default)?;
                } else if else_block.is_empty() {
                    trace!("rule {}: conditional {} false with no else block", self.rule_id, component.id);
                } else {
                    self.run(else_block, default)?;
                }
            }
            ComponentKind::Switch { switch_variable, cases } => match self.select_case(*switch_variable, cases) {
                Some(case) => self.run(&case.block, default)?,
                None => trace!("rule {}: switch {} matched no case", self.rule_id, component.id),
            },
            ComponentKind::Slab { slab_variable, basis, ranges, secondary_slabs } => {
                let (variable, ranges) = self.select_table(*slab_variable, ranges, secondary_slabs);
                let matched = self
                    .scope
                    .variable(variable)
                    .and_then(|value| value.as_number())
                    .and_then(|value| {
                        ranges
                            .iter()
                            .find(|range| range.contains(value) && range.admits_fuel(self.scope.fuel()))
                            .map(|range| (value, range))
                    });

                match matched {
                    Some((value, range)) => self.apply_range(component, basis.as_ref(), default, value, range)?,
                    None => trace!("rule {}: slab {} left unrated", self.rule_id, component.id),
                }
            }
        }
        Ok(())
    }

    fn apply_range(
        &mut self,
        component: &FormulaComponent,
        basis: Option<&Basis>,
        default: &DefaultBasis,
        value: f64,
        range: &SlabRange,
    ) -> Result<(), EvalError> {
        let bounds = match range.max {
            Some(max) => format!("{}-{}", range.min, max),
            None => format!("{}+", range.min),
        };
        let (base, derivation) = match range.rate {
            SlabRate::Percentage(rate) => {
                let (basis_amount, basis_label) = self.resolve_basis(component, basis, default)?;
                (
                    basis_amount * rate / 100.0,
                    format!("{:.2}% of {} ({:.2})", rate, basis_label, basis_amount),
                )
            }
            SlabRate::Amount(amount) => (amount, format!("Fixed {:.2}", amount)),
        };
        let (raw, ratio_note) = self.scaled(component, base);
        let amount = self.push(
            component,
            raw,
            format!("Slab {} (value {}): {}{}", bounds, value, derivation, ratio_note),
        );

        if let Some(cess) = range.cess_percentage.filter(|c| *c != 0.0) {
            let cess_amount = component.rounding.apply(amount * cess / 100.0);
            self.items.push(CalculationResultItem {
                label: format!("{} Cess", component.label),
                amount: cess_amount,
                meta: format!("{}% Surcharge on {:.2}", cess, amount),
                component_id: component.id.clone(),
                role: Some(ComponentRole::Cess),
            });
        }
        Ok(())
    }

    /// Round per the component's directive and append; returns the rounded amount
    fn push(&mut self, component: &FormulaComponent, raw: f64, meta: String) -> f64 {
        let amount = component.rounding.apply(raw);
        trace!("rule {}: {} -> {:.2} ({})", self.rule_id, component.id, amount, meta);
        self.items.push(CalculationResultItem {
            label: component.label.clone(),
            amount,
            meta,
            component_id: component.id.clone(),
            role: component.role,
        });
        amount
    }

    fn fuel_value(&self, base: f64, matrix: Option<&FuelMatrix>) -> f64 {
        matrix
            .and_then(|m| m.value_for(self.scope.fuel()))
            .unwrap_or(base)
    }

    /// Apply the tenure ratio to pro-rata components
    fn scaled(&self, component: &FormulaComponent, amount: f64) -> (f64, String) {
        let ratio = self.scope.tenure_ratio();
        if component.treatment() == VariantTreatment::ProRata && ratio != 1.0 {
            (amount * ratio, format!(" x {:.4} tenure ratio", ratio))
        } else {
            (amount, String::new())
        }
    }

    fn resolve_basis(
        &self,
        component: &FormulaComponent,
        basis: Option<&Basis>,
        default: &DefaultBasis,
    ) -> Result<(f64, String), EvalError> {
        let Some(basis) = basis else {
            return Ok((default.amount, default.label.clone()));
        };

        let resolved = match basis {
            Basis::RunningTotal => Some((self.running_total(), "Running Total".to_string())),
            Basis::TargetComponent(target) => {
                let amount = sum_amounts(self.items.iter().filter(|item| &item.component_id == target));
                Some((amount, format!("Component {}", target)))
            }
            Basis::OdPremium => match self.own_damage {
                OwnDamageBasis::Unavailable => None,
                OwnDamageBasis::Accumulating => Some((self.running_total(), "OD Premium".to_string())),
                OwnDamageBasis::Closed(total) => Some((total, "OD Premium".to_string())),
            },
            Basis::ExShowroom => self.scope.basis_value(basis).map(|v| (v, "Ex-Showroom".to_string())),
            Basis::Idv => self.scope.basis_value(basis).map(|v| (v, "IDV".to_string())),
        };

        resolved.ok_or_else(|| {
            EvalError::malformed(
                self.rule_id,
                &component.id,
                format!("basis {:?} is not available for this rule type", basis),
            )
        })
    }

    fn condition_holds(&self, variable: Variable, operator: Operator, literal: &Literal) -> bool {
        match self.scope.variable(variable) {
            Some(value) => operator.compare(&value, literal.as_str()),
            None => false,
        }
    }

    fn select_case<'c>(&self, variable: Variable, cases: &'c [SwitchCase]) -> Option<&'c SwitchCase> {
        let value = self.scope.variable(variable)?.to_match_string();
        cases
            .iter()
            .find(|case| case.match_value.as_str().trim().eq_ignore_ascii_case(value.trim()))
    }

    fn select_table<'c>(
        &self,
        primary_variable: Variable,
        primary: &'c [SlabRange],
        secondary: &'c [SecondarySlab],
    ) -> (Variable, &'c [SlabRange]) {
        secondary
            .iter()
            .find(|slab| slab.gate_matches(self.scope.fuel(), self.scope.reg_type()))
            .map(|slab| (slab.variable, slab.ranges.as_slice()))
            .unwrap_or((primary_variable, primary))
    }
}
