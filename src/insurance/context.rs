//! Insurance calculation context

use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationScope;
use crate::formula::{Basis, FuelType, RegistrationType, Variable, VariableValue};

fn default_true() -> bool {
    true
}
fn default_od_tenure() -> u32 {
    1
}
fn default_tp_tenure() -> u32 {
    5
}

/// Vehicle and policy facts an insurance rule is evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceCalculationContext {
    pub ex_showroom: f64,
    pub engine_cc: f64,
    pub fuel_type: FuelType,
    #[serde(default = "default_true")]
    pub is_new_vehicle: bool,
    /// Own-damage cover in years (1, 3 or 5)
    #[serde(default = "default_od_tenure")]
    pub od_tenure: u32,
    /// Third-party cover in years (1 or 5)
    #[serde(default = "default_tp_tenure")]
    pub tp_tenure: u32,
    /// Replaces the IDV derived from ex-showroom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_idv: Option<f64>,
}

impl InsuranceCalculationContext {
    pub fn new(ex_showroom: f64, engine_cc: f64, fuel_type: FuelType) -> Self {
        Self {
            ex_showroom,
            engine_cc,
            fuel_type,
            is_new_vehicle: true,
            od_tenure: default_od_tenure(),
            tp_tenure: default_tp_tenure(),
            custom_idv: None,
        }
    }

    pub fn with_tenures(mut self, od_tenure: u32, tp_tenure: u32) -> Self {
        self.od_tenure = od_tenure;
        self.tp_tenure = tp_tenure;
        self
    }

    pub fn with_custom_idv(mut self, idv: f64) -> Self {
        self.custom_idv = Some(idv);
        self
    }
}

pub(crate) struct InsuranceScope<'a> {
    pub ctx: &'a InsuranceCalculationContext,
    pub idv: f64,
}

impl EvaluationScope for InsuranceScope<'_> {
    fn variable(&self, variable: Variable) -> Option<VariableValue> {
        let ctx = self.ctx;
        match variable {
            Variable::FuelType => Some(VariableValue::Text(ctx.fuel_type.as_str().to_string())),
            Variable::EngineCc => Some(VariableValue::Number(ctx.engine_cc)),
            Variable::ExShowroom => Some(VariableValue::Number(ctx.ex_showroom)),
            Variable::Idv => Some(VariableValue::Number(self.idv)),
            Variable::OdTenure => Some(VariableValue::Number(ctx.od_tenure as f64)),
            Variable::TpTenure => Some(VariableValue::Number(ctx.tp_tenure as f64)),
            Variable::IsNewVehicle => Some(VariableValue::Flag(ctx.is_new_vehicle)),
            Variable::RegType
            | Variable::KwRating
            | Variable::SeatingCapacity
            | Variable::GrossVehicleWeight => None,
        }
    }

    fn basis_value(&self, basis: &Basis) -> Option<f64> {
        match basis {
            Basis::ExShowroom => Some(self.ctx.ex_showroom),
            Basis::Idv => Some(self.idv),
            _ => None,
        }
    }

    fn fuel(&self) -> Option<FuelType> {
        Some(self.ctx.fuel_type)
    }

    fn reg_type(&self) -> Option<RegistrationType> {
        None
    }
}
