//! Registration calculation context

use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationScope;
use crate::formula::{safe_div, Basis, FuelType, RegistrationType, Variable, VariableValue};

/// Tenure and company multiplier, derived from the rule and injected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantConfig {
    pub state_tenure: u32,
    pub bh_tenure: u32,
    pub company_multiplier: f64,
}

impl VariantConfig {
    /// Multiplier applied to pro-rata road-tax components.
    ///
    /// TEMP and unrecognised registrations are taxed like a state registration.
    pub fn tenure_ratio(&self, reg_type: RegistrationType) -> f64 {
        match reg_type {
            RegistrationType::StateIndividual | RegistrationType::Temp | RegistrationType::Other => 1.0,
            RegistrationType::BhSeries => safe_div(self.bh_tenure as f64, self.state_tenure as f64),
            RegistrationType::Company => self.company_multiplier,
        }
    }
}

/// Vehicle facts a registration rule is evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationContext {
    pub ex_showroom: f64,
    pub engine_cc: f64,
    pub fuel_type: FuelType,
    pub reg_type: RegistrationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kw_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_vehicle_weight: Option<f64>,
    /// When absent the evaluator reads tenure and multiplier from the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_config: Option<VariantConfig>,
}

impl CalculationContext {
    pub fn new(ex_showroom: f64, engine_cc: f64, fuel_type: FuelType, reg_type: RegistrationType) -> Self {
        Self {
            ex_showroom,
            engine_cc,
            fuel_type,
            reg_type,
            kw_rating: None,
            seating_capacity: None,
            gross_vehicle_weight: None,
            variant_config: None,
        }
    }

    pub fn with_variant_config(mut self, config: VariantConfig) -> Self {
        self.variant_config = Some(config);
        self
    }

    pub fn with_kw_rating(mut self, kw: f64) -> Self {
        self.kw_rating = Some(kw);
        self
    }

    /// Same vehicle under another registration type
    pub fn for_reg_type(&self, reg_type: RegistrationType) -> Self {
        Self { reg_type, ..self.clone() }
    }
}

/// Registration variable universe bound to a resolved variant config
pub(crate) struct RegistrationScope<'a> {
    pub ctx: &'a CalculationContext,
    pub config: VariantConfig,
}

impl EvaluationScope for RegistrationScope<'_> {
    fn variable(&self, variable: Variable) -> Option<VariableValue> {
        let ctx = self.ctx;
        match variable {
            Variable::RegType => Some(VariableValue::Text(ctx.reg_type.as_str().to_string())),
            Variable::FuelType => Some(VariableValue::Text(ctx.fuel_type.as_str().to_string())),
            Variable::EngineCc => Some(VariableValue::Number(ctx.engine_cc)),
            Variable::ExShowroom => Some(VariableValue::Number(ctx.ex_showroom)),
            Variable::KwRating => ctx.kw_rating.map(VariableValue::Number),
            Variable::SeatingCapacity => ctx.seating_capacity.map(|s| VariableValue::Number(s as f64)),
            Variable::GrossVehicleWeight => ctx.gross_vehicle_weight.map(VariableValue::Number),
            Variable::Idv | Variable::OdTenure | Variable::TpTenure | Variable::IsNewVehicle => None,
        }
    }

    fn basis_value(&self, basis: &Basis) -> Option<f64> {
        match basis {
            Basis::ExShowroom => Some(self.ctx.ex_showroom),
            _ => None,
        }
    }

    fn fuel(&self) -> Option<FuelType> {
        Some(self.ctx.fuel_type)
    }

    fn reg_type(&self) -> Option<RegistrationType> {
        Some(self.ctx.reg_type)
    }

    fn tenure_ratio(&self) -> f64 {
        self.config.tenure_ratio(self.ctx.reg_type)
    }
}
