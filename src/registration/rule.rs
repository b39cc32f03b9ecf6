//! Registration rule definition

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::context::VariantConfig;
use crate::formula::FormulaComponent;

fn default_rule_name() -> String {
    "Default Rule".to_string()
}
fn default_vehicle_type() -> String {
    "2W".to_string()
}
fn default_state_tenure() -> u32 {
    15
}
fn default_bh_tenure() -> u32 {
    2
}
fn default_company_multiplier() -> f64 {
    2.0
}
pub(crate) fn default_version() -> u32 {
    1
}

// Stored rows carry explicit nulls for unset parameters
fn state_tenure_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or_else(default_state_tenure))
}
fn bh_tenure_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or_else(default_bh_tenure))
}
fn company_multiplier_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or_else(default_company_multiplier))
}

/// Publication status of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// Versioned, ordered list of registration components for one state / vehicle type.
///
/// Rules are snapshots authored elsewhere; evaluation only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRule {
    pub id: String,
    #[serde(default = "default_rule_name")]
    pub rule_name: String,
    pub state_code: String,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub status: RuleStatus,
    /// Road-tax tenure of a state registration, in years
    #[serde(default = "default_state_tenure", deserialize_with = "state_tenure_or_default")]
    pub state_tenure: u32,
    /// Road-tax tenure of a BH-series registration, in years
    #[serde(default = "default_bh_tenure", deserialize_with = "bh_tenure_or_default")]
    pub bh_tenure: u32,
    #[serde(default = "default_company_multiplier", deserialize_with = "company_multiplier_or_default")]
    pub company_multiplier: f64,
    #[serde(default)]
    pub components: Vec<FormulaComponent>,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl RegistrationRule {
    pub fn new(id: &str, state_code: &str, components: Vec<FormulaComponent>) -> Self {
        Self {
            id: id.to_string(),
            rule_name: default_rule_name(),
            state_code: state_code.to_string(),
            vehicle_type: default_vehicle_type(),
            effective_from: None,
            status: RuleStatus::Active,
            state_tenure: default_state_tenure(),
            bh_tenure: default_bh_tenure(),
            company_multiplier: default_company_multiplier(),
            components,
            version: default_version(),
        }
    }

    /// Tenure and multiplier the caller injects into a context
    pub fn variant_config(&self) -> VariantConfig {
        VariantConfig {
            state_tenure: self.state_tenure,
            bh_tenure: self.bh_tenure,
            company_multiplier: self.company_multiplier,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}
