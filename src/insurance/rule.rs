//! Insurance rule definition

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::formula::{FormulaComponent, Rounding};
use crate::registration::{default_version, RuleStatus};

/// State code of the catch-all insurance rule
pub const ALL_STATES: &str = "ALL";

fn default_rule_name() -> String {
    "Default Insurance Rule".to_string()
}
fn default_vehicle_type() -> String {
    "TWO_WHEELER".to_string()
}
fn default_state_code() -> String {
    ALL_STATES.to_string()
}
fn default_idv_percentage() -> f64 {
    95.0
}
fn default_gst_percentage() -> f64 {
    18.0
}
fn idv_percentage_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or_else(default_idv_percentage))
}
fn gst_percentage_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or_else(default_gst_percentage))
}

/// OD, TP and add-on component lists plus the IDV and GST parameters for one insurer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceRule {
    pub id: String,
    /// Short human-facing identifier, e.g. "INS-0042"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
    #[serde(default = "default_rule_name")]
    pub rule_name: String,
    #[serde(default = "default_state_code")]
    pub state_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurer_name: Option<String>,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub status: RuleStatus,
    /// IDV as a percentage of ex-showroom
    #[serde(default = "default_idv_percentage", deserialize_with = "idv_percentage_or_default")]
    pub idv_percentage: f64,
    #[serde(default = "default_gst_percentage", deserialize_with = "gst_percentage_or_default")]
    pub gst_percentage: f64,
    /// Rounding of the GST line; ceiling when absent
    #[serde(default)]
    pub gst_rounding: Rounding,
    /// Held for the authoring tools; not applied by the evaluator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncb_percentage: Option<f64>,
    /// Held for the authoring tools; not applied by the evaluator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voluntary_discount: Option<f64>,
    #[serde(default)]
    pub od_components: Vec<FormulaComponent>,
    #[serde(default)]
    pub tp_components: Vec<FormulaComponent>,
    #[serde(default)]
    pub addons: Vec<FormulaComponent>,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl InsuranceRule {
    pub fn new(
        id: &str,
        od_components: Vec<FormulaComponent>,
        tp_components: Vec<FormulaComponent>,
        addons: Vec<FormulaComponent>,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_id: None,
            rule_name: default_rule_name(),
            state_code: default_state_code(),
            insurer_name: None,
            vehicle_type: default_vehicle_type(),
            effective_from: None,
            status: RuleStatus::Active,
            idv_percentage: default_idv_percentage(),
            gst_percentage: default_gst_percentage(),
            gst_rounding: Rounding::default(),
            ncb_percentage: None,
            voluntary_discount: None,
            od_components,
            tp_components,
            addons,
            version: default_version(),
        }
    }

    pub fn for_state(mut self, state_code: &str) -> Self {
        self.state_code = state_code.to_string();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    pub fn is_catch_all(&self) -> bool {
        self.state_code.eq_ignore_ascii_case(ALL_STATES)
    }
}
