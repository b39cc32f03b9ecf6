//! Evaluator output structures

use serde::{Deserialize, Serialize};

use crate::formula::ComponentRole;

/// One line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResultItem {
    pub label: String,
    pub amount: f64,
    /// Human-readable derivation, e.g. "11.00% of Ex-Showroom (100000.00)"
    pub meta: String,
    pub component_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ComponentRole>,
}

/// Registration evaluation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub breakdown: Vec<CalculationResultItem>,
    pub total_amount: f64,
    pub rule_id: String,
    pub rule_version: u32,
}

/// Insurance evaluation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceCalculationResult {
    pub idv: f64,
    pub od_breakdown: Vec<CalculationResultItem>,
    pub tp_breakdown: Vec<CalculationResultItem>,
    pub addon_breakdown: Vec<CalculationResultItem>,
    pub od_total: f64,
    pub tp_total: f64,
    pub addons_total: f64,
    pub net_premium: f64,
    pub gst_amount: f64,
    pub total_premium: f64,
    pub rule_id: String,
    pub rule_version: u32,
}

impl InsuranceCalculationResult {
    /// Every line in evaluation order: OD, TP, add-ons
    pub fn all_lines(&self) -> impl Iterator<Item = &CalculationResultItem> {
        self.od_breakdown
            .iter()
            .chain(self.tp_breakdown.iter())
            .chain(self.addon_breakdown.iter())
    }
}

/// Sum of line amounts
pub fn sum_amounts<'a>(items: impl IntoIterator<Item = &'a CalculationResultItem>) -> f64 {
    items.into_iter().map(|item| item.amount).sum()
}
