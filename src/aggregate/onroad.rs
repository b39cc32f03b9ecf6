//! Ex-factory split and on-road total

use serde::{Deserialize, Serialize};

use crate::formula::round2;

fn default_standard_rate() -> f64 {
    18.0
}
fn default_large_engine_rate() -> f64 {
    40.0
}
fn default_large_engine_cc() -> f64 {
    350.0
}

/// Vehicle GST used when neither the model nor the price row carries a rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleGstDefaults {
    #[serde(default = "default_standard_rate")]
    pub standard_rate: f64,
    /// Applies strictly above `large_engine_cc`
    #[serde(default = "default_large_engine_rate")]
    pub large_engine_rate: f64,
    #[serde(default = "default_large_engine_cc")]
    pub large_engine_cc: f64,
}

impl Default for VehicleGstDefaults {
    fn default() -> Self {
        Self {
            standard_rate: default_standard_rate(),
            large_engine_rate: default_large_engine_rate(),
            large_engine_cc: default_large_engine_cc(),
        }
    }
}

impl VehicleGstDefaults {
    /// Model rate, else row rate, else the engine-size default
    pub fn resolve(&self, model_rate: Option<f64>, row_rate: Option<f64>, engine_cc: f64) -> f64 {
        let usable = |rate: Option<f64>| rate.filter(|r| r.is_finite() && *r > 0.0);
        usable(model_rate).or_else(|| usable(row_rate)).unwrap_or(if engine_cc > self.large_engine_cc {
            self.large_engine_rate
        } else {
            self.standard_rate
        })
    }
}

/// Ex-showroom price split into its pre-GST part and GST
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExFactorySplit {
    pub ex_showroom: f64,
    pub ex_factory: f64,
    pub gst_amount: f64,
    pub gst_rate: f64,
}

impl ExFactorySplit {
    pub fn from_ex_showroom(ex_showroom: f64, gst_rate: f64) -> Self {
        let divisor = 1.0 + gst_rate / 100.0;
        let ex_factory = if divisor > 0.0 { round2(ex_showroom / divisor) } else { ex_showroom };
        Self {
            ex_showroom,
            ex_factory,
            gst_amount: round2(ex_showroom - ex_factory),
            gst_rate,
        }
    }
}

/// Manual adjustments a dealer may apply to a computed price
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOverride {
    #[serde(default)]
    pub ex_showroom: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub dealer_offer: Option<f64>,
    /// Final figure; wins over everything else
    #[serde(default)]
    pub on_road: Option<f64>,
}

impl PricingOverride {
    /// Ex-showroom to price with
    pub fn effective_ex_showroom(&self, base: f64) -> f64 {
        self.ex_showroom.filter(|v| *v > 0.0).unwrap_or(base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnRoadPrice {
    pub ex_showroom: f64,
    pub rto_total: f64,
    pub insurance_total: f64,
    /// Before discounts and overrides
    pub calculated: f64,
    pub on_road: f64,
    pub overridden: bool,
}

/// `ex_showroom + rto + insurance`, less discount and dealer offer; an on-road override replaces the result
pub fn on_road_total(
    ex_showroom: f64,
    rto_total: f64,
    insurance_total: f64,
    adjustments: &PricingOverride,
) -> OnRoadPrice {
    let calculated = round2(ex_showroom + rto_total + insurance_total);
    let mut on_road = calculated;
    for deduction in [adjustments.discount, adjustments.dealer_offer].into_iter().flatten() {
        on_road -= deduction;
    }

    let manual = adjustments.on_road.filter(|v| *v > 0.0);
    OnRoadPrice {
        ex_showroom,
        rto_total,
        insurance_total,
        calculated,
        on_road: round2(manual.unwrap_or(on_road)),
        overridden: manual.is_some(),
    }
}
