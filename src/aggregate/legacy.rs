//! Premium re-derivation for legacy rows that only kept summary figures

use log::warn;
use serde::{Deserialize, Serialize};

use crate::formula::safe_div;

/// Insurance figures as stored on an old quote; any of them may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPremium {
    #[serde(default)]
    pub od_premium: Option<f64>,
    #[serde(default)]
    pub tp_premium: Option<f64>,
    #[serde(default)]
    pub gst_amount: Option<f64>,
    /// Premium including GST
    #[serde(default)]
    pub total_premium: Option<f64>,
}

/// Where a resolved figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PremiumSource {
    Stored,
    /// Derived from the total under an assumed GST rate
    BackCalculated,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPremium {
    pub od_premium: f64,
    pub od_source: PremiumSource,
    pub tp_premium: f64,
    pub gst_amount: f64,
    pub gst_source: PremiumSource,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl LegacyPremium {
    /// Fill in OD and GST, back-calculating from the total when they were not stored.
    ///
    /// The back-calculation assumes every rupee of the total carried GST at
    /// `assumed_gst_rate`; it loses precision and is only meant for legacy rows.
    pub fn resolve(&self, assumed_gst_rate: f64) -> ResolvedPremium {
        let tp_premium = positive(self.tp_premium).unwrap_or(0.0);
        let total = positive(self.total_premium);
        let pre_gst = total.map(|t| safe_div(t, 1.0 + assumed_gst_rate / 100.0).round());

        let (od_premium, od_source) = match (positive(self.od_premium), total, pre_gst) {
            (Some(od), _, _) => (od, PremiumSource::Stored),
            (None, Some(total), Some(base)) => {
                warn!(
                    "back-calculating OD premium from total {:.2} at assumed GST {}%",
                    total, assumed_gst_rate
                );
                ((base - tp_premium).max(0.0), PremiumSource::BackCalculated)
            }
            _ => (0.0, PremiumSource::Missing),
        };

        let (gst_amount, gst_source) = match (positive(self.gst_amount), total, pre_gst) {
            (Some(gst), _, _) => (gst, PremiumSource::Stored),
            (None, Some(total), Some(base)) => {
                warn!(
                    "back-calculating insurance GST from total {:.2} at assumed GST {}%",
                    total, assumed_gst_rate
                );
                (total - base, PremiumSource::BackCalculated)
            }
            _ => (0.0, PremiumSource::Missing),
        };

        ResolvedPremium { od_premium, od_source, tp_premium, gst_amount, gst_source }
    }
}
