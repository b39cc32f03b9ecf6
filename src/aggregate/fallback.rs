//! Flat-rate registration estimate used when a state has no active rule

use log::warn;
use serde::{Deserialize, Serialize};

use super::rto::{FeeDefaults, RtoRecord, RtoSummary};
use crate::formula::RegistrationType;

fn default_state_rate() -> f64 {
    11.0
}
fn default_bh_rate() -> f64 {
    8.0
}
fn default_company_rate() -> f64 {
    22.0
}

/// Road tax as a flat percentage of ex-showroom, per registration type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRates {
    #[serde(default = "default_state_rate")]
    pub state: f64,
    #[serde(default = "default_bh_rate")]
    pub bh: f64,
    #[serde(default = "default_company_rate")]
    pub company: f64,
}

impl Default for FlatRates {
    fn default() -> Self {
        Self {
            state: default_state_rate(),
            bh: default_bh_rate(),
            company: default_company_rate(),
        }
    }
}

impl FlatRates {
    pub fn rate_for(&self, reg_type: RegistrationType) -> f64 {
        match reg_type {
            RegistrationType::StateIndividual | RegistrationType::Temp | RegistrationType::Other => self.state,
            RegistrationType::BhSeries => self.bh,
            RegistrationType::Company => self.company,
        }
    }

    /// Estimate for one registration type: rounded road tax plus the default fees
    pub fn summary(&self, ex_showroom: f64, reg_type: RegistrationType, fees: &FeeDefaults) -> RtoSummary {
        let road_tax = (ex_showroom * self.rate_for(reg_type) / 100.0).round();
        RtoSummary {
            total: road_tax + fees.total(),
            road_tax,
            registration_charges: fees.registration,
            smart_card_charges: fees.smart_card,
            postal_charges: fees.postal,
            cess_amount: 0.0,
            cess_rate: 0.0,
        }
    }
}

/// Flat-rate RTO record for a vehicle in a state without an active registration rule
pub fn flat_rate_record(state_code: &str, ex_showroom: f64, rates: &FlatRates, fees: &FeeDefaults) -> RtoRecord {
    warn!(
        "no active registration rule for {}: using flat rates {}/{}/{}%",
        state_code, rates.state, rates.bh, rates.company
    );
    RtoRecord {
        state: rates.summary(ex_showroom, RegistrationType::StateIndividual, fees),
        bh: rates.summary(ex_showroom, RegistrationType::BhSeries, fees),
        company: rates.summary(ex_showroom, RegistrationType::Company, fees),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_rate_record() {
        let record = flat_rate_record("GA", 100_000.0, &FlatRates::default(), &FeeDefaults::default());
        assert_eq!(record.state.road_tax, 11_000.0);
        assert_eq!(record.state.total, 11_570.0);
        assert_eq!(record.bh.total, 8_570.0);
        assert_eq!(record.company.road_tax, 22_000.0);
        assert_eq!(record.company.net_road_tax(), 22_000.0);
    }

    #[test]
    fn test_road_tax_rounds_to_rupee() {
        let summary = FlatRates::default().summary(85_555.0, RegistrationType::BhSeries, &FeeDefaults::default());
        // 8% of 85555 = 6844.4
        assert_eq!(summary.road_tax, 6_844.0);
        assert_eq!(summary.registration_charges, 300.0);
    }
}
