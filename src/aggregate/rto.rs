//! Flat RTO summary from a registration breakdown

use serde::{Deserialize, Serialize};

use crate::formula::{round2, safe_div, ComponentRole};
use crate::registration::RegistrationQuotes;
use crate::result::{CalculationResult, CalculationResultItem};

fn default_registration_fee() -> f64 {
    300.0
}
fn default_smart_card_fee() -> f64 {
    200.0
}
fn default_postal_fee() -> f64 {
    70.0
}

/// Fee amounts reported when a rule produces no line of that kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeDefaults {
    #[serde(default = "default_registration_fee")]
    pub registration: f64,
    #[serde(default = "default_smart_card_fee")]
    pub smart_card: f64,
    #[serde(default = "default_postal_fee")]
    pub postal: f64,
}

impl Default for FeeDefaults {
    fn default() -> Self {
        Self {
            registration: default_registration_fee(),
            smart_card: default_smart_card_fee(),
            postal: default_postal_fee(),
        }
    }
}

impl FeeDefaults {
    pub fn total(&self) -> f64 {
        self.registration + self.smart_card + self.postal
    }
}

/// Aggregation bucket of a registration line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    RoadTax,
    Cess,
    Registration,
    SmartCard,
    Postal,
    Other,
}

/// Bucket for a line: explicit role first, then label substrings.
///
/// The label check order matters: "Road Tax Cess" is cess, not tax.
pub fn classify(item: &CalculationResultItem) -> LineClass {
    match item.role {
        Some(ComponentRole::Tax) => return LineClass::RoadTax,
        Some(ComponentRole::Cess) => return LineClass::Cess,
        Some(ComponentRole::RegistrationFee) => return LineClass::Registration,
        Some(ComponentRole::SmartCard) => return LineClass::SmartCard,
        Some(ComponentRole::Postal) => return LineClass::Postal,
        Some(ComponentRole::OwnDamage | ComponentRole::ThirdParty | ComponentRole::Addon) => {
            return LineClass::Other
        }
        None => {}
    }

    let label = item.label.to_lowercase();
    if label.contains("cess") {
        LineClass::Cess
    } else if label.contains("tax") {
        LineClass::RoadTax
    } else if label.contains("registration") {
        LineClass::Registration
    } else if label.contains("smart") {
        LineClass::SmartCard
    } else if label.contains("postal") {
        LineClass::Postal
    } else {
        LineClass::Other
    }
}

/// Rate in a cess meta string such as "2.5% Surcharge on 4000.00"
pub fn parse_cess_rate(meta: &str) -> Option<f64> {
    let lower = meta.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find('%') {
        let pct = search_from + offset;
        search_from = pct + 1;
        if !lower[pct + 1..].trim_start().starts_with("surcharge") {
            continue;
        }
        let head = &meta[..pct];
        let start = head
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
            .last()
            .map(|(i, _)| i);
        if let Some(rate) = start.and_then(|i| head[i..].parse().ok()) {
            return Some(rate);
        }
    }
    None
}

/// Flat RTO figures for one registration type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtoSummary {
    pub total: f64,
    /// Road tax including cess
    pub road_tax: f64,
    pub registration_charges: f64,
    pub smart_card_charges: f64,
    pub postal_charges: f64,
    pub cess_amount: f64,
    /// Cess as a percentage of base road tax
    pub cess_rate: f64,
}

impl RtoSummary {
    pub fn from_result(result: &CalculationResult, fees: &FeeDefaults) -> Self {
        let mut road_tax = 0.0;
        let mut cess_amount = 0.0;
        let mut cess_rate = None;
        let mut registration = None;
        let mut smart_card = None;
        let mut postal = None;

        for item in &result.breakdown {
            match classify(item) {
                LineClass::RoadTax => road_tax += item.amount,
                LineClass::Cess => {
                    cess_amount += item.amount;
                    if let Some(rate) = parse_cess_rate(&item.meta) {
                        cess_rate = Some(rate);
                    }
                }
                LineClass::Registration => registration = Some(item.amount),
                LineClass::SmartCard => smart_card = Some(item.amount),
                LineClass::Postal => postal = Some(item.amount),
                LineClass::Other => {}
            }
        }

        let cess_rate = match cess_rate {
            Some(rate) if rate != 0.0 => rate,
            _ => round2(safe_div(cess_amount * 100.0, road_tax)),
        };

        Self {
            total: result.total_amount,
            road_tax: round2(road_tax + cess_amount),
            registration_charges: registration.unwrap_or(fees.registration),
            smart_card_charges: smart_card.unwrap_or(fees.smart_card),
            postal_charges: postal.unwrap_or(fees.postal),
            cess_amount: round2(cess_amount),
            cess_rate,
        }
    }

    /// Road tax net of cess, never negative
    pub fn net_road_tax(&self) -> f64 {
        round2((self.road_tax - self.cess_amount).max(0.0))
    }

    /// Net road tax as a percentage of ex-showroom
    pub fn road_tax_rate(&self, ex_showroom: f64) -> f64 {
        round2(safe_div(self.net_road_tax() * 100.0, ex_showroom))
    }
}

/// RTO summaries for the three quoted registration types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtoRecord {
    pub state: RtoSummary,
    pub bh: RtoSummary,
    pub company: RtoSummary,
}

impl RtoRecord {
    pub fn from_quotes(quotes: &RegistrationQuotes, fees: &FeeDefaults) -> Self {
        Self {
            state: RtoSummary::from_result(&quotes.state_individual, fees),
            bh: RtoSummary::from_result(&quotes.bh_series, fees),
            company: RtoSummary::from_result(&quotes.company, fees),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(label: &str, amount: f64, meta: &str) -> CalculationResultItem {
        CalculationResultItem {
            label: label.to_string(),
            amount,
            meta: meta.to_string(),
            component_id: label.to_lowercase().replace(' ', "-"),
            role: None,
        }
    }

    fn result(breakdown: Vec<CalculationResultItem>) -> CalculationResult {
        let total_amount = breakdown.iter().map(|i| i.amount).sum();
        CalculationResult { breakdown, total_amount, rule_id: "r".into(), rule_version: 1 }
    }

    #[test]
    fn test_label_classification() {
        assert_eq!(classify(&line("Road Tax", 1.0, "")), LineClass::RoadTax);
        assert_eq!(classify(&line("Road Tax Cess", 1.0, "")), LineClass::Cess);
        assert_eq!(classify(&line("Registration Fee", 1.0, "")), LineClass::Registration);
        assert_eq!(classify(&line("Smart Card", 1.0, "")), LineClass::SmartCard);
        assert_eq!(classify(&line("Postal Charges", 1.0, "")), LineClass::Postal);
        assert_eq!(classify(&line("Hypothecation", 1.0, "")), LineClass::Other);
    }

    #[test]
    fn test_role_wins_over_label() {
        let mut item = line("Green Surcharge", 1.0, "");
        item.role = Some(ComponentRole::Tax);
        assert_eq!(classify(&item), LineClass::RoadTax);
        item.role = Some(ComponentRole::Addon);
        item.label = "Road Tax".to_string();
        assert_eq!(classify(&item), LineClass::Other);
    }

    #[test]
    fn test_parse_cess_rate() {
        assert_eq!(parse_cess_rate("2.5% Surcharge on 4000.00"), Some(2.5));
        assert_eq!(parse_cess_rate("1%  surcharge"), Some(1.0));
        assert_eq!(parse_cess_rate("10.00% of Ex-Showroom (100000.00)"), None);
        assert_eq!(parse_cess_rate("no rate here"), None);
        // a bare "% Surcharge" does not hide a later rate
        assert_eq!(parse_cess_rate("% Surcharge, then 3% Surcharge on 900.00"), Some(3.0));
    }

    #[test]
    fn test_summary_from_breakdown() {
        let summary = RtoSummary::from_result(
            &result(vec![
                line("Road Tax", 10_000.0, "Slab 0-150 (value 110): 10.00% of Ex-Showroom (100000.00)"),
                line("Road Tax Cess", 200.0, "2% Surcharge on 10000.00"),
                line("Registration Fee", 600.0, "Fixed 600.00"),
            ]),
            &FeeDefaults::default(),
        );
        assert_eq!(summary.total, 10_800.0);
        assert_eq!(summary.road_tax, 10_200.0);
        assert_eq!(summary.cess_amount, 200.0);
        assert_eq!(summary.cess_rate, 2.0);
        assert_eq!(summary.net_road_tax(), 10_000.0);
        assert_eq!(summary.road_tax_rate(100_000.0), 10.0);
        assert_eq!(summary.registration_charges, 600.0);
        // missing fee lines fall back to defaults
        assert_eq!(summary.smart_card_charges, 200.0);
        assert_eq!(summary.postal_charges, 70.0);
    }

    #[test]
    fn test_cess_rate_back_derived() {
        let summary = RtoSummary::from_result(
            &result(vec![line("Road Tax", 8_000.0, ""), line("Cess", 400.0, "Fixed 400.00")]),
            &FeeDefaults::default(),
        );
        assert_eq!(summary.cess_rate, 5.0);
    }

    #[test]
    fn test_zero_tax_guards() {
        let summary = RtoSummary::from_result(&result(vec![line("Cess", 50.0, "")]), &FeeDefaults::default());
        assert_eq!(summary.cess_rate, 0.0);
        assert_eq!(summary.net_road_tax(), 0.0);
        assert_eq!(summary.road_tax_rate(0.0), 0.0);
    }
}
