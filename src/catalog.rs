//! Rule book and active-rule selection

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, RuleKind};
use crate::insurance::{InsuranceRule, ALL_STATES};
use crate::registration::RegistrationRule;

/// Canonical vehicle-type code; registration and insurance rules spell them differently
pub fn normalize_vehicle_type(value: &str) -> String {
    let upper = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
    match upper.as_str() {
        "2W" | "TWO_WHEELER" => "TWO_WHEELER".to_string(),
        "3W" | "THREE_WHEELER" => "THREE_WHEELER".to_string(),
        "4W" | "FOUR_WHEELER" => "FOUR_WHEELER".to_string(),
        _ => upper,
    }
}

fn effective(from: Option<NaiveDate>, as_of: NaiveDate) -> bool {
    from.map_or(true, |date| date <= as_of)
}

/// All rules known to a pricing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBook {
    #[serde(default)]
    pub registration: Vec<RegistrationRule>,
    #[serde(default)]
    pub insurance: Vec<InsuranceRule>,
}

impl RuleBook {
    pub fn new(registration: Vec<RegistrationRule>, insurance: Vec<InsuranceRule>) -> Self {
        Self { registration, insurance }
    }

    /// Active registration rule for a state and vehicle type, or `None`.
    ///
    /// Among rules in force on `as_of`, the highest version wins, then the latest
    /// effective date.
    pub fn find_registration(&self, state_code: &str, vehicle_type: &str, as_of: NaiveDate) -> Option<&RegistrationRule> {
        let vehicle_type = normalize_vehicle_type(vehicle_type);
        let found = self
            .registration
            .iter()
            .filter(|rule| rule.is_active() && effective(rule.effective_from, as_of))
            .filter(|rule| rule.state_code.eq_ignore_ascii_case(state_code))
            .filter(|rule| normalize_vehicle_type(&rule.vehicle_type) == vehicle_type)
            .max_by_key(|rule| (rule.version, rule.effective_from));
        if let Some(rule) = found {
            debug!("registration rule {} v{} selected for {} {}", rule.id, rule.version, state_code, vehicle_type);
        }
        found
    }

    pub fn active_registration(
        &self,
        state_code: &str,
        vehicle_type: &str,
        as_of: NaiveDate,
    ) -> Result<&RegistrationRule, PricingError> {
        self.find_registration(state_code, vehicle_type, as_of)
            .ok_or_else(|| PricingError::NoActiveRule {
                kind: RuleKind::Registration,
                state_code: state_code.to_string(),
                vehicle_type: vehicle_type.to_string(),
            })
    }

    /// Active insurance rule for a state, falling back to the catch-all `ALL` rule
    pub fn active_insurance(
        &self,
        state_code: &str,
        vehicle_type: &str,
        as_of: NaiveDate,
    ) -> Result<&InsuranceRule, PricingError> {
        let vehicle_type_key = normalize_vehicle_type(vehicle_type);
        let pick = |state: &str| {
            self.insurance
                .iter()
                .filter(|rule| rule.is_active() && effective(rule.effective_from, as_of))
                .filter(|rule| rule.state_code.eq_ignore_ascii_case(state))
                .filter(|rule| normalize_vehicle_type(&rule.vehicle_type) == vehicle_type_key)
                .max_by_key(|rule| (rule.version, rule.effective_from))
        };

        pick(state_code)
            .or_else(|| pick(ALL_STATES))
            .ok_or_else(|| PricingError::NoActiveRule {
                kind: RuleKind::Insurance,
                state_code: state_code.to_string(),
                vehicle_type: vehicle_type.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::RuleStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reg(id: &str, state: &str, version: u32) -> RegistrationRule {
        let mut rule = RegistrationRule::new(id, state, vec![]);
        rule.version = version;
        rule
    }

    fn book() -> RuleBook {
        let mut future = reg("mh-v3", "MH", 3);
        future.effective_from = Some(date(2030, 1, 1));
        let mut retired = reg("mh-v9", "MH", 9);
        retired.status = RuleStatus::Inactive;
        let mut four_wheeler = reg("mh-4w", "MH", 5);
        four_wheeler.vehicle_type = "4W".to_string();

        RuleBook::new(
            vec![reg("mh-v1", "MH", 1), reg("mh-v2", "mh", 2), future, retired, four_wheeler],
            vec![
                InsuranceRule::new("ins-all", vec![], vec![], vec![]),
                InsuranceRule::new("ins-ka", vec![], vec![], vec![]).for_state("KA"),
            ],
        )
    }

    #[test]
    fn test_highest_active_version_in_force() {
        let book = book();
        let rule = book.active_registration("MH", "TWO_WHEELER", date(2026, 1, 1)).unwrap();
        assert_eq!(rule.id, "mh-v2");
        let later = book.active_registration("MH", "2W", date(2030, 6, 1)).unwrap();
        assert_eq!(later.id, "mh-v3");
        assert_eq!(book.active_registration("MH", "4W", date(2026, 1, 1)).unwrap().id, "mh-4w");
    }

    #[test]
    fn test_missing_registration_is_an_error() {
        let err = book().active_registration("GA", "2W", date(2026, 1, 1)).unwrap_err();
        assert!(matches!(err, PricingError::NoActiveRule { kind: RuleKind::Registration, .. }));
        assert!(err.to_string().contains("GA"));
    }

    #[test]
    fn test_insurance_falls_back_to_all() {
        let book = book();
        assert_eq!(book.active_insurance("KA", "2W", date(2026, 1, 1)).unwrap().id, "ins-ka");
        assert_eq!(book.active_insurance("MH", "2W", date(2026, 1, 1)).unwrap().id, "ins-all");
        assert!(book.active_insurance("MH", "4W", date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_vehicle_type_aliases() {
        assert_eq!(normalize_vehicle_type("2w"), "TWO_WHEELER");
        assert_eq!(normalize_vehicle_type("two-wheeler"), "TWO_WHEELER");
        assert_eq!(normalize_vehicle_type("tractor"), "TRACTOR");
    }
}
