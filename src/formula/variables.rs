//! Named context variables that conditions, switches and slabs read

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fuel type of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    #[serde(rename = "EV", alias = "ELECTRIC")]
    Ev,
    #[serde(rename = "CNG")]
    Cng,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "PETROL",
            FuelType::Diesel => "DIESEL",
            FuelType::Ev => "EV",
            FuelType::Cng => "CNG",
        }
    }

    /// Parse a stored fuel label; unknown labels yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PETROL" => Some(FuelType::Petrol),
            "DIESEL" => Some(FuelType::Diesel),
            "EV" | "ELECTRIC" => Some(FuelType::Ev),
            "CNG" => Some(FuelType::Cng),
            _ => None,
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration scheme the vehicle is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationType {
    /// Regular state series, full tenure
    StateIndividual,
    /// Bharat series, shorter tenure
    BhSeries,
    /// Company-owned vehicle
    Company,
    /// Temporary registration
    Temp,
    /// Any scheme the rule engine does not know; taxed like a state registration
    #[serde(other)]
    Other,
}

impl RegistrationType {
    pub const QUOTED: [RegistrationType; 3] = [
        RegistrationType::StateIndividual,
        RegistrationType::BhSeries,
        RegistrationType::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::StateIndividual => "STATE_INDIVIDUAL",
            RegistrationType::BhSeries => "BH_SERIES",
            RegistrationType::Company => "COMPANY",
            RegistrationType::Temp => "TEMP",
            RegistrationType::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STATE_INDIVIDUAL" | "STATE" => Some(RegistrationType::StateIndividual),
            "BH_SERIES" | "BH" => Some(RegistrationType::BhSeries),
            "COMPANY" => Some(RegistrationType::Company),
            "TEMP" => Some(RegistrationType::Temp),
            _ => None,
        }
    }
}

impl fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable a condition, switch or slab can be keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variable {
    RegType,
    FuelType,
    EngineCc,
    ExShowroom,
    KwRating,
    SeatingCapacity,
    GrossVehicleWeight,
    Idv,
    OdTenure,
    TpTenure,
    IsNewVehicle,
}

/// A resolved variable value
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl VariableValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) => Some(*n),
            VariableValue::Text(s) => s.trim().parse().ok(),
            VariableValue::Flag(_) => None,
        }
    }

    /// Stringified form used by switch matching. Whole numbers drop the
    /// fractional part so `150.0` matches a case value of `"150"`.
    pub fn to_match_string(&self) -> String {
        match self {
            VariableValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            VariableValue::Number(n) => n.to_string(),
            VariableValue::Text(s) => s.clone(),
            VariableValue::Flag(b) => b.to_string(),
        }
    }
}

/// Comparison operator for conditional components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    #[serde(alias = "==")]
    Equals,
    #[serde(alias = "!=")]
    NotEquals,
    #[serde(alias = ">")]
    GreaterThan,
    #[serde(alias = "<")]
    LessThan,
    #[serde(alias = ">=")]
    GreaterThanOrEquals,
    #[serde(alias = "<=")]
    LessThanOrEquals,
}

impl Operator {
    /// Compare a resolved value against a literal.
    ///
    /// Numeric comparison is used when both sides parse as numbers; otherwise
    /// only equality operators apply, compared case-insensitively.
    pub fn compare(self, actual: &VariableValue, literal: &str) -> bool {
        if let (Some(lhs), Ok(rhs)) = (actual.as_number(), literal.trim().parse::<f64>()) {
            return match lhs.partial_cmp(&rhs) {
                Some(ordering) => self.holds(ordering),
                None => false,
            };
        }

        let equal = actual
            .to_match_string()
            .trim()
            .eq_ignore_ascii_case(literal.trim());
        match self {
            Operator::Equals => equal,
            Operator::NotEquals => !equal,
            _ => false,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Equals => ordering == Ordering::Equal,
            Operator::NotEquals => ordering != Ordering::Equal,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::GreaterThanOrEquals => ordering != Ordering::Less,
            Operator::LessThanOrEquals => ordering != Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison() {
        let cc = VariableValue::Number(150.0);
        assert!(Operator::Equals.compare(&cc, "150"));
        assert!(Operator::GreaterThanOrEquals.compare(&cc, "150"));
        assert!(!Operator::GreaterThan.compare(&cc, "150"));
        assert!(Operator::LessThan.compare(&cc, "150.5"));
        assert!(Operator::NotEquals.compare(&cc, "125"));
    }

    #[test]
    fn test_text_comparison_is_case_insensitive() {
        let reg = VariableValue::Text("BH_SERIES".to_string());
        assert!(Operator::Equals.compare(&reg, "bh_series"));
        assert!(Operator::NotEquals.compare(&reg, "COMPANY"));
        // ordering operators never hold for text
        assert!(!Operator::GreaterThan.compare(&reg, "A"));
    }

    #[test]
    fn test_flag_comparison() {
        let is_new = VariableValue::Flag(true);
        assert!(Operator::Equals.compare(&is_new, "TRUE"));
        assert!(!Operator::Equals.compare(&is_new, "false"));
    }

    #[test]
    fn test_match_string_drops_whole_fraction() {
        assert_eq!(VariableValue::Number(150.0).to_match_string(), "150");
        assert_eq!(VariableValue::Number(7.5).to_match_string(), "7.5");
    }

    #[test]
    fn test_fuel_and_reg_type_parsing() {
        assert_eq!(FuelType::parse(" electric "), Some(FuelType::Ev));
        assert_eq!(FuelType::parse("hydrogen"), None);
        assert_eq!(RegistrationType::parse("bh"), Some(RegistrationType::BhSeries));
        assert_eq!(
            serde_json::to_string(&RegistrationType::StateIndividual).unwrap(),
            "\"STATE_INDIVIDUAL\""
        );
        assert_eq!(serde_json::to_string(&FuelType::Ev).unwrap(), "\"EV\"");
    }

    #[test]
    fn test_unknown_reg_type_deserializes_as_other() {
        let reg: RegistrationType = serde_json::from_str("\"PRIVATE\"").unwrap();
        assert_eq!(reg, RegistrationType::Other);
        assert_eq!(RegistrationType::parse("PRIVATE"), None);
    }
}
