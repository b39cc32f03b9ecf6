//! Rounding directives and monetary rounding helpers

use serde::{Deserialize, Serialize};

/// Decimal places used to strip binary float noise before a directional
/// rounding step (e.g. 2% of 100000 evaluating to 2000.0000000000002).
const NOISE_DECIMALS: i32 = 6;

/// Per-component rounding directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rounding {
    /// Keep the raw amount (still rounded to paise)
    None,
    /// Nearest rupee, half away from zero
    Round,
    /// Next rupee up; payable government fees never round down
    #[default]
    Ceil,
    /// Previous rupee down
    Floor,
}

impl Rounding {
    /// Apply this directive to a computed amount
    pub fn apply(self, amount: f64) -> f64 {
        let clean = round_to(amount, NOISE_DECIMALS);
        match self {
            Rounding::None => round2(clean),
            Rounding::Round => clean.round(),
            Rounding::Ceil => clean.ceil(),
            Rounding::Floor => clean.floor(),
        }
    }
}

/// Round to 2 decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `numerator / denominator`, or 0 when the denominator is zero or not finite
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_is_default() {
        assert_eq!(Rounding::default(), Rounding::Ceil);
        assert_eq!(Rounding::Ceil.apply(100.2), 101.0);
        assert_eq!(Rounding::Floor.apply(100.2), 100.0);
        assert_eq!(Rounding::Round.apply(100.5), 101.0);
        assert_eq!(Rounding::None.apply(100.204), 100.2);
    }

    #[test]
    fn test_float_noise_does_not_bump_ceiling() {
        // 2% of 100000 is 2000.0000000000002 in binary floating point
        let raw = 100_000.0 * 2.0 / 100.0 + 1e-12;
        assert_eq!(Rounding::Ceil.apply(raw), 2000.0);
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(1.125), 1.13);
        assert_eq!(round2(-2.5), -2.5);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(10.0), 10.0);
    }

    #[test]
    fn test_safe_div_guards_zero() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(5.0, f64::NAN), 0.0);
        assert_eq!(safe_div(5.0, 2.0), 2.5);
    }
}
