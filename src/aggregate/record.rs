//! One storage-ready price record per vehicle and state

use serde::{Deserialize, Serialize};

use super::fallback::flat_rate_record;
use super::legacy::{LegacyPremium, PremiumSource};
use super::onroad::{on_road_total, ExFactorySplit, OnRoadPrice, PricingOverride};
use super::premium::{AddonKind, InsuranceSummary};
use super::rto::{RtoRecord, RtoSummary};
use crate::config::PricingConfig;
use crate::error::EvalError;
use crate::formula::FuelType;
use crate::insurance::{evaluate_insurance, InsuranceCalculationContext, InsuranceRule};
use crate::registration::{quote_all_types, CalculationContext, RegistrationRule};

/// How the RTO figures were produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RtoSource {
    Rule { id: String, version: u32 },
    /// No active registration rule; flat-rate estimate
    FlatRate,
}

impl RtoSource {
    fn column(&self) -> String {
        match self {
            RtoSource::Rule { id, version } => format!("{}@v{}", id, version),
            RtoSource::FlatRate => "FLAT_RATE".to_string(),
        }
    }
}

/// Vehicle facts needed to price one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub ex_showroom: f64,
    pub engine_cc: f64,
    pub fuel_type: FuelType,
    /// Vehicle GST rate, already resolved
    pub gst_rate: f64,
}

/// Identity of the stored row a record belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowKey {
    pub row_id: String,
    pub sku_id: String,
    pub state_code: String,
}

/// Summary figures already stored on a row; missing values compare as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPrice {
    pub on_road_price: Option<f64>,
    pub rto_total_state: Option<f64>,
    pub rto_total_bh: Option<f64>,
    pub rto_total_company: Option<f64>,
    pub ins_own_damage_premium_amount: Option<f64>,
    pub ins_liability_only_premium_amount: Option<f64>,
    pub ins_gross_premium: Option<f64>,
}

impl StoredPrice {
    /// Legacy rows kept only the gross premium; back-calculate the OD premium
    /// from it so change detection compares like with like.
    pub fn with_legacy_premium(&self, assumed_gst_rate: f64) -> StoredPrice {
        if self.ins_own_damage_premium_amount.is_some() {
            return *self;
        }
        let legacy = LegacyPremium {
            tp_premium: self.ins_liability_only_premium_amount,
            total_premium: self.ins_gross_premium,
            ..LegacyPremium::default()
        };
        let resolved = legacy.resolve(assumed_gst_rate);
        StoredPrice {
            ins_own_damage_premium_amount: (resolved.od_source == PremiumSource::BackCalculated)
                .then_some(resolved.od_premium),
            ..*self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub key: RowKey,
    pub ex_factory: ExFactorySplit,
    pub rto: RtoRecord,
    pub rto_source: RtoSource,
    pub insurance: InsuranceSummary,
    pub insurance_rule: String,
    pub on_road: OnRoadPrice,
}

impl PriceRecord {
    /// Price a vehicle: RTO for every registration type, insurance, ex-factory split, on-road.
    ///
    /// `registration = None` takes the flat-rate path; that is a caller decision,
    /// made visible through [`RtoSource::FlatRate`].
    pub fn build(
        key: RowKey,
        vehicle: &Vehicle,
        registration: Option<&RegistrationRule>,
        insurance: &InsuranceRule,
        adjustments: &PricingOverride,
        config: &PricingConfig,
    ) -> Result<Self, EvalError> {
        let ex_showroom = adjustments.effective_ex_showroom(vehicle.ex_showroom);

        let (rto, rto_source) = match registration {
            Some(rule) => {
                let ctx = CalculationContext::new(
                    ex_showroom,
                    vehicle.engine_cc,
                    vehicle.fuel_type,
                    crate::formula::RegistrationType::StateIndividual,
                )
                .with_variant_config(rule.variant_config());
                let quotes = quote_all_types(rule, &ctx)?;
                (
                    RtoRecord::from_quotes(&quotes, &config.fees),
                    RtoSource::Rule { id: rule.id.clone(), version: rule.version },
                )
            }
            None => (
                flat_rate_record(&key.state_code, ex_showroom, &config.flat_rates, &config.fees),
                RtoSource::FlatRate,
            ),
        };

        let ins_ctx = InsuranceCalculationContext::new(ex_showroom, vehicle.engine_cc, vehicle.fuel_type)
            .with_tenures(config.od_tenure, config.tp_tenure);
        let premium = evaluate_insurance(insurance, &ins_ctx)?;
        let summary = InsuranceSummary::from_result(&premium, insurance.gst_percentage);

        let on_road = on_road_total(ex_showroom, rto.state.total, summary.gross_premium(), adjustments);

        Ok(Self {
            key,
            ex_factory: ExFactorySplit::from_ex_showroom(ex_showroom, vehicle.gst_rate),
            rto,
            rto_source,
            insurance: summary,
            insurance_rule: format!("{}@v{}", insurance.id, insurance.version),
            on_road,
        })
    }

    /// True when any stored summary differs from this record by more than `tolerance`
    pub fn differs_from(&self, stored: &StoredPrice, tolerance: f64) -> bool {
        let pairs = [
            (stored.on_road_price, self.on_road.on_road),
            (stored.rto_total_state, self.rto.state.total),
            (stored.rto_total_bh, self.rto.bh.total),
            (stored.rto_total_company, self.rto.company.total),
            (stored.ins_own_damage_premium_amount, self.insurance.own_damage.base),
            (stored.ins_liability_only_premium_amount, self.insurance.third_party.base),
            (stored.ins_gross_premium, self.insurance.gross_premium()),
        ];
        pairs
            .iter()
            .any(|(current, next)| (current.unwrap_or(0.0) - next).abs() > tolerance)
    }

    /// Flat `(column, value)` pairs in a fixed order; every add-on kind is present
    pub fn columns(&self) -> Vec<(String, String)> {
        let mut columns = vec![
            ("id".to_string(), self.key.row_id.clone()),
            ("sku_id".to_string(), self.key.sku_id.clone()),
            ("state_code".to_string(), self.key.state_code.clone()),
            ("rto_source".to_string(), self.rto_source.column()),
            ("insurance_rule".to_string(), self.insurance_rule.clone()),
        ];
        let mut push = |name: String, value: f64| columns.push((name, format!("{:.2}", value)));

        push("ex_showroom".into(), self.ex_factory.ex_showroom);
        push("ex_factory".into(), self.ex_factory.ex_factory);
        push("ex_factory_gst_amount".into(), self.ex_factory.gst_amount);
        push("gst_rate".into(), self.ex_factory.gst_rate);
        push("on_road_price".into(), self.on_road.on_road);

        let by_type: [(&str, &RtoSummary); 3] =
            [("state", &self.rto.state), ("bh", &self.rto.bh), ("company", &self.rto.company)];
        for (suffix, rto) in by_type {
            push(format!("rto_total_{}", suffix), rto.total);
            push(format!("rto_roadtax_amount_{}", suffix), rto.net_road_tax());
            push(format!("rto_roadtax_rate_{}", suffix), rto.road_tax_rate(self.ex_factory.ex_showroom));
            push(format!("rto_roadtax_cess_amount_{}", suffix), rto.cess_amount);
            push(format!("rto_roadtax_cess_rate_{}", suffix), rto.cess_rate);
            push(format!("rto_registration_fee_{}", suffix), rto.registration_charges);
            push(format!("rto_smartcard_charges_{}", suffix), rto.smart_card_charges);
            push(format!("rto_postal_charges_{}", suffix), rto.postal_charges);
        }

        let ins = &self.insurance;
        push("ins_own_damage_premium_amount".into(), ins.own_damage.base);
        push("ins_own_damage_gst_amount".into(), ins.own_damage.gst);
        push("ins_own_damage_total_amount".into(), ins.own_damage.total);
        push("ins_liability_only_premium_amount".into(), ins.third_party.base);
        push("ins_liability_only_gst_amount".into(), ins.third_party.gst);
        push("ins_liability_only_total_amount".into(), ins.third_party.total);
        push("ins_sum_mandatory_insurance".into(), ins.mandatory.base);
        push("ins_sum_mandatory_insurance_gst_amount".into(), ins.mandatory.gst);
        push("ins_gross_premium".into(), ins.gross_premium());
        push("ins_gst_rate".into(), ins.gst_rate);

        for kind in AddonKind::ALL {
            let split = ins.addon(kind);
            push(format!("addon_{}_amount", kind.column_key()), split.base);
            push(format!("addon_{}_gst_amount", kind.column_key()), split.gst);
            push(format!("addon_{}_total_amount", kind.column_key()), split.total);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{ComponentRole, FormulaComponent, SlabRange, Variable};

    fn registration() -> RegistrationRule {
        RegistrationRule::new(
            "mh-2w",
            "MH",
            vec![
                FormulaComponent::slab(
                    "rt",
                    "Road Tax",
                    Variable::EngineCc,
                    vec![SlabRange::percentage(0.0, None, 11.0).with_cess(1.0)],
                )
                .with_role(ComponentRole::Tax),
                FormulaComponent::fixed("reg", "Registration Fee", 300.0),
                FormulaComponent::fixed("smart", "Smart Card", 200.0),
                FormulaComponent::fixed("post", "Postal Charges", 70.0),
            ],
        )
    }

    fn insurance() -> InsuranceRule {
        InsuranceRule::new(
            "ins",
            vec![FormulaComponent::fixed("od", "Own Damage", 1_000.0)],
            vec![FormulaComponent::fixed("tp", "Third Party", 500.0)],
            vec![FormulaComponent::fixed("pa", "PA Cover", 375.0)],
        )
    }

    fn vehicle() -> Vehicle {
        Vehicle { ex_showroom: 100_000.0, engine_cc: 110.0, fuel_type: FuelType::Petrol, gst_rate: 18.0 }
    }

    fn key() -> RowKey {
        RowKey { row_id: "row-1".into(), sku_id: "sku-1".into(), state_code: "MH".into() }
    }

    #[test]
    fn test_build_with_rule() {
        let record = PriceRecord::build(
            key(),
            &vehicle(),
            Some(&registration()),
            &insurance(),
            &PricingOverride::default(),
            &PricingConfig::default(),
        )
        .unwrap();

        assert_eq!(record.rto.state.total, 11_680.0);
        assert_eq!(record.rto.state.cess_amount, 110.0);
        assert_eq!(record.rto.state.cess_rate, 1.0);
        assert_eq!(record.rto.state.net_road_tax(), 11_000.0);
        assert_eq!(record.insurance.gross_premium(), 1_770.0);
        assert_eq!(record.on_road.on_road, 113_450.0);
        assert_eq!(record.rto_source, RtoSource::Rule { id: "mh-2w".into(), version: 1 });
        assert!(record.rto.bh.total < record.rto.state.total);
    }

    #[test]
    fn test_build_without_rule_uses_flat_rates() {
        let record = PriceRecord::build(
            key(),
            &vehicle(),
            None,
            &insurance(),
            &PricingOverride::default(),
            &PricingConfig::default(),
        )
        .unwrap();
        assert_eq!(record.rto_source, RtoSource::FlatRate);
        assert_eq!(record.rto.state.total, 11_570.0);
        assert_eq!(record.on_road.on_road, 113_340.0);
    }

    #[test]
    fn test_change_detection() {
        let record = PriceRecord::build(
            key(),
            &vehicle(),
            None,
            &insurance(),
            &PricingOverride::default(),
            &PricingConfig::default(),
        )
        .unwrap();
        let stored = StoredPrice {
            on_road_price: Some(113_340.005),
            rto_total_state: Some(11_570.0),
            rto_total_bh: Some(8_570.0),
            rto_total_company: Some(22_570.0),
            ins_own_damage_premium_amount: Some(1_000.0),
            ins_liability_only_premium_amount: Some(500.0),
            ins_gross_premium: Some(1_770.0),
        };
        assert!(!record.differs_from(&stored, 0.01));
        assert!(record.differs_from(&StoredPrice { ins_gross_premium: Some(1_700.0), ..stored }, 0.01));
        assert!(record.differs_from(&StoredPrice::default(), 0.01));
    }

    #[test]
    fn test_legacy_row_back_calculates_od() {
        let legacy = StoredPrice {
            ins_liability_only_premium_amount: Some(500.0),
            ins_gross_premium: Some(1_770.0),
            ..StoredPrice::default()
        };
        let resolved = legacy.with_legacy_premium(18.0);
        assert_eq!(resolved.ins_own_damage_premium_amount, Some(1_000.0));
        assert_eq!(resolved.ins_gross_premium, Some(1_770.0));

        let stored = StoredPrice { ins_own_damage_premium_amount: Some(1_234.0), ..legacy };
        assert_eq!(stored.with_legacy_premium(18.0), stored);
        assert_eq!(StoredPrice::default().with_legacy_premium(18.0), StoredPrice::default());
    }

    #[test]
    fn test_columns_are_fixed() {
        let record = PriceRecord::build(
            key(),
            &vehicle(),
            Some(&registration()),
            &insurance(),
            &PricingOverride::default(),
            &PricingConfig::default(),
        )
        .unwrap();
        let columns = record.columns();
        assert_eq!(columns[0], ("id".to_string(), "row-1".to_string()));
        assert_eq!(columns[3].1, "mh-2w@v1");
        let pa = columns.iter().find(|(name, _)| name == "addon_personal_accident_cover_total_amount").unwrap();
        assert_eq!(pa.1, "442.50");
        assert!(columns.iter().any(|(name, value)| name == "addon_key_protect_amount" && value == "0.00"));
        assert_eq!(columns.len(), 5 + 5 + 24 + 10 + 27);
    }
}
