//! Insurance evaluator: own damage, third party, add-ons and GST

use log::debug;

use super::context::{InsuranceCalculationContext, InsuranceScope};
use super::rule::InsuranceRule;
use crate::error::EvalError;
use crate::evaluator::{DefaultBasis, OwnDamageBasis, Walker};
use crate::formula::{round2, validate_sections};
use crate::result::{sum_amounts, InsuranceCalculationResult};

/// Evaluate an insurance rule for one vehicle.
///
/// OD and TP default to IDV as their basis. Add-ons default to the OD + TP
/// subtotal. GST is charged on the net premium using the rule's GST rounding.
pub fn evaluate_insurance(
    rule: &InsuranceRule,
    ctx: &InsuranceCalculationContext,
) -> Result<InsuranceCalculationResult, EvalError> {
    check_context(rule, ctx)?;
    validate_sections(&rule.id, &[&rule.od_components, &rule.tp_components, &rule.addons])?;

    if rule.ncb_percentage.is_some() || rule.voluntary_discount.is_some() {
        debug!("insurance rule {}: NCB / voluntary discount present but not applied", rule.id);
    }

    let idv = round2(ctx.custom_idv.unwrap_or(ctx.ex_showroom * rule.idv_percentage / 100.0));
    let scope = InsuranceScope { ctx, idv };
    let idv_basis = DefaultBasis::new(idv, "IDV");

    // one walker so RUNNING_TOTAL and TARGET_COMPONENT see across sections
    let mut walker = Walker::new(&rule.id, &scope).with_own_damage(OwnDamageBasis::Accumulating);
    walker.run(&rule.od_components, &idv_basis)?;
    let od_end = walker.items().len();
    walker.close_own_damage();

    walker.run(&rule.tp_components, &idv_basis)?;
    let tp_end = walker.items().len();

    let subtotal = walker.running_total();
    walker.run(&rule.addons, &DefaultBasis::new(subtotal, "OD + TP"))?;

    let mut od_breakdown = walker.into_items();
    let mut tp_breakdown = od_breakdown.split_off(od_end);
    let addon_breakdown = tp_breakdown.split_off(tp_end - od_end);

    let od_total = round2(sum_amounts(&od_breakdown));
    let tp_total = round2(sum_amounts(&tp_breakdown));
    let addons_total = round2(sum_amounts(&addon_breakdown));
    let net_premium = round2(od_total + tp_total + addons_total);
    let gst_amount = rule.gst_rounding.apply(net_premium * rule.gst_percentage / 100.0);
    let total_premium = round2(net_premium + gst_amount);

    debug!(
        "insurance rule {} v{}: idv {:.2}, od {:.2}, tp {:.2}, addons {:.2}, gst {:.2}, total {:.2}",
        rule.id, rule.version, idv, od_total, tp_total, addons_total, gst_amount, total_premium
    );

    Ok(InsuranceCalculationResult {
        idv,
        od_breakdown,
        tp_breakdown,
        addon_breakdown,
        od_total,
        tp_total,
        addons_total,
        net_premium,
        gst_amount,
        total_premium,
        rule_id: rule.id.clone(),
        rule_version: rule.version,
    })
}

fn check_context(rule: &InsuranceRule, ctx: &InsuranceCalculationContext) -> Result<(), EvalError> {
    if !ctx.ex_showroom.is_finite() || ctx.ex_showroom < 0.0 {
        return Err(EvalError::invalid_context(
            &rule.id,
            format!("ex-showroom {} must be a non-negative amount", ctx.ex_showroom),
        ));
    }
    if let Some(idv) = ctx.custom_idv {
        if !idv.is_finite() || idv < 0.0 {
            return Err(EvalError::invalid_context(&rule.id, format!("custom IDV {} is invalid", idv)));
        }
    }
    if !rule.idv_percentage.is_finite() || !rule.gst_percentage.is_finite() {
        return Err(EvalError::invalid_context(&rule.id, "IDV or GST percentage is not a number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{
        Basis, ComponentRole, FormulaComponent, FuelType, Operator, Rounding, SlabRange, Variable,
    };

    fn ctx() -> InsuranceCalculationContext {
        InsuranceCalculationContext::new(100_000.0, 110.0, FuelType::Petrol)
    }

    fn tp_slab() -> FormulaComponent {
        FormulaComponent::slab(
            "tp",
            "Third Party",
            Variable::EngineCc,
            vec![
                SlabRange::amount(0.0, Some(75.0), 2901.0),
                SlabRange::amount(75.01, Some(150.0), 3851.0),
                SlabRange::amount(150.01, Some(350.0), 7365.0),
                SlabRange::amount(350.01, None, 15117.0),
            ],
        )
        .with_role(ComponentRole::ThirdParty)
    }

    #[test]
    fn test_od_uses_idv_basis() {
        let rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::percentage("od", "Own Damage", 1.0)],
            vec![],
            vec![],
        );
        let result = evaluate_insurance(&rule, &ctx()).unwrap();
        assert_eq!(result.idv, 95_000.0);
        assert_eq!(result.od_total, 950.0);
        assert!(result.od_breakdown[0].meta.contains("IDV"));
    }

    #[test]
    fn test_custom_idv_overrides_percentage() {
        let rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::percentage("od", "Own Damage", 2.0)],
            vec![],
            vec![],
        );
        let result = evaluate_insurance(&rule, &ctx().with_custom_idv(80_000.0)).unwrap();
        assert_eq!(result.idv, 80_000.0);
        assert_eq!(result.od_total, 1_600.0);
    }

    #[test]
    fn test_gst_on_net_premium() {
        let rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::fixed("od", "Own Damage", 1000.0)],
            vec![FormulaComponent::fixed("tp", "Third Party", 500.0)],
            vec![],
        );
        let result = evaluate_insurance(&rule, &ctx()).unwrap();
        assert_eq!(result.net_premium, 1500.0);
        assert_eq!(result.gst_amount, 270.0);
        assert_eq!(result.total_premium, 1770.0);
    }

    #[test]
    fn test_gst_rounding_directive() {
        let mut rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::fixed("od", "Own Damage", 1001.0)],
            vec![],
            vec![],
        );
        // 1001 x 18% = 180.18
        assert_eq!(evaluate_insurance(&rule, &ctx()).unwrap().gst_amount, 181.0);
        rule.gst_rounding = Rounding::None;
        assert_eq!(evaluate_insurance(&rule, &ctx()).unwrap().gst_amount, 180.18);
    }

    #[test]
    fn test_tp_slab_yields_literal_amount() {
        let rule = InsuranceRule::new("ins", vec![], vec![tp_slab()], vec![]);
        let result = evaluate_insurance(&rule, &ctx()).unwrap();
        assert_eq!(result.tp_total, 3851.0);

        let big = InsuranceCalculationContext::new(300_000.0, 649.0, FuelType::Petrol);
        assert_eq!(evaluate_insurance(&rule, &big).unwrap().tp_total, 15117.0);
    }

    #[test]
    fn test_addons_default_to_mandatory_subtotal() {
        let rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::fixed("od", "Own Damage", 1000.0)],
            vec![FormulaComponent::fixed("tp", "Third Party", 500.0)],
            vec![
                FormulaComponent::percentage("rsa", "Road Side Assistance", 10.0),
                FormulaComponent::percentage("zd", "Zero Depreciation", 20.0).with_basis(Basis::OdPremium),
                FormulaComponent::fixed("pa", "PA Cover", 375.0),
            ],
        );
        let result = evaluate_insurance(&rule, &ctx()).unwrap();
        assert_eq!(result.addon_breakdown.len(), 3);
        assert_eq!(result.addon_breakdown[0].amount, 150.0);
        assert_eq!(result.addon_breakdown[1].amount, 200.0);
        assert_eq!(result.addons_total, 725.0);
        assert_eq!(result.net_premium, 2225.0);
        assert_eq!(result.od_breakdown.len(), 1);
        assert_eq!(result.tp_breakdown.len(), 1);
    }

    #[test]
    fn test_tenure_conditional() {
        let od = FormulaComponent::conditional(
            "od-tenure",
            "OD by tenure",
            Variable::OdTenure,
            Operator::GreaterThan,
            "1",
            vec![FormulaComponent::percentage("od3", "Own Damage", 4.0)],
            vec![FormulaComponent::percentage("od1", "Own Damage", 1.5)],
        );
        let rule = InsuranceRule::new("ins", vec![od], vec![], vec![]);
        assert_eq!(evaluate_insurance(&rule, &ctx()).unwrap().od_total, 1425.0);
        assert_eq!(
            evaluate_insurance(&rule, &ctx().with_tenures(3, 5)).unwrap().od_total,
            3800.0
        );
    }

    #[test]
    fn test_ncb_is_not_applied() {
        let mut rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::fixed("od", "Own Damage", 1000.0)],
            vec![],
            vec![],
        );
        rule.ncb_percentage = Some(20.0);
        rule.voluntary_discount = Some(500.0);
        assert_eq!(evaluate_insurance(&rule, &ctx()).unwrap().od_total, 1000.0);
    }

    #[test]
    fn test_malformed_addon_fails_whole_evaluation() {
        let rule = InsuranceRule::new(
            "ins-bad",
            vec![FormulaComponent::fixed("od", "Own Damage", 1000.0)],
            vec![tp_slab()],
            vec![FormulaComponent::switch("rsa", "RSA", Variable::FuelType, vec![])],
        );
        let err = evaluate_insurance(&rule, &ctx()).unwrap_err();
        assert_eq!(err.component_id(), Some("rsa"));
        assert!(err.to_string().contains("ins-bad"));
    }

    #[test]
    fn test_negative_price_is_invalid_context() {
        let rule = InsuranceRule::new("ins", vec![], vec![tp_slab()], vec![]);
        let negative = InsuranceCalculationContext::new(-5.0, 110.0, FuelType::Petrol);
        assert!(matches!(
            evaluate_insurance(&rule, &negative),
            Err(EvalError::InvalidContext { .. })
        ));
    }

    #[test]
    fn test_determinism() {
        let rule = InsuranceRule::new(
            "ins",
            vec![FormulaComponent::percentage("od", "Own Damage", 1.73)],
            vec![tp_slab()],
            vec![FormulaComponent::percentage("zd", "Zero Depreciation", 15.0)],
        );
        let a = serde_json::to_string(&evaluate_insurance(&rule, &ctx()).unwrap()).unwrap();
        let b = serde_json::to_string(&evaluate_insurance(&rule, &ctx()).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
