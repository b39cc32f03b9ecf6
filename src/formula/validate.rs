//! Structural validation of component trees
//!
//! Runs before any arithmetic so a malformed rule never yields a partial total.

use std::collections::HashSet;

use super::component::{Basis, ComponentKind, FormulaComponent, SlabRange};
use crate::error::EvalError;

/// Maximum nesting of conditional / switch blocks
pub const MAX_NESTING_DEPTH: usize = 16;

/// Validate every component list of a rule.
///
/// `sections` are validated as one rule: a `TARGET_COMPONENT` basis may point
/// at a component in any section.
pub fn validate_sections(rule_id: &str, sections: &[&[FormulaComponent]]) -> Result<(), EvalError> {
    let mut ids = HashSet::new();
    for section in sections {
        collect_ids(section, &mut ids, 1);
    }

    for section in sections {
        validate_block(rule_id, section, &ids, 1)?;
    }
    Ok(())
}

// Stops at the depth limit; validate_block rejects anything below it
fn collect_ids<'a>(components: &'a [FormulaComponent], ids: &mut HashSet<&'a str>, depth: usize) {
    if depth > MAX_NESTING_DEPTH {
        return;
    }
    for component in components {
        ids.insert(component.id.as_str());
        for block in component.blocks() {
            collect_ids(block, ids, depth + 1);
        }
    }
}

fn validate_block(
    rule_id: &str,
    components: &[FormulaComponent],
    ids: &HashSet<&str>,
    depth: usize,
) -> Result<(), EvalError> {
    for component in components {
        if depth > MAX_NESTING_DEPTH {
            return Err(EvalError::malformed(
                rule_id,
                &component.id,
                format!("nested deeper than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        validate_component(rule_id, component, ids)?;
        for block in component.blocks() {
            validate_block(rule_id, block, ids, depth + 1)?;
        }
    }
    Ok(())
}

fn validate_component(
    rule_id: &str,
    component: &FormulaComponent,
    ids: &HashSet<&str>,
) -> Result<(), EvalError> {
    let fail = |reason: String| Err(EvalError::malformed(rule_id, &component.id, reason));

    if component.id.trim().is_empty() {
        return fail(format!("{} component '{}' has no id", component.kind_name(), component.label));
    }

    match &component.kind {
        ComponentKind::Fixed { amount, fuel_matrix } => {
            if !amount.is_finite() || fuel_matrix.iter().flat_map(|m| m.values()).any(|v| !v.is_finite()) {
                return fail("fixed amount is not a finite number".to_string());
            }
        }
        ComponentKind::Percentage { percentage, basis, fuel_matrix } => {
            if !percentage.is_finite() || fuel_matrix.iter().flat_map(|m| m.values()).any(|v| !v.is_finite()) {
                return fail("percentage is not a finite number".to_string());
            }
            check_target(rule_id, component, basis.as_ref(), ids)?;
        }
        ComponentKind::Conditional { .. } => {}
        ComponentKind::Switch { cases, .. } => {
            if cases.is_empty() {
                return fail("switch has no cases".to_string());
            }
        }
        ComponentKind::Slab { ranges, basis, secondary_slabs, .. } => {
            if ranges.is_empty() {
                return fail("slab has no ranges".to_string());
            }
            check_ranges(rule_id, &component.id, ranges)?;
            check_target(rule_id, component, basis.as_ref(), ids)?;
            for secondary in secondary_slabs {
                if secondary.ranges.is_empty() {
                    return fail(format!("secondary slab '{}' has no ranges", secondary.id));
                }
                if secondary.applicable_fuels.is_empty() && secondary.applicable_reg_types.is_empty() {
                    return fail(format!(
                        "secondary slab '{}' has no fuel or registration-type gate",
                        secondary.id
                    ));
                }
                check_ranges(rule_id, &component.id, &secondary.ranges)?;
            }
        }
    }
    Ok(())
}

fn check_ranges(rule_id: &str, component_id: &str, ranges: &[SlabRange]) -> Result<(), EvalError> {
    for range in ranges {
        let bounds_ok = range.min.is_finite() && range.max.map_or(true, |max| max.is_finite() && max >= range.min);
        let values_ok = range.rate.value().is_finite() && range.cess_percentage.map_or(true, f64::is_finite);
        if !bounds_ok || !values_ok {
            return Err(EvalError::malformed(
                rule_id,
                component_id,
                format!("slab range '{}' [{} - {:?}] is invalid", range.id, range.min, range.max),
            ));
        }
    }
    Ok(())
}

fn check_target(
    rule_id: &str,
    component: &FormulaComponent,
    basis: Option<&Basis>,
    ids: &HashSet<&str>,
) -> Result<(), EvalError> {
    if let Some(Basis::TargetComponent(target)) = basis {
        if target == &component.id {
            return Err(EvalError::malformed(rule_id, &component.id, "targets itself".to_string()));
        }
        if !ids.contains(target.as_str()) {
            return Err(EvalError::malformed(
                rule_id,
                &component.id,
                format!("target component '{}' does not exist", target),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Operator, SlabRange, SwitchCase, Variable};

    fn component_id(err: EvalError) -> String {
        match err {
            EvalError::MalformedRule { component_id, .. } => component_id,
            other => panic!("expected MalformedRule, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_slab_is_malformed() {
        let components = vec![FormulaComponent::slab("rt", "Road Tax", Variable::EngineCc, vec![])];
        let err = validate_sections("rule-1", &[&components]).unwrap_err();
        assert_eq!(component_id(err), "rt");
    }

    #[test]
    fn test_empty_switch_nested_in_conditional_is_malformed() {
        let components = vec![FormulaComponent::conditional(
            "cond",
            "Fuel split",
            Variable::RegType,
            Operator::Equals,
            "COMPANY",
            vec![FormulaComponent::switch("sw", "By fuel", Variable::FuelType, vec![])],
            vec![],
        )];
        let err = validate_sections("rule-1", &[&components]).unwrap_err();
        assert_eq!(component_id(err), "sw");
    }

    #[test]
    fn test_inverted_range_is_malformed() {
        let components = vec![FormulaComponent::slab(
            "rt",
            "Road Tax",
            Variable::EngineCc,
            vec![SlabRange::percentage(200.0, Some(100.0), 10.0)],
        )];
        assert!(validate_sections("rule-1", &[&components]).is_err());
    }

    #[test]
    fn test_unknown_target_is_malformed() {
        let components = vec![FormulaComponent::percentage("cess", "Cess", 2.0)
            .with_basis(Basis::TargetComponent("missing".to_string()))];
        let err = validate_sections("rule-1", &[&components]).unwrap_err();
        assert_eq!(component_id(err), "cess");
    }

    #[test]
    fn test_target_in_other_section_is_valid() {
        let od = vec![FormulaComponent::percentage("od", "Own Damage", 1.5)];
        let addons = vec![FormulaComponent::percentage("zd", "Zero Depreciation", 10.0)
            .with_basis(Basis::TargetComponent("od".to_string()))];
        assert!(validate_sections("rule-1", &[&od, &addons]).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let mut block = vec![FormulaComponent::fixed("leaf", "Fee", 10.0)];
        for depth in 0..MAX_NESTING_DEPTH {
            block = vec![FormulaComponent::switch(
                &format!("sw{}", depth),
                "Nest",
                Variable::FuelType,
                vec![SwitchCase::new("PETROL", block)],
            )];
        }
        // sixteen switches plus the leaf is seventeen levels
        let err = validate_sections("rule-1", &[&block]).unwrap_err();
        assert_eq!(component_id(err), "leaf");
    }

    #[test]
    fn test_deep_tree_built_in_code_is_rejected() {
        let levels = 2_000;
        let mut block = vec![FormulaComponent::fixed("leaf", "Fee", 10.0)];
        for depth in 0..levels {
            block = vec![FormulaComponent::switch(
                &format!("sw{}", depth),
                "Nest",
                Variable::FuelType,
                vec![SwitchCase::new("PETROL", block)],
            )];
        }
        let mut ids = HashSet::new();
        collect_ids(&block, &mut ids, 1);
        assert_eq!(ids.len(), MAX_NESTING_DEPTH);
        assert!(!ids.contains("leaf"));

        let err = validate_sections("rule-1", &[&block]).unwrap_err();
        assert_eq!(component_id(err), format!("sw{}", levels - MAX_NESTING_DEPTH - 1));
    }
}
