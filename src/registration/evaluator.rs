//! Registration evaluator: road tax, cess and RTO fees for one registration type

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::context::{CalculationContext, RegistrationScope};
use super::rule::RegistrationRule;
use crate::error::EvalError;
use crate::evaluator::{DefaultBasis, Walker};
use crate::formula::{round2, validate_sections, RegistrationType};
use crate::result::{sum_amounts, CalculationResult};

/// Evaluate a registration rule for one vehicle and registration type.
///
/// Components run in declaration order; a `RUNNING_TOTAL` percentage sees the
/// sum of every line before it. Malformed rules fail before any arithmetic.
pub fn evaluate_registration(
    rule: &RegistrationRule,
    ctx: &CalculationContext,
) -> Result<CalculationResult, EvalError> {
    check_context(rule, ctx)?;
    validate_sections(&rule.id, &[&rule.components])?;

    if ctx.reg_type == RegistrationType::Other {
        warn!("rule {}: unrecognised registration type, using the state tenure ratio", rule.id);
    }

    let config = ctx.variant_config.unwrap_or_else(|| rule.variant_config());
    if config.state_tenure == 0 {
        return Err(EvalError::invalid_context(&rule.id, "state tenure must be at least one year"));
    }

    let scope = RegistrationScope { ctx, config };
    let mut walker = Walker::new(&rule.id, &scope);
    walker.run(&rule.components, &DefaultBasis::new(ctx.ex_showroom, "Ex-Showroom"))?;

    let breakdown = walker.into_items();
    let total_amount = round2(sum_amounts(&breakdown));
    debug!(
        "registration rule {} v{} ({}): {} lines, total {:.2}",
        rule.id,
        rule.version,
        ctx.reg_type,
        breakdown.len(),
        total_amount
    );

    Ok(CalculationResult {
        breakdown,
        total_amount,
        rule_id: rule.id.clone(),
        rule_version: rule.version,
    })
}

fn check_context(rule: &RegistrationRule, ctx: &CalculationContext) -> Result<(), EvalError> {
    if !ctx.ex_showroom.is_finite() || ctx.ex_showroom < 0.0 {
        return Err(EvalError::invalid_context(
            &rule.id,
            format!("ex-showroom {} must be a non-negative amount", ctx.ex_showroom),
        ));
    }
    if !ctx.engine_cc.is_finite() || ctx.engine_cc < 0.0 {
        return Err(EvalError::invalid_context(
            &rule.id,
            format!("engine cc {} must be non-negative", ctx.engine_cc),
        ));
    }
    Ok(())
}

/// One rule evaluated for every quoted registration type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuotes {
    pub state_individual: CalculationResult,
    pub bh_series: CalculationResult,
    pub company: CalculationResult,
}

impl RegistrationQuotes {
    pub fn get(&self, reg_type: RegistrationType) -> &CalculationResult {
        match reg_type {
            RegistrationType::BhSeries => &self.bh_series,
            RegistrationType::Company => &self.company,
            RegistrationType::StateIndividual | RegistrationType::Temp | RegistrationType::Other => {
                &self.state_individual
            }
        }
    }
}

/// Evaluate `rule` as a state, BH-series and company registration.
///
/// The context's own `reg_type` is ignored; its variant config (or the rule's)
/// is shared by all three.
pub fn quote_all_types(
    rule: &RegistrationRule,
    ctx: &CalculationContext,
) -> Result<RegistrationQuotes, EvalError> {
    Ok(RegistrationQuotes {
        state_individual: evaluate_registration(rule, &ctx.for_reg_type(RegistrationType::StateIndividual))?,
        bh_series: evaluate_registration(rule, &ctx.for_reg_type(RegistrationType::BhSeries))?,
        company: evaluate_registration(rule, &ctx.for_reg_type(RegistrationType::Company))?,
    })
}
