//! On-road price CLI
//!
//! Prices one vehicle against a rule book: RTO for every registration type,
//! the insurance premium, and the resulting on-road total.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;

use onroad_pricing::aggregate::{PricingOverride, RowKey};
use onroad_pricing::loader::{load_rule_book, DEFAULT_RULE_BOOK_PATH};
use onroad_pricing::registration::RegistrationQuotes;
use onroad_pricing::{
    evaluate_insurance, quote_all_types, CalculationContext, CalculationResultItem, FuelType,
    InsuranceCalculationContext, InsuranceCalculationResult, PriceRecord, PricingConfig, RegistrationType,
    Vehicle,
};

#[derive(Parser, Debug)]
#[command(name = "onroad", about = "Quote the on-road price of a vehicle", version)]
struct Cli {
    /// Rule book JSON
    #[arg(long, default_value = DEFAULT_RULE_BOOK_PATH)]
    rules: PathBuf,
    /// Pricing config JSON (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// State code, e.g. MH
    #[arg(long)]
    state: String,
    #[arg(long, default_value = "2W")]
    vehicle_type: String,
    #[arg(long)]
    ex_showroom: f64,
    /// Engine displacement (defaults to the configured engine size)
    #[arg(long)]
    engine_cc: Option<f64>,
    #[arg(long, value_parser = parse_fuel)]
    fuel: Option<FuelType>,
    /// Vehicle GST rate; derived from engine size when omitted
    #[arg(long)]
    gst_rate: Option<f64>,
    /// Rule selection date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    #[arg(long)]
    discount: Option<f64>,
    #[arg(long)]
    dealer_offer: Option<f64>,
    /// Final on-road figure; replaces the computed total
    #[arg(long)]
    on_road_override: Option<f64>,
    /// Refuse to fall back to flat RTO rates when the state has no rule
    #[arg(long)]
    strict: bool,
    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn parse_fuel(raw: &str) -> Result<FuelType, String> {
    FuelType::parse(raw).ok_or_else(|| format!("unknown fuel type '{raw}' (PETROL, DIESEL, EV, CNG)"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    registration: Option<RegistrationQuotes>,
    insurance: InsuranceCalculationResult,
    record: PriceRecord,
}

fn print_lines(title: &str, lines: &[CalculationResultItem], total: f64) {
    println!("{}", title);
    println!("{}", "-".repeat(78));
    for line in lines {
        println!("  {:<28} {:>12.2}   {}", line.label, line.amount, line.meta);
    }
    println!("  {:<28} {:>12.2}", "Total", total);
    println!();
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PricingConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => PricingConfig::default(),
    };
    let rules = load_rule_book(&cli.rules).with_context(|| format!("loading {}", cli.rules.display()))?;
    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let state = cli.state.trim().to_ascii_uppercase();

    let adjustments = PricingOverride {
        ex_showroom: None,
        discount: cli.discount,
        dealer_offer: cli.dealer_offer,
        on_road: cli.on_road_override,
    };
    let engine_cc = cli.engine_cc.unwrap_or(config.default_engine_cc);
    let vehicle = Vehicle {
        ex_showroom: cli.ex_showroom,
        engine_cc,
        fuel_type: cli.fuel.unwrap_or(config.default_fuel_type),
        gst_rate: config.vehicle_gst.resolve(None, cli.gst_rate, engine_cc),
    };

    let registration_rule = rules.find_registration(&state, &cli.vehicle_type, as_of);
    if registration_rule.is_none() && cli.strict {
        rules.active_registration(&state, &cli.vehicle_type, as_of)?;
    }
    let insurance_rule = rules.active_insurance(&state, &cli.vehicle_type, as_of)?;

    let registration = match registration_rule {
        Some(rule) => {
            let ctx = CalculationContext::new(
                vehicle.ex_showroom,
                vehicle.engine_cc,
                vehicle.fuel_type,
                RegistrationType::StateIndividual,
            )
            .with_variant_config(rule.variant_config());
            Some(quote_all_types(rule, &ctx).context("evaluating registration rule")?)
        }
        None => None,
    };

    let ins_ctx = InsuranceCalculationContext::new(vehicle.ex_showroom, vehicle.engine_cc, vehicle.fuel_type)
        .with_tenures(config.od_tenure, config.tp_tenure);
    let insurance = evaluate_insurance(insurance_rule, &ins_ctx).context("evaluating insurance rule")?;

    let key = RowKey { row_id: "cli".to_string(), sku_id: String::new(), state_code: state.clone() };
    let record = PriceRecord::build(key, &vehicle, registration_rule, insurance_rule, &adjustments, &config)?;
    if !record.on_road.on_road.is_finite() {
        bail!("on-road total is not a number");
    }

    if cli.json {
        let output = QuoteOutput { registration, insurance, record };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("On-road quote: {} {} as of {}", state, cli.vehicle_type, as_of);
    println!("======================================\n");

    match &registration {
        Some(quotes) => {
            for reg_type in RegistrationType::QUOTED {
                let result = quotes.get(reg_type);
                print_lines(
                    &format!("RTO {} (rule {} v{})", reg_type, result.rule_id, result.rule_version),
                    &result.breakdown,
                    result.total_amount,
                );
            }
        }
        None => println!("No active registration rule for {}: flat-rate RTO estimate\n", state),
    }

    let ins_title = format!("Insurance (rule {} v{}, IDV {:.2})", insurance.rule_id, insurance.rule_version, insurance.idv);
    let lines: Vec<CalculationResultItem> = insurance.all_lines().cloned().collect();
    print_lines(&ins_title, &lines, insurance.net_premium);
    println!("  GST {:>39.2}", insurance.gst_amount);
    println!("  Total premium {:>29.2}\n", insurance.total_premium);

    println!("Summary");
    println!("{}", "-".repeat(78));
    println!("  Ex-showroom          {:>12.2}", record.ex_factory.ex_showroom);
    println!("  Ex-factory           {:>12.2}  (GST {:.2} at {}%)", record.ex_factory.ex_factory, record.ex_factory.gst_amount, record.ex_factory.gst_rate);
    println!("  RTO (state)          {:>12.2}", record.rto.state.total);
    println!("  RTO (BH)             {:>12.2}", record.rto.bh.total);
    println!("  RTO (company)        {:>12.2}", record.rto.company.total);
    println!("  Insurance (gross)    {:>12.2}", record.insurance.gross_premium());
    println!("  On-road              {:>12.2}{}", record.on_road.on_road, if record.on_road.overridden { "  (override)" } else { "" });

    Ok(())
}
