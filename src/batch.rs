//! Batch repricing of stored price rows
//!
//! Rows are evaluated in bounded chunks. Evaluation within a chunk runs in
//! parallel; records are then written one at a time, in row order. A row that
//! fails is counted and logged, and the batch moves on.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::{PriceRecord, PricingOverride, RowKey, RtoSource, StoredPrice, Vehicle};
use crate::catalog::RuleBook;
use crate::config::PricingConfig;
use crate::formula::FuelType;

/// One stored price row to reprice
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub key: RowKey,
    pub model_name: String,
    pub vehicle_type: Option<String>,
    pub ex_showroom: f64,
    pub engine_cc: Option<f64>,
    pub fuel_type: Option<String>,
    pub model_gst_rate: Option<f64>,
    pub row_gst_rate: Option<f64>,
    pub stored: StoredPrice,
    pub adjustments: PricingOverride,
}

const DEFAULT_VEHICLE_TYPE: &str = "TWO_WHEELER";

/// Result of pricing a single row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Not priceable (no price, no rule); not an error
    Skipped(String),
    Priced { record: Box<PriceRecord>, changed: bool },
    Failed(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing price records: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error writing price records: {0}")]
    Csv(#[from] csv::Error),

    #[error("record for row {row_id} rejected: {reason}")]
    Rejected { row_id: String, reason: String },
}

/// Destination of repriced records
pub trait PriceSink {
    fn write(&mut self, record: &PriceRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes flat records as CSV; the header comes from the first record
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl<W: Write> PriceSink for CsvSink<W> {
    fn write(&mut self, record: &PriceRecord) -> Result<(), SinkError> {
        let columns = record.columns();
        if !self.header_written {
            self.writer.write_record(columns.iter().map(|(name, _)| name.as_str()))?;
            self.header_written = true;
        }
        self.writer.write_record(columns.iter().map(|(_, value)| value.as_str()))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory; rows listed in `reject` fail to write
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<PriceRecord>,
    pub reject: HashSet<String>,
}

impl PriceSink for MemorySink {
    fn write(&mut self, record: &PriceRecord) -> Result<(), SinkError> {
        if self.reject.contains(&record.key.row_id) {
            return Err(SinkError::Rejected {
                row_id: record.key.row_id.clone(),
                reason: "write refused".to_string(),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }
}

/// Batch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub scanned: usize,
    pub changed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Priced rows whose RTO came from the flat-rate table
    pub flat_rate: usize,
}

/// Reprices rows against one rule book snapshot
pub struct RepricingRunner<'a> {
    rules: &'a RuleBook,
    config: PricingConfig,
    as_of: NaiveDate,
    apply: bool,
}

impl<'a> RepricingRunner<'a> {
    /// Dry-run runner; see [`RepricingRunner::with_apply`]
    pub fn new(rules: &'a RuleBook, config: PricingConfig, as_of: NaiveDate) -> Self {
        Self { rules, config, as_of, apply: false }
    }

    /// Write changed records to the sink instead of only counting them
    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    /// Price one row. Pure; safe to call from many threads.
    pub fn price_row(&self, row: &PriceRow) -> RowOutcome {
        if !row.ex_showroom.is_finite() || row.ex_showroom <= 0.0 {
            return RowOutcome::Skipped(format!("row {} has no ex-showroom price", row.key.row_id));
        }

        let fuel_type = match row.fuel_type.as_deref() {
            None => self.config.default_fuel_type,
            Some(raw) => match FuelType::parse(raw) {
                Some(fuel) => fuel,
                None => return RowOutcome::Failed(format!("row {}: unknown fuel type '{}'", row.key.row_id, raw)),
            },
        };
        let engine_cc = row.engine_cc.unwrap_or(self.config.default_engine_cc);
        let vehicle_type = row.vehicle_type.as_deref().unwrap_or(DEFAULT_VEHICLE_TYPE);
        let state = row.key.state_code.as_str();

        let insurance = match self.rules.active_insurance(state, vehicle_type, self.as_of) {
            Ok(rule) => rule,
            Err(err) => return RowOutcome::Skipped(format!("row {}: {}", row.key.row_id, err)),
        };
        let registration = self.rules.find_registration(state, vehicle_type, self.as_of);

        let vehicle = Vehicle {
            ex_showroom: row.ex_showroom,
            engine_cc,
            fuel_type,
            gst_rate: self.config.vehicle_gst.resolve(row.model_gst_rate, row.row_gst_rate, engine_cc),
        };

        match PriceRecord::build(row.key.clone(), &vehicle, registration, insurance, &row.adjustments, &self.config) {
            Ok(record) => {
                let stored = row.stored.with_legacy_premium(self.config.legacy_gst_rate);
                let changed = record.differs_from(&stored, self.config.change_tolerance);
                RowOutcome::Priced { record: Box::new(record), changed }
            }
            Err(err) => RowOutcome::Failed(format!("row {}: {}", row.key.row_id, err)),
        }
    }

    /// Reprice every row; changed records go to `sink` when applying
    pub fn run(&self, rows: &[PriceRow], sink: &mut dyn PriceSink) -> Result<BatchReport, SinkError> {
        let mut report = BatchReport::default();
        info!(
            "repricing {} rows as of {} ({})",
            rows.len(),
            self.as_of,
            if self.apply { "APPLY" } else { "DRY-RUN" }
        );

        for chunk in rows.chunks(self.config.chunk_size()) {
            let outcomes: Vec<RowOutcome> = chunk.par_iter().map(|row| self.price_row(row)).collect();

            for outcome in outcomes {
                report.scanned += 1;
                match outcome {
                    RowOutcome::Skipped(reason) => {
                        warn!("skipped: {}", reason);
                        report.skipped += 1;
                    }
                    RowOutcome::Failed(reason) => {
                        error!("failed: {}", reason);
                        report.failed += 1;
                    }
                    RowOutcome::Priced { record, changed } => {
                        if record.rto_source == RtoSource::FlatRate {
                            report.flat_rate += 1;
                        }
                        if !changed {
                            continue;
                        }
                        report.changed += 1;
                        if !self.apply {
                            continue;
                        }
                        match sink.write(&record) {
                            Ok(()) => report.updated += 1,
                            Err(err) => {
                                error!("update failed for row {}: {}", record.key.row_id, err);
                                report.failed += 1;
                            }
                        }
                    }
                }
            }
        }

        sink.flush()?;
        info!(
            "scanned={} changed={} updated={} skipped={} failed={} flat_rate={}",
            report.scanned, report.changed, report.updated, report.skipped, report.failed, report.flat_rate
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{FormulaComponent, SlabRange, Variable};
    use crate::insurance::InsuranceRule;
    use crate::registration::RegistrationRule;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn rules() -> RuleBook {
        RuleBook::new(
            vec![
                RegistrationRule::new(
                    "mh-2w",
                    "MH",
                    vec![
                        FormulaComponent::slab(
                            "rt",
                            "Road Tax",
                            Variable::EngineCc,
                            vec![SlabRange::percentage(0.0, None, 11.0)],
                        ),
                        FormulaComponent::fixed("reg", "Registration Fee", 300.0),
                    ],
                ),
                RegistrationRule::new(
                    "ka-2w",
                    "KA",
                    vec![FormulaComponent::slab("rt", "Road Tax", Variable::EngineCc, vec![])],
                ),
            ],
            vec![InsuranceRule::new(
                "ins",
                vec![FormulaComponent::percentage("od", "Own Damage", 1.0)],
                vec![FormulaComponent::fixed("tp", "Third Party", 714.0)],
                vec![],
            )],
        )
    }

    fn row(id: &str, state: &str, ex_showroom: f64) -> PriceRow {
        PriceRow {
            key: RowKey { row_id: id.into(), sku_id: format!("sku-{}", id), state_code: state.into() },
            model_name: "Test 110".into(),
            vehicle_type: None,
            ex_showroom,
            engine_cc: Some(110.0),
            fuel_type: Some("PETROL".into()),
            model_gst_rate: None,
            row_gst_rate: None,
            stored: StoredPrice::default(),
            adjustments: PricingOverride::default(),
        }
    }

    #[test]
    fn test_counters_and_isolation() {
        let rules = rules();
        let mut fuel = row("5", "MH", 90_000.0);
        fuel.fuel_type = Some("HYDROGEN".into());
        let rows = vec![
            row("1", "MH", 100_000.0),
            row("2", "MH", 0.0),
            row("3", "KA", 100_000.0),
            row("4", "GA", 100_000.0),
            fuel,
        ];

        let config = PricingConfig { chunk_size: 2, ..PricingConfig::default() };
        let mut sink = MemorySink::default();
        let report = RepricingRunner::new(&rules, config, as_of())
            .with_apply(true)
            .run(&rows, &mut sink)
            .unwrap();

        assert_eq!(report.scanned, 5);
        assert_eq!(report.skipped, 1);
        // malformed KA rule and unknown fuel
        assert_eq!(report.failed, 2);
        assert_eq!(report.changed, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.flat_rate, 1);
        assert_eq!(sink.records[0].key.row_id, "1");
        assert_eq!(sink.records[1].rto_source, RtoSource::FlatRate);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let rules = rules();
        let mut sink = MemorySink::default();
        let report = RepricingRunner::new(&rules, PricingConfig::default(), as_of())
            .run(&[row("1", "MH", 100_000.0)], &mut sink)
            .unwrap();
        assert_eq!(report.changed, 1);
        assert_eq!(report.updated, 0);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_unchanged_row_is_not_rewritten() {
        let rules = rules();
        let runner = RepricingRunner::new(&rules, PricingConfig::default(), as_of()).with_apply(true);
        let RowOutcome::Priced { record, .. } = runner.price_row(&row("1", "MH", 100_000.0)) else {
            panic!("expected the row to price");
        };

        let mut current = row("1", "MH", 100_000.0);
        current.stored = StoredPrice {
            on_road_price: Some(record.on_road.on_road),
            rto_total_state: Some(record.rto.state.total),
            rto_total_bh: Some(record.rto.bh.total),
            rto_total_company: Some(record.rto.company.total),
            ins_own_damage_premium_amount: Some(record.insurance.own_damage.base),
            ins_liability_only_premium_amount: Some(record.insurance.third_party.base),
            ins_gross_premium: Some(record.insurance.gross_premium()),
        };

        let mut sink = MemorySink::default();
        let report = runner.run(&[current], &mut sink).unwrap();
        assert_eq!(report.changed, 0);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_write_failure_counts_as_failed() {
        let rules = rules();
        let mut sink = MemorySink::default();
        sink.reject.insert("1".to_string());
        let report = RepricingRunner::new(&rules, PricingConfig::default(), as_of())
            .with_apply(true)
            .run(&[row("1", "MH", 100_000.0), row("2", "MH", 120_000.0)], &mut sink)
            .unwrap();
        assert_eq!(report.changed, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_csv_sink_writes_header_once() {
        let rules = rules();
        let mut sink = CsvSink::new(Vec::new());
        RepricingRunner::new(&rules, PricingConfig::default(), as_of())
            .with_apply(true)
            .run(&[row("1", "MH", 100_000.0), row("2", "MH", 120_000.0)], &mut sink)
            .unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,sku_id,state_code"));
        assert!(lines[1].starts_with("1,sku-1,MH,mh-2w@v1"));
    }
}
