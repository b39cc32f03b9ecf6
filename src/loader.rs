//! Load rule books (JSON) and price rows (CSV)

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::aggregate::{PricingOverride, RowKey, StoredPrice};
use crate::batch::PriceRow;
use crate::catalog::RuleBook;

/// Default path of the sample rule book
pub const DEFAULT_RULE_BOOK_PATH: &str = "data/rule_book.json";

/// Default path of the sample price rows
pub const DEFAULT_PRICE_ROWS_PATH: &str = "data/price_rows.csv";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, row {row}: {reason}")]
    Row { path: PathBuf, row: usize, reason: String },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        LoadError::Json { path: path.to_path_buf(), source }
    }
}

/// Load a rule book from JSON
pub fn load_rule_book(path: &Path) -> Result<RuleBook, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::io(path, source))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::json(path, source))
}

/// Raw CSV row matching the price-row export columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    sku_id: String,
    #[serde(default)]
    model_name: String,
    #[serde(default)]
    vehicle_type: Option<String>,
    state_code: String,
    ex_showroom: Option<f64>,
    #[serde(default)]
    engine_cc: Option<f64>,
    #[serde(default)]
    fuel_type: Option<String>,
    /// Model-level GST rate
    #[serde(default, rename = "item_tax_rate")]
    model_gst_rate: Option<f64>,
    #[serde(default, rename = "gst_rate")]
    row_gst_rate: Option<f64>,

    // Stored summaries
    #[serde(default)]
    on_road_price: Option<f64>,
    #[serde(default)]
    rto_total_state: Option<f64>,
    #[serde(default)]
    rto_total_bh: Option<f64>,
    #[serde(default)]
    rto_total_company: Option<f64>,
    #[serde(default)]
    ins_own_damage_premium_amount: Option<f64>,
    #[serde(default)]
    ins_liability_only_premium_amount: Option<f64>,
    #[serde(default)]
    ins_gross_premium: Option<f64>,

    // Dealer adjustments
    #[serde(default)]
    ex_showroom_override: Option<f64>,
    #[serde(default)]
    discount: Option<f64>,
    #[serde(default)]
    dealer_offer: Option<f64>,
    #[serde(default)]
    on_road_override: Option<f64>,
}

impl CsvRow {
    fn to_price_row(self) -> Result<PriceRow, String> {
        if self.id.trim().is_empty() {
            return Err("missing id".to_string());
        }
        if self.state_code.trim().is_empty() {
            return Err(format!("row {} has no state code", self.id));
        }

        Ok(PriceRow {
            key: RowKey {
                row_id: self.id,
                sku_id: self.sku_id,
                state_code: self.state_code.trim().to_ascii_uppercase(),
            },
            model_name: self.model_name,
            vehicle_type: self.vehicle_type.filter(|v| !v.trim().is_empty()),
            ex_showroom: self.ex_showroom.unwrap_or(0.0),
            engine_cc: self.engine_cc.filter(|cc| *cc > 0.0),
            fuel_type: self.fuel_type.filter(|f| !f.trim().is_empty()),
            model_gst_rate: self.model_gst_rate,
            row_gst_rate: self.row_gst_rate,
            stored: StoredPrice {
                on_road_price: self.on_road_price,
                rto_total_state: self.rto_total_state,
                rto_total_bh: self.rto_total_bh,
                rto_total_company: self.rto_total_company,
                ins_own_damage_premium_amount: self.ins_own_damage_premium_amount,
                ins_liability_only_premium_amount: self.ins_liability_only_premium_amount,
                ins_gross_premium: self.ins_gross_premium,
            },
            adjustments: PricingOverride {
                ex_showroom: self.ex_showroom_override,
                discount: self.discount,
                dealer_offer: self.dealer_offer,
                on_road: self.on_road_override,
            },
        })
    }
}

/// Load price rows from CSV
pub fn load_price_rows(path: &Path) -> Result<Vec<PriceRow>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::io(path, source))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let raw = result.map_err(|source| LoadError::Csv { path: path.to_path_buf(), source })?;
        let row = raw.to_price_row().map_err(|reason| LoadError::Row {
            path: path.to_path_buf(),
            row: index + 1,
            reason,
        })?;
        rows.push(row);
    }

    Ok(rows)
}
