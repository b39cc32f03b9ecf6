//! Pricing configuration
//!
//! Every field has a default, so a config file only needs to name what it changes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::{FeeDefaults, FlatRates, VehicleGstDefaults};
use crate::formula::FuelType;
use crate::loader::LoadError;

/// Default path of the pricing config
pub const DEFAULT_CONFIG_PATH: &str = "data/pricing_config.json";

fn default_engine_cc() -> f64 { 110.0 }
fn default_fuel_type() -> FuelType { FuelType::Petrol }
fn default_od_tenure() -> u32 { 1 }
fn default_tp_tenure() -> u32 { 5 }
fn default_chunk_size() -> usize { 500 }
fn default_legacy_gst_rate() -> f64 { 18.0 }
fn default_change_tolerance() -> f64 { 0.01 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Engine size assumed for rows that do not carry one
    #[serde(default = "default_engine_cc")]
    pub default_engine_cc: f64,

    #[serde(default = "default_fuel_type")]
    pub default_fuel_type: FuelType,

    /// Own-damage tenure quoted on new vehicles, in years
    #[serde(default = "default_od_tenure")]
    pub od_tenure: u32,

    /// Third-party tenure quoted on new vehicles, in years
    #[serde(default = "default_tp_tenure")]
    pub tp_tenure: u32,

    /// Rows evaluated together before their records are written
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// GST rate assumed when back-calculating legacy premiums
    #[serde(default = "default_legacy_gst_rate")]
    pub legacy_gst_rate: f64,

    /// Largest difference that still counts as unchanged
    #[serde(default = "default_change_tolerance")]
    pub change_tolerance: f64,

    #[serde(default)]
    pub fees: FeeDefaults,

    #[serde(default)]
    pub flat_rates: FlatRates,

    #[serde(default)]
    pub vehicle_gst: VehicleGstDefaults,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_engine_cc: default_engine_cc(),
            default_fuel_type: default_fuel_type(),
            od_tenure: default_od_tenure(),
            tp_tenure: default_tp_tenure(),
            chunk_size: default_chunk_size(),
            legacy_gst_rate: default_legacy_gst_rate(),
            change_tolerance: default_change_tolerance(),
            fees: FeeDefaults::default(),
            flat_rates: FlatRates::default(),
            vehicle_gst: VehicleGstDefaults::default(),
        }
    }
}

impl PricingConfig {
    /// Load from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::io(path, source))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::json(path, source))
    }

    /// Chunk size, never zero
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
