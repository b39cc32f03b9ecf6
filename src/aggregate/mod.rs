//! Reconciliation of evaluator output into flat, storage-ready records
//!
//! Breakdowns are reduced by line role (or label, for untagged legacy rules)
//! into RTO and insurance summaries, then combined with the ex-factory split
//! and the on-road total into one [`PriceRecord`] per price row.

mod fallback;
mod legacy;
mod onroad;
mod premium;
mod record;
mod rto;

pub use fallback::{flat_rate_record, FlatRates};
pub use legacy::{LegacyPremium, PremiumSource, ResolvedPremium};
pub use onroad::{on_road_total, ExFactorySplit, OnRoadPrice, PricingOverride, VehicleGstDefaults};
pub use premium::{AddonKind, GstSplit, InsuranceSummary};
pub use record::{PriceRecord, RowKey, RtoSource, StoredPrice, Vehicle};
pub use rto::{classify, parse_cess_rate, FeeDefaults, LineClass, RtoRecord, RtoSummary};
