//! Flat insurance summary: premium parts with GST, mandatory sum and add-on columns

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formula::round2;
use crate::result::{sum_amounts, CalculationResultItem, InsuranceCalculationResult};

/// A premium part split into base, GST and total, each rounded to paise
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstSplit {
    pub base: f64,
    pub gst: f64,
    pub total: f64,
}

impl GstSplit {
    pub fn on(base: f64, gst_rate: f64) -> Self {
        let base = round2(base);
        let gst = round2(base * gst_rate / 100.0);
        Self { base, gst, total: round2(base + gst) }
    }

    /// Part-wise sum; totals are recomputed from the summed base and GST
    pub fn combine(&self, other: &GstSplit) -> Self {
        let base = round2(self.base + other.base);
        let gst = round2(self.gst + other.gst);
        Self { base, gst, total: round2(base + gst) }
    }
}

/// Canonical add-on covers stored as their own columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonKind {
    PersonalAccidentCover,
    ZeroDepreciation,
    ReturnToInvoice,
    ConsumablesCover,
    EngineProtector,
    RoadsideAssistance,
    KeyProtect,
    TyreProtect,
    PillionCover,
}

impl AddonKind {
    pub const ALL: [AddonKind; 9] = [
        AddonKind::PersonalAccidentCover,
        AddonKind::ZeroDepreciation,
        AddonKind::ReturnToInvoice,
        AddonKind::ConsumablesCover,
        AddonKind::EngineProtector,
        AddonKind::RoadsideAssistance,
        AddonKind::KeyProtect,
        AddonKind::TyreProtect,
        AddonKind::PillionCover,
    ];

    /// Storage column stem, e.g. `addon_<key>_amount`
    pub fn column_key(&self) -> &'static str {
        match self {
            AddonKind::PersonalAccidentCover => "personal_accident_cover",
            AddonKind::ZeroDepreciation => "zero_depreciation",
            AddonKind::ReturnToInvoice => "return_to_invoice",
            AddonKind::ConsumablesCover => "consumables_cover",
            AddonKind::EngineProtector => "engine_protector",
            AddonKind::RoadsideAssistance => "roadside_assistance",
            AddonKind::KeyProtect => "key_protect",
            AddonKind::TyreProtect => "tyre_protect",
            AddonKind::PillionCover => "pillion_cover",
        }
    }

    /// Map a free-form add-on label onto a canonical kind
    pub fn from_label(label: &str) -> Option<AddonKind> {
        let key = normalize_label(label);
        if is_uuid_like(&key) {
            return None;
        }
        let kind = match key.as_str() {
            "personal_accident_cover" | "personal_accident_pa_cover" | "pa_cover" | "pa" => {
                AddonKind::PersonalAccidentCover
            }
            "zero_depreciation" | "zero_dep" => AddonKind::ZeroDepreciation,
            "return_to_invoice_rti" | "return_to_invoice" | "rti" => AddonKind::ReturnToInvoice,
            "consumables_cover" | "consumables" => AddonKind::ConsumablesCover,
            "engine_protection" | "engine_protector" => AddonKind::EngineProtector,
            "roadside_assistance_rsa" | "roadside_assistance" | "road_side_assistance" | "rsa" => {
                AddonKind::RoadsideAssistance
            }
            "key_protect" => AddonKind::KeyProtect,
            "tyre_protect" => AddonKind::TyreProtect,
            "pillion_cover" => AddonKind::PillionCover,
            _ => return None,
        };
        Some(kind)
    }
}

/// Lowercase, collapse every run of other characters to `_`, trim edge underscores
fn normalize_label(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_sep = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(c);
        } else {
            pending_sep = true;
        }
    }
    key.trim_matches('_').to_string()
}

/// Component ids that leaked into labels look like `8-4-4-4-12` hex groups
fn is_uuid_like(key: &str) -> bool {
    let groups: Vec<&str> = key.split('_').collect();
    groups.len() == 5
        && groups.iter().zip([8, 4, 4, 4, 12]).all(|(group, len)| {
            group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit())
        })
}

/// Flat premium figures for storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceSummary {
    pub own_damage: GstSplit,
    pub third_party: GstSplit,
    /// OD + TP; its total is the gross premium
    pub mandatory: GstSplit,
    pub gst_rate: f64,
    pub addons: BTreeMap<AddonKind, GstSplit>,
}

impl InsuranceSummary {
    /// GST is re-derived per part at `gst_rate`, so the summary can differ from
    /// the evaluator's single GST line by rounding.
    pub fn from_result(result: &InsuranceCalculationResult, gst_rate: f64) -> Self {
        let own_damage = GstSplit::on(result.od_total, gst_rate);
        let third_party = GstSplit::on(result.tp_total, gst_rate);
        Self {
            own_damage,
            third_party,
            mandatory: own_damage.combine(&third_party),
            gst_rate,
            addons: addon_columns(&result.addon_breakdown, gst_rate),
        }
    }

    pub fn gross_premium(&self) -> f64 {
        self.mandatory.total
    }

    pub fn addon(&self, kind: AddonKind) -> GstSplit {
        self.addons.get(&kind).copied().unwrap_or_default()
    }
}

/// Canonical add-on columns; lines of the same kind are summed, unknown labels dropped
fn addon_columns(lines: &[CalculationResultItem], gst_rate: f64) -> BTreeMap<AddonKind, GstSplit> {
    let mut bases: BTreeMap<AddonKind, Vec<&CalculationResultItem>> = BTreeMap::new();
    for line in lines {
        let kind = AddonKind::from_label(&line.label).or_else(|| AddonKind::from_label(&line.component_id));
        if let Some(kind) = kind {
            bases.entry(kind).or_default().push(line);
        }
    }
    bases
        .into_iter()
        .map(|(kind, items)| (kind, GstSplit::on(sum_amounts(items), gst_rate)))
        .collect()
}
