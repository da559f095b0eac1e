//! Reconciliation export
//!
//! Serializes reconciled regions and their totals to JSON for plotting or
//! external consumption.

use crate::reconcile::{Region, RegionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationTotals {
    pub buy_quantity: Decimal,
    pub sell_quantity: Decimal,
    pub matched_quantity: Decimal,
    /// Sum of signed overlap areas
    pub realized_spread: Decimal,
}

impl ReconciliationTotals {
    pub fn from_regions(regions: &[Region]) -> Self {
        regions.iter().fold(Self::default(), |mut totals, region| {
            match region.kind {
                RegionKind::Buy => totals.buy_quantity += region.width,
                RegionKind::Sell => totals.sell_quantity += region.width,
                RegionKind::Overlap => {
                    totals.matched_quantity += region.width;
                    totals.realized_spread += region.area();
                }
            }
            totals
        })
    }
}

/// Combined export of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationExport {
    pub version: String,
    pub symbol: String,
    /// Price the lots were marked against, when one was fetched
    pub mark_price: Option<Decimal>,
    pub regions: Vec<Region>,
    pub totals: ReconciliationTotals,
}

pub fn build_export(symbol: &str, mark_price: Option<Decimal>, regions: Vec<Region>) -> ReconciliationExport {
    let totals = ReconciliationTotals::from_regions(&regions);
    ReconciliationExport {
        version: crate::CLIENT_CORE_VERSION.to_string(),
        symbol: symbol.to_string(),
        mark_price,
        regions,
        totals,
    }
}

/// Export as pretty-printed JSON.
pub fn export_json(export: &ReconciliationExport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(export)
}

/// Write export to a file path.
pub fn write_to_file(export: &ReconciliationExport, path: &str) -> std::io::Result<()> {
    let json = export_json(export)?;
    std::fs::write(path, json)
}
