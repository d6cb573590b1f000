//! Per-product summary table.

use retail_core::{normalize, ProductSummary, SummaryTable, Transaction};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::info;

/// Collapse transaction rows into one [`ProductSummary`] per product.
///
/// Rows are grouped by normalized description. The first row seen for a
/// product supplies its description and unit price; quantities are summed
/// over every row. Totals are floored at zero so returns cannot push a
/// product negative; the table total therefore equals the sum of row
/// quantities only when no row is negative.
pub fn build_summary(transactions: &[Transaction]) -> SummaryTable {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<ProductSummary> = Vec::new();

    for tx in transactions {
        match index.entry(normalize(&tx.description)) {
            Entry::Occupied(slot) => {
                entries[*slot.get()].total_quantity += tx.quantity;
            }
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push(ProductSummary {
                    description: tx.description.trim().to_string(),
                    unit_price: tx.unit_price,
                    total_quantity: tx.quantity,
                });
            }
        }
    }

    for entry in &mut entries {
        entry.total_quantity = entry.total_quantity.max(0);
    }

    metrics::counter!("aggregation.summaries_built").increment(1);
    info!(
        rows = transactions.len(),
        products = entries.len(),
        "Product summary built"
    );

    SummaryTable::from_entries(entries)
}
