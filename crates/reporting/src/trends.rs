//! Month-by-month sales of the globally best-selling products.

use crate::ranking::top_n;
use retail_core::{normalize, RankingScope, Transaction};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub month: u32,
    /// One value per product, aligned with [`TrendTable::products`].
    pub quantities: Vec<i64>,
}

/// Pivot of month × product summed quantity. Months with no sales of any
/// tracked product are absent; missing cells are 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendTable {
    pub products: Vec<String>,
    pub rows: Vec<TrendRow>,
}

impl TrendTable {
    pub fn months(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.month).collect()
    }
}

/// Track the `top_products` best sellers over calendar months.
pub fn monthly_trends(transactions: &[Transaction], top_products: usize) -> TrendTable {
    let products: Vec<String> = top_n(transactions, RankingScope::Global, top_products)
        .entries
        .into_iter()
        .map(|e| e.description)
        .collect();
    let columns: HashMap<String, usize> = products
        .iter()
        .enumerate()
        .map(|(i, p)| (normalize(p), i))
        .collect();

    let mut months: BTreeMap<u32, Vec<i64>> = BTreeMap::new();
    for tx in transactions {
        if let Some(&column) = columns.get(&normalize(&tx.description)) {
            let row = months
                .entry(tx.month())
                .or_insert_with(|| vec![0; products.len()]);
            row[column] += tx.quantity;
        }
    }

    TrendTable {
        products,
        rows: months
            .into_iter()
            .map(|(month, quantities)| TrendRow { month, quantities })
            .collect(),
    }
}
