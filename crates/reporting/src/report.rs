//! Popular-items report: every ranking scope built in one pass, exportable
//! as CSV or JSON.

use crate::ranking::top_n;
use chrono::{DateTime, Utc};
use retail_core::config::RankingConfig;
use retail_core::{GroupKey, RankingScope, RankingView, RetailResult, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct PopularItemsReport {
    pub global: RankingView,
    pub by_country: RankingView,
    pub by_month: RankingView,
    pub generated_at: DateTime<Utc>,
}

impl PopularItemsReport {
    pub fn build(transactions: &[Transaction], config: &RankingConfig) -> Self {
        let report = Self {
            global: top_n(transactions, RankingScope::Global, config.global_top),
            by_country: top_n(transactions, RankingScope::Country, config.country_top),
            by_month: top_n(transactions, RankingScope::Month, config.month_top),
            generated_at: Utc::now(),
        };
        info!(
            global = report.global.entries.len(),
            countries = report.by_country.keys().len(),
            months = report.by_month.keys().len(),
            "Popular items report generated"
        );
        report
    }

    pub fn views(&self) -> [&RankingView; 3] {
        [&self.global, &self.by_country, &self.by_month]
    }
}

/// Render a ranking view as CSV. Global views have no key column.
pub fn export_csv(view: &RankingView) -> String {
    let key_column = match view.scope {
        RankingScope::Global => None,
        RankingScope::Country => Some("country"),
        RankingScope::Month => Some("month"),
    };

    let mut csv = match key_column {
        Some(column) => format!("{column},description,quantity"),
        None => "description,quantity".to_string(),
    };
    csv.push('\n');

    for entry in &view.entries {
        let mut cells = Vec::with_capacity(3);
        if key_column.is_some() {
            cells.push(quote(&entry.key.to_string()));
        }
        cells.push(quote(&entry.description));
        cells.push(entry.quantity.to_string());
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render a ranking view as pretty JSON records, one per entry.
pub fn export_json(view: &RankingView) -> RetailResult<String> {
    let records: Vec<BTreeMap<&str, serde_json::Value>> = view
        .entries
        .iter()
        .map(|entry| {
            let mut record = BTreeMap::new();
            match &entry.key {
                GroupKey::Global => {}
                GroupKey::Country(country) => {
                    record.insert("country", serde_json::json!(country));
                }
                GroupKey::Month(month) => {
                    record.insert("month", serde_json::json!(month));
                }
            }
            record.insert("description", serde_json::json!(entry.description));
            record.insert("quantity", serde_json::json!(entry.quantity));
            record
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
