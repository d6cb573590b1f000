use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Trim surrounding whitespace and fold to lowercase. Every description
/// comparison in the workspace goes through this.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A single cleaned sale line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub country: String,
    pub invoice_date: NaiveDateTime,
    pub customer_id: String,
}

impl Transaction {
    /// Calendar month of the invoice, 1-12.
    pub fn month(&self) -> u32 {
        self.invoice_date.month()
    }
}

/// One row of the per-product summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub description: String,
    /// First observed unit price for this product.
    pub unit_price: f64,
    pub total_quantity: i64,
}

impl ProductSummary {
    pub fn normalized_description(&self) -> String {
        normalize(&self.description)
    }
}

/// Canonical per-product table. Built once per dataset load and read-only
/// afterwards; descriptions are unique under [`normalize`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryTable {
    entries: Vec<ProductSummary>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SummaryTable {
    /// Build a table from already-aggregated entries. The first entry for a
    /// normalized description wins; later duplicates are ignored.
    pub fn from_entries(entries: impl IntoIterator<Item = ProductSummary>) -> Self {
        let mut table = SummaryTable::default();
        for entry in entries {
            let key = entry.normalized_description();
            if table.index.contains_key(&key) {
                tracing::debug!(description = %entry.description, "Duplicate product summary ignored");
                continue;
            }
            table.index.insert(key, table.entries.len());
            table.entries.push(entry);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductSummary> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ProductSummary] {
        &self.entries
    }

    /// Case-insensitive lookup of a single product.
    pub fn get(&self, description: &str) -> Option<&ProductSummary> {
        self.index
            .get(&normalize(description))
            .map(|&i| &self.entries[i])
    }

    pub fn total_quantity(&self) -> i64 {
        self.entries.iter().map(|e| e.total_quantity).sum()
    }
}

impl<'a> IntoIterator for &'a SummaryTable {
    type Item = &'a ProductSummary;
    type IntoIter = std::slice::Iter<'a, ProductSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Dimension along which a ranking view is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingScope {
    Global,
    Country,
    Month,
}

/// Grouping value of a ranking entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "value")]
pub enum GroupKey {
    Global,
    Country(String),
    Month(u32),
}

impl GroupKey {
    pub fn scope(&self) -> RankingScope {
        match self {
            GroupKey::Global => RankingScope::Global,
            GroupKey::Country(_) => RankingScope::Country,
            GroupKey::Month(_) => RankingScope::Month,
        }
    }

    pub fn for_transaction(scope: RankingScope, tx: &Transaction) -> Self {
        match scope {
            RankingScope::Global => GroupKey::Global,
            RankingScope::Country => GroupKey::Country(tx.country.clone()),
            RankingScope::Month => GroupKey::Month(tx.month()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Global => f.pad("global"),
            GroupKey::Country(country) => f.pad(country),
            GroupKey::Month(month) => f.pad(&month.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub key: GroupKey,
    pub description: String,
    pub quantity: i64,
}

/// Top-N products per grouping key. Keys are ascending; entries within a key
/// are sorted by descending quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingView {
    pub scope: RankingScope,
    pub n: usize,
    pub entries: Vec<RankingEntry>,
}

impl RankingView {
    pub fn empty(scope: RankingScope, n: usize) -> Self {
        Self {
            scope,
            n,
            entries: Vec::new(),
        }
    }

    /// Entries for one grouping value; empty when the key has no data.
    pub fn for_key(&self, key: &GroupKey) -> Vec<&RankingEntry> {
        self.entries.iter().filter(|e| &e.key == key).collect()
    }

    pub fn keys(&self) -> Vec<&GroupKey> {
        let mut keys: Vec<&GroupKey> = Vec::new();
        for entry in &self.entries {
            if keys.last() != Some(&&entry.key) {
                keys.push(&entry.key);
            }
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(description: &str, unit_price: f64, total_quantity: i64) -> ProductSummary {
        ProductSummary {
            description: description.to_string(),
            unit_price,
            total_quantity,
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Red Mug \t"), "red mug");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_transaction_month() {
        let tx = Transaction {
            description: "Red Mug".into(),
            unit_price: 2.5,
            quantity: 3,
            country: "France".into(),
            invoice_date: NaiveDate::from_ymd_opt(2011, 12, 9)
                .unwrap()
                .and_hms_opt(12, 50, 0)
                .unwrap(),
            customer_id: "12680".into(),
        };
        assert_eq!(tx.month(), 12);
        assert_eq!(
            GroupKey::for_transaction(RankingScope::Country, &tx),
            GroupKey::Country("France".into())
        );
        assert_eq!(
            GroupKey::for_transaction(RankingScope::Month, &tx),
            GroupKey::Month(12)
        );
    }

    #[test]
    fn test_summary_table_first_entry_wins() {
        let table = SummaryTable::from_entries(vec![
            summary("Red Mug", 2.5, 10),
            summary("RED MUG ", 9.9, 99),
            summary("Blue Mugs", 3.0, 20),
        ]);
        assert_eq!(table.len(), 2);
        let mug = table.get("red mug").unwrap();
        assert_eq!(mug.unit_price, 2.5);
        assert_eq!(mug.total_quantity, 10);
        assert_eq!(table.total_quantity(), 30);
    }

    #[test]
    fn test_summary_table_get_is_case_insensitive() {
        let table = SummaryTable::from_entries(vec![summary("Blue Mugs", 3.0, 20)]);
        assert!(table.get("  BLUE mugs").is_some());
        assert!(table.get("Blue Mug").is_none());
    }

    #[test]
    fn test_ranking_view_for_unknown_key_is_empty() {
        let view = RankingView {
            scope: RankingScope::Country,
            n: 3,
            entries: vec![
                RankingEntry {
                    key: GroupKey::Country("France".into()),
                    description: "Red Mug".into(),
                    quantity: 5,
                },
                RankingEntry {
                    key: GroupKey::Country("Germany".into()),
                    description: "Blue Mugs".into(),
                    quantity: 7,
                },
            ],
        };
        assert!(view.for_key(&GroupKey::Country("Italy".into())).is_empty());
        assert_eq!(view.for_key(&GroupKey::Country("France".into())).len(), 1);
        assert_eq!(view.keys().len(), 2);
    }

    #[test]
    fn test_group_key_ordering() {
        let mut keys = vec![GroupKey::Month(11), GroupKey::Month(2), GroupKey::Month(7)];
        keys.sort();
        assert_eq!(
            keys,
            vec![GroupKey::Month(2), GroupKey::Month(7), GroupKey::Month(11)]
        );
    }
}
