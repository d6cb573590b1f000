//! Transaction Store. Loads raw sale rows and cleans them into typed
//! [`Transaction`] records.
//!
//! Raw rows accept both snake_case keys and the column names of the
//! public Online Retail export (`Description`, `UnitPrice`, `CustomerID`, ...),
//! so the same cleaning applies to JSON rows and to the Excel workbook.

use crate::error::{RetailError, RetailResult};
use crate::types::Transaction;
use crate::xlsx_reader::read_xlsx;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

const UNSPECIFIED_COUNTRY: &str = "Unspecified";
const HEAD_ROWS: usize = 5;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// A row as it appears in the source file, before cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default, alias = "InvoiceNo")]
    pub invoice_no: Option<serde_json::Value>,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "Quantity")]
    pub quantity: Option<i64>,
    #[serde(default, alias = "InvoiceDate")]
    pub invoice_date: Option<String>,
    #[serde(default, alias = "UnitPrice")]
    pub unit_price: Option<f64>,
    #[serde(default, alias = "CustomerID")]
    pub customer_id: Option<serde_json::Value>,
    #[serde(default, alias = "Country")]
    pub country: Option<String>,
}

/// Per-column count of absent values over the raw rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingCounts {
    pub invoice_no: usize,
    pub description: usize,
    pub quantity: usize,
    pub invoice_date: usize,
    pub unit_price: usize,
    pub customer_id: usize,
    pub country: usize,
}

impl MissingCounts {
    fn record(&mut self, raw: &RawTransaction) {
        if is_missing_value(raw.invoice_no.as_ref()) {
            self.invoice_no += 1;
        }
        if is_blank(raw.description.as_deref()) {
            self.description += 1;
        }
        if raw.quantity.is_none() {
            self.quantity += 1;
        }
        if is_blank(raw.invoice_date.as_deref()) {
            self.invoice_date += 1;
        }
        if raw.unit_price.is_none() {
            self.unit_price += 1;
        }
        if is_missing_value(raw.customer_id.as_ref()) {
            self.customer_id += 1;
        }
        if is_blank(raw.country.as_deref()) {
            self.country += 1;
        }
    }
}

/// Summary of a loaded dataset, for the `describe` report.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDescription {
    pub raw_rows: usize,
    pub rows: usize,
    pub dropped_rows: usize,
    pub missing: MissingCounts,
    pub distinct_products: usize,
    pub distinct_countries: usize,
    pub distinct_customers: usize,
    pub first_invoice: Option<NaiveDateTime>,
    pub last_invoice: Option<NaiveDateTime>,
    pub head: Vec<Transaction>,
}

/// Cleaned, in-memory transaction rows. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
    raw_rows: usize,
    missing: MissingCounts,
}

impl TransactionStore {
    /// Wrap rows that are already clean.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            raw_rows: transactions.len(),
            transactions,
            missing: MissingCounts::default(),
        }
    }

    /// Clean raw rows: drop rows without a description or customer id, trim
    /// descriptions and parse invoice dates.
    pub fn from_raw(rows: Vec<RawTransaction>) -> RetailResult<Self> {
        let raw_rows = rows.len();
        let mut missing = MissingCounts::default();
        let mut transactions = Vec::with_capacity(raw_rows);

        for (row_number, raw) in rows.into_iter().enumerate() {
            missing.record(&raw);
            if let Some(tx) = clean_row(row_number, raw)? {
                transactions.push(tx);
            }
        }

        let dropped = raw_rows - transactions.len();
        if dropped > 0 {
            debug!(dropped, "Dropped rows missing description or customer id");
        }

        Ok(Self {
            transactions,
            raw_rows,
            missing,
        })
    }

    /// Load a dataset file. `.json` holds an array of rows; `.jsonl` and
    /// `.ndjson` hold one row per line; `.xlsx` is read from its first sheet.
    pub fn load(path: impl AsRef<Path>) -> RetailResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let rows: Vec<RawTransaction> = match extension.as_str() {
            "json" => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            "jsonl" | "ndjson" => read_json_lines(BufReader::new(File::open(path)?))?,
            "xlsx" => read_xlsx(path)?,
            other => {
                return Err(RetailError::UnsupportedFormat(format!(
                    "`{}` (extension `{other}`), expected .json, .jsonl, .ndjson or .xlsx",
                    path.display()
                )))
            }
        };

        let store = Self::from_raw(rows)?;
        info!(
            path = %path.display(),
            raw_rows = store.raw_rows,
            rows = store.transactions.len(),
            "Transaction store loaded"
        );
        Ok(store)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Distinct countries, sorted.
    pub fn countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self
            .transactions
            .iter()
            .map(|t| t.country.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        countries.sort();
        countries
    }

    pub fn describe(&self) -> DatasetDescription {
        let products: HashSet<&str> = self
            .transactions
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        let countries: HashSet<&str> = self
            .transactions
            .iter()
            .map(|t| t.country.as_str())
            .collect();
        let customers: HashSet<&str> = self
            .transactions
            .iter()
            .map(|t| t.customer_id.as_str())
            .collect();

        DatasetDescription {
            raw_rows: self.raw_rows,
            rows: self.transactions.len(),
            dropped_rows: self.raw_rows - self.transactions.len(),
            missing: self.missing.clone(),
            distinct_products: products.len(),
            distinct_countries: countries.len(),
            distinct_customers: customers.len(),
            first_invoice: self.transactions.iter().map(|t| t.invoice_date).min(),
            last_invoice: self.transactions.iter().map(|t| t.invoice_date).max(),
            head: self.transactions.iter().take(HEAD_ROWS).cloned().collect(),
        }
    }
}

fn read_json_lines(reader: impl BufRead) -> RetailResult<Vec<RawTransaction>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .map_err(|e| RetailError::Dataset(format!("line {}: {e}", index + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}

fn clean_row(row_number: usize, raw: RawTransaction) -> RetailResult<Option<Transaction>> {
    let description = match raw.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => return Ok(None),
    };
    let customer_id = match raw.customer_id.as_ref().and_then(customer_id_text) {
        Some(id) => id,
        None => return Ok(None),
    };

    let date_text = raw.invoice_date.as_deref().map(str::trim).unwrap_or_default();
    let invoice_date = parse_invoice_date(date_text).ok_or_else(|| {
        RetailError::Dataset(format!(
            "row {row_number}: unparseable invoice date `{date_text}`"
        ))
    })?;

    let country = match raw.country.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => {
            debug!(row = row_number, "Row without country");
            UNSPECIFIED_COUNTRY.to_string()
        }
    };

    Ok(Some(Transaction {
        description,
        unit_price: raw.unit_price.unwrap_or(0.0),
        quantity: raw.quantity.unwrap_or(0),
        country,
        invoice_date,
        customer_id,
    }))
}

/// Customer ids arrive as strings or as numbers (often `17850.0`).
fn customer_id_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
            (None, Some(f)) => Some(f.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn parse_invoice_date(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn is_missing_value(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
