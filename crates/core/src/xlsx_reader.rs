//! Excel reader for the Online Retail workbook. The first worksheet is read
//! and its header row decides which column feeds which [`RawTransaction`]
//! field.

use crate::error::{RetailError, RetailResult};
use crate::store::RawTransaction;
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;

/// Invoice dates taken from date cells are handed to the store as text in
/// this format.
const DATE_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    InvoiceNo,
    Description,
    Quantity,
    InvoiceDate,
    UnitPrice,
    CustomerId,
    Country,
}

impl Column {
    /// Matches `InvoiceNo`, `invoice_no`, `Invoice No` and so on.
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "invoiceno" => Some(Self::InvoiceNo),
            "description" => Some(Self::Description),
            "quantity" => Some(Self::Quantity),
            "invoicedate" => Some(Self::InvoiceDate),
            "unitprice" => Some(Self::UnitPrice),
            "customerid" => Some(Self::CustomerId),
            "country" => Some(Self::Country),
            _ => None,
        }
    }
}

pub(crate) fn read_xlsx(path: &Path) -> RetailResult<Vec<RawTransaction>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| RetailError::Dataset("Workbook contains no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let columns: Vec<Option<Column>> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| Column::from_header(&cell.to_string()))
            .collect(),
        None => return Ok(Vec::new()),
    };
    if !columns.contains(&Some(Column::Description)) {
        return Err(RetailError::Dataset(format!(
            "sheet `{sheet_name}` has no Description column"
        )));
    }

    let mut raw_rows = Vec::new();
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut raw = RawTransaction::default();
        for (column, cell) in columns.iter().zip(row) {
            match column {
                Some(Column::InvoiceNo) => raw.invoice_no = cell_value(cell),
                Some(Column::Description) => raw.description = cell_text(cell),
                Some(Column::Quantity) => raw.quantity = cell_number(cell).map(|q| q.round() as i64),
                Some(Column::InvoiceDate) => raw.invoice_date = cell_date_text(cell),
                Some(Column::UnitPrice) => raw.unit_price = cell_number(cell),
                Some(Column::CustomerId) => raw.customer_id = cell_value(cell),
                Some(Column::Country) => raw.country = cell_text(cell),
                None => {}
            }
        }
        raw_rows.push(raw);
    }
    Ok(raw_rows)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Identifier cells keep their JSON shape so the store cleans them the same
/// way whichever file format they came from.
fn cell_value(cell: &Data) -> Option<serde_json::Value> {
    match cell {
        Data::String(s) => Some(serde_json::Value::String(s.clone())),
        Data::Int(i) => Some(serde_json::Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
        _ => None,
    }
}

fn cell_date_text(cell: &Data) -> Option<String> {
    let serial = match cell {
        Data::DateTime(dt) => dt.as_f64(),
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::DateTimeIso(s) | Data::String(s) => return Some(s.clone()),
        _ => return None,
    };
    excel_serial_to_datetime(serial).map(|dt| dt.format(DATE_TEXT_FORMAT).to_string())
}

/// Excel stores dates as fractional days since 1899-12-30.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matching() {
        assert_eq!(Column::from_header("InvoiceNo"), Some(Column::InvoiceNo));
        assert_eq!(Column::from_header("customer_id"), Some(Column::CustomerId));
        assert_eq!(Column::from_header(" Unit Price "), Some(Column::UnitPrice));
        assert_eq!(Column::from_header("StockCode"), None);
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(40513.5).unwrap();
        assert_eq!(dt.format(DATE_TEXT_FORMAT).to_string(), "2010-12-01 12:00:00");
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(cell_number(&Data::String(" 6 ".into())), Some(6.0));
        assert_eq!(cell_number(&Data::Empty), None);
        assert_eq!(cell_value(&Data::Float(17850.0)), Some(serde_json::json!(17850.0)));
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(
            cell_date_text(&Data::String("12/1/2010 8:26".into())).as_deref(),
            Some("12/1/2010 8:26")
        );
    }
}
