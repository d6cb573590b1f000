//! Caller-side input checks. The aggregation and recommendation layers
//! assume their inputs already passed through here.

use crate::error::{RetailError, RetailResult};

/// Parse a user-supplied result count. Non-numeric and non-positive values
/// are rejected.
pub fn parse_count(raw: &str) -> RetailResult<usize> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| RetailError::Validation(format!("Enter a valid number, got `{trimmed}`")))?;
    if value <= 0 {
        return Err(RetailError::Validation(format!(
            "Count must be a positive integer, got {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| RetailError::Validation(format!("Count {value} is out of range")))
}

/// Reject an empty or blank product query.
pub fn validate_query(raw: &str) -> RetailResult<&str> {
    if raw.trim().is_empty() {
        return Err(RetailError::Validation(
            "Please enter a product name".to_string(),
        ));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_accepts_positive() {
        assert_eq!(parse_count("5").unwrap(), 5);
        assert_eq!(parse_count(" 12 ").unwrap(), 12);
    }

    #[test]
    fn test_parse_count_rejects_invalid() {
        for raw in ["", "abc", "2.5", "0", "-3"] {
            let err = parse_count(raw).unwrap_err();
            assert!(matches!(err, RetailError::Validation(_)), "{raw}");
        }
    }

    #[test]
    fn test_validate_query() {
        assert_eq!(validate_query("mug").unwrap(), "mug");
        assert!(validate_query("").is_err());
        assert!(validate_query("   ").is_err());
    }
}
