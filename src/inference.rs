use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{DType, Value};

/// Missing value tokens
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "NULL", "null", "NaN", "nan", "missing", "MISSING", "None",
    "none", "#N/A", "#VALUE!", "#REF!", "#DIV/0!", "#NUM!", "#NAME?", "#NULL!",
];

// Date format patterns
static DATE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // ISO format: 2017-01-15
        (Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(), "%Y-%m-%d"),
        // US format: 01/15/2017 or 1/15/2017
        (
            Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap(),
            "%m/%d/%Y",
        ),
        // ISO with dots: 2017.01.15
        (Regex::new(r"^\d{4}\.\d{2}\.\d{2}$").unwrap(), "%Y.%m.%d"),
    ]
});

// Datetimes whose time part is dropped: 2017-01-15 00:00:00, 2017-01-15T00:00:00.000
static DATETIME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]\d{2}:\d{2}:\d{2}(\.\d+)?Z?$").unwrap()
});

/// Type inference state for a column
#[derive(Debug, Clone, Default)]
pub struct TypeInferencer {
    /// Current inferred type, `None` until a non-missing value is seen
    current_type: Option<DType>,
}

impl TypeInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw value for type inference
    pub fn observe(&mut self, value: &str) {
        if is_missing(value) {
            return;
        }

        let new_type = match self.current_type {
            None => classify(value),
            Some(DType::Numeric) if is_numeric(value) => return,
            Some(DType::Date) if is_date(value) => return,
            Some(DType::Text) => return,
            Some(_) => DType::Text,
        };

        self.current_type = Some(new_type);
    }

    /// Get the current inferred type.
    /// A column without any observed value is numeric (an all-null attribute).
    pub fn inferred_type(&self) -> DType {
        self.current_type.unwrap_or(DType::Numeric)
    }
}

/// Infer the type of a whole column of raw strings
pub fn infer_column<'a, I>(values: I) -> DType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut inferencer = TypeInferencer::new();
    for value in values {
        inferencer.observe(value);
    }
    inferencer.inferred_type()
}

/// Classify a single non-missing raw value
fn classify(value: &str) -> DType {
    if is_numeric(value) {
        DType::Numeric
    } else if is_date(value) {
        DType::Date
    } else {
        DType::Text
    }
}

/// Convert a raw string to a typed cell for a column of the given type
pub fn parse_cell(raw: &str, dtype: DType) -> Value {
    if is_missing(raw) {
        return Value::Missing;
    }

    let parsed = match dtype {
        DType::Numeric => parse_numeric(raw).map(Value::Number),
        DType::Date => parse_date(raw).map(Value::Date),
        DType::Text => None,
    };

    parsed.unwrap_or_else(|| Value::Text(raw.trim().to_string()))
}

/// Check if a value represents a missing value
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Check if a value is numeric (integer or float)
pub fn is_numeric(value: &str) -> bool {
    parse_numeric(value).is_some()
}

/// Check if a value is a date (or a datetime we keep the date of)
pub fn is_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Parse a numeric value. Non-finite spellings are not numbers here.
pub fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a date, discarding any time-of-day part
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = DATETIME_PREFIX.captures(trimmed) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    }

    DATE_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(trimmed))
        .find_map(|(_, format)| NaiveDate::parse_from_str(trimmed, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("  "));
        assert!(is_missing("NA"));
        assert!(is_missing("null"));
        assert!(is_missing("NULL"));
        assert!(is_missing("NaN"));
        assert!(is_missing("None"));
        assert!(is_missing("#N/A"));
        assert!(!is_missing("0"));
        assert!(!is_missing("Central"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("42"));
        assert!(is_numeric("6037.0"));
        assert!(is_numeric("-118.4"));
        assert!(is_numeric("1e10"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("abc"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2017, 1, 15);
        assert_eq!(parse_date("2017-01-15"), expected);
        assert_eq!(parse_date("01/15/2017"), expected);
        assert_eq!(parse_date("2017.01.15"), expected);
        assert_eq!(parse_date("2017-01-15 00:00:00"), expected);
        assert_eq!(parse_date("2017-01-15T08:30:00.000"), expected);
        assert_eq!(parse_date("2017-13-45"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_inferencer_numeric() {
        assert_eq!(infer_column(["1", "2.5", "", "3"]), DType::Numeric);
    }

    #[test]
    fn test_inferencer_date() {
        assert_eq!(
            infer_column(["2017-01-01", "NULL", "2017-06-30"]),
            DType::Date
        );
    }

    #[test]
    fn test_inferencer_widens_to_text() {
        let mut inf = TypeInferencer::new();
        inf.observe("1");
        inf.observe("2");
        assert_eq!(inf.inferred_type(), DType::Numeric);

        inf.observe("Central");
        assert_eq!(inf.inferred_type(), DType::Text);

        inf.observe("3");
        assert_eq!(inf.inferred_type(), DType::Text);
    }

    #[test]
    fn test_inferencer_all_missing_is_numeric() {
        assert_eq!(infer_column(["", "NULL", "NaN"]), DType::Numeric);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("NULL", DType::Numeric), Value::Missing);
        assert_eq!(parse_cell(" 2.0 ", DType::Numeric), Value::Number(2.0));
        assert_eq!(
            parse_cell("Single Family Residential", DType::Text),
            Value::Text("Single Family Residential".to_string())
        );
        assert_eq!(parse_cell("6037", DType::Text), Value::Text("6037".to_string()));
        assert_eq!(
            parse_cell("2017-05-01", DType::Date),
            Value::Date(NaiveDate::from_ymd_opt(2017, 5, 1).unwrap())
        );
    }
}
