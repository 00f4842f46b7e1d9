//! Cell parsing shared by the JSON and CSV readers.

use serde_json::Value;

/// Placeholder strings that spreadsheet and dataframe exports write for
/// missing numbers.
const BLANK_MARKERS: &[&str] = &["", "nan", "none", "null", "n/a", "-"];

/// A raw cell classified for loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A number (possibly negative, possibly written with thousands
    /// separators).
    Number(f64),
    /// Missing, `null`, empty or a missing-number placeholder.
    Blank,
    /// Anything else.
    Text(String),
}

/// Classifies a JSON value (CSV cells arrive as JSON strings).
#[must_use]
pub fn classify(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => Cell::Blank,
        Some(Value::Number(n)) => n.as_f64().map_or(Cell::Blank, |n| {
            if n.is_finite() {
                Cell::Number(n)
            } else {
                Cell::Blank
            }
        }),
        Some(Value::String(s)) => classify_str(s),
        Some(other) => Cell::Text(other.to_string()),
    }
}

/// Classifies a string cell.
#[must_use]
pub fn classify_str(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if BLANK_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return Cell::Blank;
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        Ok(_) => Cell::Blank,
        Err(_) => Cell::Text(trimmed.to_string()),
    }
}

/// Returns the value as a string, for period parsing and error messages.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_json_numbers() {
        let v = serde_json::json!(1234.5);
        assert_eq!(classify(Some(&v)), Cell::Number(1234.5));
        assert_eq!(classify(Some(&serde_json::json!(-3))), Cell::Number(-3.0));
    }

    #[test]
    fn missing_and_null_are_blank() {
        assert_eq!(classify(None), Cell::Blank);
        assert_eq!(classify(Some(&Value::Null)), Cell::Blank);
    }

    #[test]
    fn classifies_numeric_strings() {
        assert_eq!(classify_str(" 12,345 "), Cell::Number(12345.0));
        assert_eq!(classify_str("7.5"), Cell::Number(7.5));
    }

    #[test]
    fn placeholders_are_blank() {
        for s in ["", "NaN", "nan", "None", "  ", "N/A", "-"] {
            assert_eq!(classify_str(s), Cell::Blank, "{s:?} should be blank");
        }
        assert_eq!(classify_str("inf"), Cell::Blank);
    }

    #[test]
    fn words_are_text() {
        assert_eq!(classify_str("Doha"), Cell::Text("Doha".to_string()));
        assert_eq!(classify(Some(&serde_json::json!(true))), Cell::Text("true".to_string()));
    }
}
