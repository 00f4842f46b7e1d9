//! Raw row readers.
//!
//! Both formats are read into flat JSON objects so normalization has a
//! single input shape. CSV cells become JSON strings.

use std::io::Read;

use serde_json::{Map, Value};

use crate::IngestError;

/// One raw source row, keyed by column name.
pub type RawRow = Map<String, Value>;

/// Parses a JSON array of flat objects.
///
/// # Errors
///
/// Returns [`IngestError`] if the text is not JSON or not an array of
/// objects.
pub fn read_json_rows(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(IngestError::Format {
            message: "Expected a JSON array of records".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(IngestError::Format {
                message: format!("Record {i} is not an object: {other}"),
            }),
        })
        .collect()
}

/// Parses CSV with a header row.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV is malformed or has no header row.
pub fn read_csv_rows(reader: impl Read) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::Format {
            message: "CSV file contains no header row".to_owned(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_owned())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_array() {
        let rows = read_json_rows(r#"[{"month": "2020-01", "a": 1}, {"month": "2020-02"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], 1);
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(matches!(
            read_json_rows(r#"{"month": "2020-01"}"#),
            Err(IngestError::Format { .. })
        ));
        assert!(matches!(
            read_json_rows("[1, 2]"),
            Err(IngestError::Format { .. })
        ));
        assert!(matches!(read_json_rows("not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn reads_csv_as_strings() {
        let csv = "month, a ,b\n2020-01, 5 ,\n2020-02,6\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["a"], "5");
        assert_eq!(rows[0]["b"], "");
        // Short rows simply lack the trailing columns.
        assert!(rows[1].get("b").is_none());
    }
}
