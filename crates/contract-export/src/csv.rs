//! CSV writers for tabular widget data
//!
//! Fields containing a comma, quote or line break are quoted, with embedded
//! quotes doubled. Lines are joined with `\n`.

use serde_json::{Map, Value};

/// Records to CSV. The header is the union of all keys in first-seen order;
/// missing and `null` cells are empty. No records gives an empty string.
pub fn records_to_csv(records: &[Map<String, Value>]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|h| escape_cell(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        lines.push(
            headers
                .iter()
                .map(|h| record.get(*h).map(cell_text).unwrap_or_default())
                .map(|text| escape_cell(&text))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Headers (skipped when empty) followed by rows, each row written as is
pub fn table_to_csv(headers: &[String], rows: &[Vec<Value>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    if !headers.is_empty() {
        lines.push(
            headers
                .iter()
                .map(|h| escape_cell(h))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    for row in rows {
        lines.push(
            row.iter()
                .map(|v| escape_cell(&cell_text(v)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Display text of a JSON cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn escape_cell(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Minimal RFC 4180 field reader for one line without embedded newlines
    fn parse_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut chars = line.chars().peekable();
        let mut quoted = false;
        while let Some(c) = chars.next() {
            match (quoted, c) {
                (true, '"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                (true, '"') => quoted = false,
                (false, '"') => quoted = true,
                (false, ',') => fields.push(std::mem::take(&mut field)),
                (_, c) => field.push(c),
            }
        }
        fields.push(field);
        fields
    }

    proptest! {
        #[test]
        fn escaped_cells_parse_back(cells in prop::collection::vec("[a-z,\" ]{0,8}", 1..6)) {
            let row: Vec<Value> = cells.iter().map(|c| Value::String(c.clone())).collect();
            let csv = table_to_csv(&[], &[row]);
            prop_assert_eq!(parse_line(&csv), cells);
        }
    }
}
