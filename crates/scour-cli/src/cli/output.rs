//! Output rendering for fetched records.

use crate::cli::rest::Record;

/// Plucks a string field out of a schemaless record, empty when absent or
/// non-string.
pub fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

/// Aligned-column table of the named fields, sorted by `sort_by`.
pub fn format_table(records: &[Record], columns: &[&str], sort_by: &str) -> String {
    let mut records: Vec<&Record> = records.iter().collect();
    records.sort_by_key(|r| field(r, sort_by).to_string());

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for record in &records {
        for (i, column) in columns.iter().enumerate() {
            widths[i] = widths[i].max(field(record, column).len());
        }
    }

    let mut out = String::new();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(&format!("{:<width$}", column.to_uppercase(), width = widths[i]));
    }
    out.push('\n');
    for record in &records {
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(&format!("{:<width$}", field(record, column), width = widths[i]));
        }
        out.push('\n');
    }
    out
}

/// Pretty-printed JSON array of every record.
///
/// # Errors
///
/// Serialization failures only.
pub fn format_json(records: &[Record]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// One compact JSON object, for line-per-item raw output.
///
/// # Errors
///
/// Serialization failures only.
pub fn format_line(record: &Record) -> anyhow::Result<String> {
    Ok(serde_json::to_string(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn table_is_sorted_and_aligned() {
        let records = vec![
            record(&[("id", "2"), ("name", "zoe")]),
            record(&[("id", "1"), ("name", "amir")]),
        ];
        let table = format_table(&records, &["id", "name"], "name");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID  NAME");
        assert!(lines[1].starts_with("1   amir"));
        assert!(lines[2].starts_with("2   zoe"));
    }

    #[test]
    fn missing_fields_render_empty() {
        let records = vec![record(&[("id", "1")])];
        let table = format_table(&records, &["id", "name"], "name");
        assert!(table.lines().nth(1).unwrap().starts_with("1"));
    }
}
