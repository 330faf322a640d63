use crate::date::canonical_date_text;
use crate::field::Field;
use crate::record::{Record, RecordCollection};

/// Builds the canonical form of decoded rows.
///
/// Column names are trimmed; values of the date columns become `YYYY/MM/DD` or
/// `--`. Every other value passes through unchanged. The input is left as is.
pub fn normalize(rows: &[Record]) -> RecordCollection {
    rows.iter().map(normalize_record).collect()
}

/// Normalizes one row.
///
/// When several keys trim to the same name, a key that is already trimmed
/// wins; otherwise the first padded key in sorted order does.
pub fn normalize_record(row: &Record) -> Record {
    let mut out = Record::new();
    for (key, value) in row.iter() {
        let name = key.trim();
        if name != key && (row.contains_key(name) || out.contains_key(name)) {
            continue;
        }
        let value = match Field::from_label(name) {
            Some(f) if f.is_date() => canonical_date_text(value),
            _ => value.to_string(),
        };
        out.insert(name, value);
    }
    out
}
