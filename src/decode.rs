use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;

use calamine::{Data, DataType, Range, Reader, Xls, Xlsx};
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use tokio::io::AsyncRead;
use tracing::{debug, error, warn};

use crate::normalize::normalize;
use crate::record::{Record, RecordCollection};
use crate::{IngestError, IngestResult};

/// Source formats the decoder understands, selected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xlsx,
    Xls,
    Csv,
    Json,
    Yaml,
}

impl SourceFormat {
    /// Maps an extension token (case-insensitive, no leading dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xls)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a decode produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeReport {
    /// Extension is not one of the known formats. Not an error.
    Unsupported(String),
    /// Content could not be parsed; carries the parser's message.
    Malformed {
        format: SourceFormat,
        message: String,
    },
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(ext) => write!(f, "unsupported file format: {ext:?}"),
            Self::Malformed { format, message } => {
                write!(f, "failed to parse {format} data file: {message}")
            }
        }
    }
}

/// Outcome of [`decode`]: normalized records, plus a report when nothing was decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub records: RecordCollection,
    pub report: Option<DecodeReport>,
}

impl Decoded {
    pub fn is_malformed(&self) -> bool {
        matches!(self.report, Some(DecodeReport::Malformed { .. }))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.report, Some(DecodeReport::Unsupported(_)))
    }

    /// User-facing message for a malformed source.
    pub fn error_message(&self) -> Option<String> {
        self.is_malformed()
            .then(|| self.report.as_ref().map(ToString::to_string))
            .flatten()
    }
}

/// Decodes `content` by extension and normalizes the rows.
///
/// Never fails: malformed content yields an empty collection with a
/// [`DecodeReport::Malformed`], an unknown extension one with
/// [`DecodeReport::Unsupported`].
pub async fn decode(content: &[u8], extension: &str) -> Decoded {
    let Some(format) = SourceFormat::from_extension(extension) else {
        warn!(extension, "unsupported source format");
        return Decoded {
            records: Vec::new(),
            report: Some(DecodeReport::Unsupported(extension.to_string())),
        };
    };

    match try_decode(content, format).await {
        Ok(records) => {
            debug!(%format, rows = records.len(), "decoded source");
            Decoded {
                records,
                report: None,
            }
        }
        Err(err) => {
            error!(%format, error = %err, "failed to decode source");
            Decoded {
                records: Vec::new(),
                report: Some(DecodeReport::Malformed {
                    format,
                    message: err.to_string(),
                }),
            }
        }
    }
}

/// Decodes and normalizes `content`, returning the underlying parse error.
pub async fn try_decode(content: &[u8], format: SourceFormat) -> IngestResult<RecordCollection> {
    let rows = match format {
        SourceFormat::Xlsx => sheet_rows(&first_sheet::<Xlsx<Cursor<&[u8]>>>(content)?),
        SourceFormat::Xls => sheet_rows(&first_sheet::<Xls<Cursor<&[u8]>>>(content)?),
        SourceFormat::Csv => {
            let text = utf8_text(content)?;
            decode_csv_stream(text.as_bytes()).await?
        }
        SourceFormat::Json => json_rows(&utf8_text(content)?)?,
        SourceFormat::Yaml => yaml_rows(&utf8_text(content)?)?,
    };
    Ok(normalize(&rows))
}

fn utf8_text(content: &[u8]) -> IngestResult<Cow<'_, str>> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(content);
    if had_errors {
        return Err(IngestError::Encoding("UTF-8"));
    }
    Ok(text)
}

/// Reads CSV rows keyed by the trimmed header line.
///
/// Lines are split on every comma; quote characters are plain text. Rows shorter than the header get empty text for the missing columns; extra
/// trailing fields are dropped. Rows are not normalized here.
pub async fn decode_csv_stream<R>(reader: R) -> IngestResult<RecordCollection>
where
    R: AsyncRead + Unpin + Send,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .buffer_capacity(1 << 20) // 1 MiB
        .create_reader(reader);

    let headers = rdr.headers().await?.clone();
    let mut rows = Vec::new();
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record).await? {
        let row: Record = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h, record.get(idx).unwrap_or_default()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn json_rows(text: &str) -> IngestResult<RecordCollection> {
    use serde_json::Value;

    let items = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        other => {
            return Err(IngestError::UnexpectedShape {
                expected: "a JSON array of objects",
                found: json_kind(&other).to_string(),
            })
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, json_text(v)))
                .collect::<Record>()),
            other => Err(IngestError::UnexpectedShape {
                expected: "JSON object rows",
                found: json_kind(&other).to_string(),
            }),
        })
        .collect()
}

fn json_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn yaml_rows(text: &str) -> IngestResult<RecordCollection> {
    use serde_yaml::Value;

    let items = match serde_yaml::from_str::<Value>(text)? {
        Value::Sequence(items) => items,
        // empty document
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(IngestError::UnexpectedShape {
                expected: "a YAML sequence of mappings",
                found: yaml_kind(&other).to_string(),
            })
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let map = match item {
            Value::Mapping(map) => map,
            other => {
                return Err(IngestError::UnexpectedShape {
                    expected: "YAML mapping rows",
                    found: yaml_kind(&other).to_string(),
                })
            }
        };
        let mut row = Record::new();
        for (k, v) in map {
            let key = match k {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(IngestError::UnexpectedShape {
                        expected: "scalar mapping keys",
                        found: yaml_kind(&other).to_string(),
                    })
                }
            };
            row.insert(key, yaml_text(v)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn yaml_text(value: serde_yaml::Value) -> IngestResult<String> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => serde_yaml::to_string(&nested)?.trim_end().to_string(),
    })
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

fn first_sheet<'a, W>(content: &'a [u8]) -> IngestResult<Range<Data>>
where
    W: Reader<Cursor<&'a [u8]>>,
    calamine::Error: From<W::Error>,
{
    let mut workbook = W::new(Cursor::new(content)).map_err(calamine::Error::from)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoWorksheet)?
        .map_err(calamine::Error::from)?;
    Ok(range)
}

/// Rows of a worksheet keyed by its header row.
///
/// Columns with a blank header are skipped, repeated headers get a `_N` suffix,
/// and rows with no values at all are dropped.
fn sheet_rows(range: &Range<Data>) -> RecordCollection {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let headers = header_names(header);

    rows.filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .filter_map(|(idx, h)| {
                    let h = h.as_ref()?;
                    let value = row.get(idx).map(cell_text).unwrap_or_default();
                    Some((h.clone(), value))
                })
                .collect()
        })
        .collect()
}

fn header_names(row: &[Data]) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .map(|cell| {
            let name = cell_text(cell);
            if name.trim().is_empty() {
                return None;
            }
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}_{count}")
            };
            *count += 1;
            Some(unique)
        })
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // date cells become year-first text so the date columns normalize
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::ABSENT_DATE;
    use crate::field::Field;

    #[test]
    fn extension_tokens() {
        assert_eq!(SourceFormat::from_extension("XLSX"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_extension("yml"), Some(SourceFormat::Yaml));
        assert_eq!(SourceFormat::from_extension("yaml"), Some(SourceFormat::Yaml));
        assert_eq!(SourceFormat::from_extension("txt"), None);
        assert!(SourceFormat::Xls.is_spreadsheet());
    }

    #[tokio::test]
    async fn csv_rows_per_data_line() {
        let out = decode(b"a,b\r\n1,2\n3,4\n", "csv").await;
        assert_eq!(out.report, None);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1].get("b"), Some("4"));
    }

    #[tokio::test]
    async fn csv_quote_is_plain_text() {
        let out = decode(b"id,name\n1,\"Sam\n2,Ann\n3,\"Bob, Jr\"\n", "csv").await;
        assert_eq!(out.report, None);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].get("name"), Some("\"Sam"));
        assert_eq!(out.records[1].get("name"), Some("Ann"));
        assert_eq!(out.records[2].get("name"), Some("\"Bob"));
    }

    #[tokio::test]
    async fn csv_short_row_fills_missing_with_empty_text() {
        let out = decode(b" id , name ,note\n7\n", "csv").await;
        assert_eq!(out.records.len(), 1);
        let rec = &out.records[0];
        assert_eq!(rec.get("id"), Some("7"));
        assert_eq!(rec.get("name"), Some(""));
        assert_eq!(rec.get("note"), Some(""));
    }

    #[tokio::test]
    async fn csv_blank_or_header_only_is_empty() {
        for input in ["", "a,b\n", "a,b"] {
            let out = decode(input.as_bytes(), "csv").await;
            assert!(out.records.is_empty());
            assert_eq!(out.report, None);
        }
    }

    #[tokio::test]
    async fn csv_normalizes_dates_and_strips_bom() {
        let text = format!("\u{feff}{},x\n29/06/2026,1\n", Field::CivilIdExpiry.label());
        let out = decode(text.as_bytes(), "csv").await;
        assert_eq!(out.records[0].field(Field::CivilIdExpiry), Some("2026/06/29"));
    }

    #[tokio::test]
    async fn json_array_of_objects() {
        let text = r#"[{"id": 60001, "name": "a", "note": null}, {"id": "60002", "ok": true}]"#;
        let out = decode(text.as_bytes(), "json").await;
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].get("id"), Some("60001"));
        assert_eq!(out.records[0].get("note"), Some(""));
        assert_eq!(out.records[1].get("ok"), Some("true"));
    }

    #[tokio::test]
    async fn json_top_level_object_is_malformed() {
        let out = decode(br#"{"id": 1}"#, "json").await;
        assert!(out.records.is_empty());
        assert!(out.is_malformed());
        assert!(out.error_message().unwrap().contains("an object"));
    }

    #[tokio::test]
    async fn json_syntax_error_is_malformed() {
        let out = decode(b"[{", "json").await;
        assert!(out.records.is_empty());
        assert!(out.is_malformed());
    }

    #[tokio::test]
    async fn yaml_sequence_of_mappings() {
        let text = format!(
            "- {0}: 2026-06-29\n  id: 60001\n- {0}: '--'\n  id: 60002\n",
            Field::ContractDate.label()
        );
        let out = decode(text.as_bytes(), "yml").await;
        assert_eq!(out.report, None);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].field(Field::ContractDate), Some("2026/06/29"));
        assert_eq!(out.records[0].get("id"), Some("60001"));
        assert_eq!(out.records[1].field(Field::ContractDate), Some(ABSENT_DATE));
    }

    #[tokio::test]
    async fn yaml_mapping_document_is_malformed() {
        let out = decode(b"id: 1\n", "yaml").await;
        assert!(out.is_malformed());
        assert!(out.records.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_malformed() {
        let out = decode(&[0x61, 0x0a, 0xff, 0xfe, 0x0a], "csv").await;
        assert!(out.is_malformed());
    }

    #[tokio::test]
    async fn corrupt_workbook_is_malformed() {
        let out = decode(b"definitely not a zip archive", "xlsx").await;
        assert!(out.is_malformed());
        assert!(out.records.is_empty());
    }

    #[tokio::test]
    async fn unknown_extension_is_unsupported_not_malformed() {
        let out = decode(b"a,b\n1,2\n", "txt").await;
        assert!(out.records.is_empty());
        assert!(out.is_unsupported());
        assert_eq!(out.error_message(), None);
    }

    #[tokio::test]
    async fn workbook_date_cells_normalize() -> anyhow::Result<()> {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, Field::EmployeeNumber.label())?;
        sheet.write_string(0, 1, Field::ContractDate.label())?;
        sheet.write_string(0, 2, Field::PassportExpiry.label())?;
        sheet.write_number(1, 0, 60001)?;
        sheet.write_datetime_with_format(1, 1, &ExcelDateTime::from_ymd(1993, 7, 9)?, &date_format)?;
        sheet.write_string(1, 2, "10/11/2088")?;
        let bytes = workbook.save_to_buffer()?;

        let out = decode(&bytes, "xlsx").await;
        assert_eq!(out.report, None);
        assert_eq!(out.records.len(), 1);
        let rec = &out.records[0];
        assert_eq!(rec.employee_id(), Some("60001"));
        assert_eq!(rec.field(Field::ContractDate), Some("1993/07/09"));
        assert_eq!(rec.field(Field::PassportExpiry), Some("2088/11/10"));
        Ok(())
    }

    #[test]
    fn header_names_skip_blank_and_suffix_repeats() {
        let row = vec![
            Data::String("a".into()),
            Data::Empty,
            Data::String("a".into()),
            Data::Int(3),
        ];
        assert_eq!(
            header_names(&row),
            vec![Some("a".into()), None, Some("a_1".into()), Some("3".into())]
        );
    }

    #[test]
    fn cell_text_renders_numbers_plainly() {
        assert_eq!(cell_text(&Data::Float(800.0)), "800");
        assert_eq!(cell_text(&Data::Int(60000)), "60000");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
