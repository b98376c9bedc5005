//! Purpose: Load CSV text into a typed, ordered `Dataset`.
//! Exports: `Dataset`, `Record`, `ReadOptions`, `read_csv`, `normalize_headers`.
//! Role: The read/transform half of conversion; no file I/O happens here.
//! Invariants: Row order and column order follow the input exactly.
//! Invariants: Every row has one cell per column (short rows are null-padded).
use std::collections::HashMap;
use std::io::Read;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::error::{Error, ErrorKind};
use super::infer::{Cell, ColumnType, InferOptions, cast, infer_column};

#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    pub infer: InferOptions,
    /// Reject rows with fewer fields than the header instead of padding them.
    pub strict: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Vec<Cell>>,
    padded_rows: usize,
}

/// Borrowed view of one row as an ordered column-name to cell mapping.
#[derive(Copy, Clone, Debug)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows that had fewer fields than the header.
    pub fn padded_rows(&self) -> usize {
        self.padded_rows
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.columns.iter().position(|name| name == column)?;
        self.cells.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in self.iter() {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// Read a full CSV document. The first row names the columns.
pub fn read_csv<R: Read>(reader: R, options: &ReadOptions) -> Result<Dataset, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(Error::new(ErrorKind::Parse)
            .with_message("missing header row")
            .with_hint("The first line must list the column names."));
    }
    let columns = normalize_headers(headers.iter());
    let width = columns.len();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut padded_rows = 0usize;
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|pos| pos.line());
        if record.len() > width {
            let mut err = Error::new(ErrorKind::Parse).with_message(format!(
                "row has {} fields, header has {width}",
                record.len()
            ));
            if let Some(line) = line {
                err = err.with_line(line);
            }
            return Err(err);
        }
        if record.len() < width {
            if options.strict {
                let mut err = Error::new(ErrorKind::Parse)
                    .with_message(format!(
                        "row has {} fields, header has {width}",
                        record.len()
                    ))
                    .with_hint("Drop --strict to pad short rows with null.");
                if let Some(line) = line {
                    err = err.with_line(line);
                }
                return Err(err);
            }
            padded_rows += 1;
        }
        let mut row: Vec<Option<String>> =
            record.iter().map(|cell| Some(cell.to_string())).collect();
        row.resize(width, None);
        raw_rows.push(row);
    }

    let column_types: Vec<ColumnType> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            infer_column(
                name,
                raw_rows.iter().map(|row| row[idx].as_deref()),
                &options.infer,
            )
        })
        .collect();

    let rows = raw_rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(column_types.iter())
                .map(|(raw, column_type)| cast(raw.as_deref(), *column_type, &options.infer))
                .collect()
        })
        .collect();

    tracing::debug!(
        columns = width,
        rows = raw_rows.len(),
        padded_rows,
        "parsed csv"
    );

    Ok(Dataset {
        columns,
        column_types,
        rows,
        padded_rows,
    })
}

/// Make header names usable as unique object keys: blank names become
/// `Unnamed: <index>` and repeats get `.1`, `.2`, ... suffixes. A suffixed
/// name that is itself taken is suffixed again, so `a,a,a.1` becomes
/// `a, a.1, a.1.1`.
pub fn normalize_headers<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let raw: Vec<String> = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if idx == 0 {
                name.strip_prefix('\u{feff}').unwrap_or(name)
            } else {
                name
            };
            if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for mut name in raw {
        let mut seen = counts.get(&name).copied().unwrap_or(0);
        while seen > 0 {
            counts.insert(name.clone(), seen + 1);
            name = format!("{name}.{seen}");
            seen = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), seen + 1);
        out.push(name);
    }
    out
}

fn csv_error(err: csv::Error) -> Error {
    let line = err.position().map(|pos| pos.line());
    let message = match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "input is not valid UTF-8".to_string(),
        _ => "malformed csv".to_string(),
    };
    let kind = if matches!(err.kind(), csv::ErrorKind::Io(_)) {
        ErrorKind::Io
    } else {
        ErrorKind::Parse
    };
    let mut out = Error::new(kind).with_message(message);
    if let Some(line) = line {
        out = out.with_line(line);
    }
    out.with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{ReadOptions, normalize_headers, read_csv};
    use crate::core::error::ErrorKind;
    use crate::core::infer::{Cell, ColumnType};

    fn read(text: &str) -> super::Dataset {
        read_csv(text.as_bytes(), &ReadOptions::default()).expect("read")
    }

    #[test]
    fn reads_scenario_rows_in_order() {
        let dataset = read("name,value\nflood,100\ndrought,\n");
        assert_eq!(dataset.columns(), ["name", "value"]);
        assert_eq!(
            dataset.column_types(),
            [ColumnType::Text, ColumnType::Integer]
        );
        let records: Vec<_> = dataset.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&Cell::Text("flood".to_string())));
        assert_eq!(records[0].get("value"), Some(&Cell::Int(100)));
        assert_eq!(records[1].get("value"), Some(&Cell::Null));
    }

    #[test]
    fn header_only_input_is_empty() {
        let dataset = read("a,b\n");
        assert!(dataset.is_empty());
        assert_eq!(dataset.column_types(), [ColumnType::Empty, ColumnType::Empty]);
    }

    #[test]
    fn quoted_fields_keep_commas_and_newlines() {
        let dataset = read("id,impact\n1,\"Reached 5,000 people\nin two regions\"\n");
        let record = dataset.records().next().expect("record");
        assert_eq!(
            record.get("impact").and_then(|cell| cell.as_text()),
            Some("Reached 5,000 people\nin two regions")
        );
    }

    #[test]
    fn short_rows_are_padded_with_null() {
        let dataset = read("a,b,c\n1,2\n3,4,5\n");
        assert_eq!(dataset.padded_rows(), 1);
        let record = dataset.records().next().expect("record");
        assert_eq!(record.get("c"), Some(&Cell::Null));
    }

    #[test]
    fn strict_mode_rejects_short_rows() {
        let options = ReadOptions {
            strict: true,
            ..ReadOptions::default()
        };
        let err = read_csv("a,b\n1\n".as_bytes(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn long_rows_fail_with_line_number() {
        let err = read_csv("a,b\n1,2\n3,4,5\n".as_bytes(), &ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.message(), Some("row has 3 fields, header has 2"));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let bytes = b"a,b\n\xff,1\n";
        let err = read_csv(&bytes[..], &ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_csv("".as_bytes(), &ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.message(), Some("missing header row"));
    }

    #[test]
    fn headers_are_deduplicated_and_named() {
        assert_eq!(
            normalize_headers(["a", "a", "", "a"]),
            ["a", "a.1", "Unnamed: 2", "a.2"]
        );
        assert_eq!(normalize_headers(["a", "a", "a.1"]), ["a", "a.1", "a.1.1"]);
        assert_eq!(normalize_headers(["a", "a.1", "a"]), ["a", "a.1", "a.1.1"]);
    }

    #[test]
    fn utf8_bom_is_not_part_of_first_header() {
        let dataset = read("\u{feff}id,entity\n1,UNICEF\n");
        assert_eq!(dataset.columns(), ["id", "entity"]);
    }
}
