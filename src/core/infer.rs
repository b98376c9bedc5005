//! Column type inference for raw CSV cells.
//!
//! A column takes the narrowest type every non-null cell fits:
//! integer, then float, then boolean, falling back to text. Null markers
//! (the empty string included) never influence the column type.

use serde::{Serialize, Serializer};

/// Cell texts read as null unless overridden.
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::UInt(_) | Cell::Float(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Bool(value) => serializer.serialize_bool(*value),
            Cell::Int(value) => serializer.serialize_i64(*value),
            Cell::UInt(value) => serializer.serialize_u64(*value),
            Cell::Float(value) => serializer.serialize_f64(*value),
            Cell::Text(value) => serializer.serialize_str(value),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    /// Every cell is null.
    Empty,
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Empty => "empty",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum InferPolicy {
    #[default]
    Column,
    /// Keep every non-null cell as text.
    Off,
}

#[derive(Clone, Debug)]
pub struct InferOptions {
    pub policy: InferPolicy,
    pub text_columns: Vec<String>,
    pub null_values: Vec<String>,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            policy: InferPolicy::Column,
            text_columns: Vec::new(),
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InferOptions {
    pub fn with_policy(mut self, policy: InferPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_text_column(mut self, name: impl Into<String>) -> Self {
        self.text_columns.push(name.into());
        self
    }

    /// Replaces the null markers. The empty string stays a marker regardless.
    pub fn with_null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_null(&self, raw: &str) -> bool {
        raw.is_empty() || self.null_values.iter().any(|value| value == raw)
    }

    fn forces_text(&self, column: &str) -> bool {
        self.policy == InferPolicy::Off || self.text_columns.iter().any(|name| name == column)
    }
}

/// Decide the type of one column from its raw cells. `None` is a missing
/// cell (short row) and counts as null.
pub fn infer_column<'a, I>(column: &str, cells: I, options: &InferOptions) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let forced_text = options.forces_text(column);
    let mut any = false;
    let mut integer = !forced_text;
    let mut float = !forced_text;
    let mut boolean = !forced_text;

    for raw in cells.into_iter().flatten() {
        if options.is_null(raw) {
            continue;
        }
        any = true;
        if integer && parse_int(raw).is_none() {
            integer = false;
        }
        if float && parse_float(raw).is_none() {
            float = false;
        }
        if boolean && parse_bool(raw).is_none() {
            boolean = false;
        }
        if forced_text || !(integer || float || boolean) {
            break;
        }
    }

    match (any, integer, float, boolean) {
        (false, _, _, _) => ColumnType::Empty,
        (true, true, _, _) => ColumnType::Integer,
        (true, false, true, _) => ColumnType::Float,
        (true, false, false, true) => ColumnType::Boolean,
        _ => ColumnType::Text,
    }
}

/// Convert one raw cell to the column's type.
pub fn cast(raw: Option<&str>, column_type: ColumnType, options: &InferOptions) -> Cell {
    let Some(raw) = raw else {
        return Cell::Null;
    };
    if options.is_null(raw) {
        return Cell::Null;
    }
    let cell = match column_type {
        ColumnType::Empty => Some(Cell::Null),
        ColumnType::Integer => parse_int(raw),
        ColumnType::Float => parse_float(raw).map(Cell::Float),
        ColumnType::Boolean => parse_bool(raw).map(Cell::Bool),
        ColumnType::Text => None,
    };
    cell.unwrap_or_else(|| Cell::Text(raw.to_string()))
}

fn parse_int(raw: &str) -> Option<Cell> {
    let trimmed = raw.trim_ascii();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Cell::Int(value));
    }
    trimmed.parse::<u64>().ok().map(Cell::UInt)
}

fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_ascii();
    // Rust accepts "inf"/"nan" spellings; JSON cannot carry them.
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim_ascii() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
