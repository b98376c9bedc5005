//! Purpose: Check that a dataset has the Impact shape the front-end reads, and summarize it.
//! Exports: `ValidationReport`, `ValidationStatus`, `ValidationIssue`, `ImpactStats`,
//! `check_impacts`, `impact_stats`, `REQUIRED_COLUMNS`.
//! Role: Optional gate before writing; also backs the `check` and `stats` commands.
//! Invariants: Reports list issues in column order, then row order.
//! Invariants: Row numbers are 1-based data rows (header excluded).
use std::collections::{BTreeSet, HashMap};

use super::dataset::Dataset;
use super::error::{Error, ErrorKind};
use super::infer::Cell;

pub const REQUIRED_COLUMNS: &[&str] = &["id", "entity", "highlight", "impact"];

/// Caps per-code issue lists so a broken file does not flood the report.
const MAX_ISSUES_PER_CODE: usize = 20;

static NULL_CELL: Cell = Cell::Null;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValidationStatus {
    Ok,
    Invalid,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Ok => "ok",
            ValidationStatus::Invalid => "invalid",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub row: Option<usize>,
    pub column: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub records: usize,
    pub issues: Vec<ValidationIssue>,
    pub issue_count: usize,
}

impl ValidationReport {
    fn from_issues(records: usize, issues: Vec<ValidationIssue>, issue_count: usize) -> Self {
        let status = if issue_count == 0 {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Invalid
        };
        Self {
            status,
            records,
            issues,
            issue_count,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImpactStats {
    pub total: usize,
    pub unique_entities: usize,
    pub entities: Vec<String>,
}

pub fn check_impacts(dataset: &Dataset) -> ValidationReport {
    let mut collector = IssueCollector::default();

    for &column in REQUIRED_COLUMNS {
        if dataset.column_index(column).is_none() {
            collector.push(issue(
                "missing-column",
                format!("missing required column `{column}`"),
                None,
                Some(column),
            ));
        }
    }

    for &column in REQUIRED_COLUMNS {
        if dataset.column_index(column).is_none() {
            continue;
        }
        let expected = if column == "id" { "number" } else { "string" };
        for (idx, record) in dataset.records().enumerate() {
            let cell = record.get(column).unwrap_or(&NULL_CELL);
            let fits = if column == "id" {
                cell.is_number()
            } else {
                cell.as_text().is_some()
            };
            if !fits {
                collector.push(issue(
                    "wrong-type",
                    format!("`{column}` must be a {expected}, found {}", describe(cell)),
                    Some(idx + 1),
                    Some(column),
                ));
            }
        }
    }

    if dataset.column_index("id").is_some() {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, record) in dataset.records().enumerate() {
            let Some(cell) = record.get("id").filter(|cell| cell.is_number()) else {
                continue;
            };
            let key = id_key(cell);
            if let Some(first) = seen.get(&key) {
                collector.push(issue(
                    "duplicate-id",
                    format!("id {key} already used on row {first}"),
                    Some(idx + 1),
                    Some("id"),
                ));
            } else {
                seen.insert(key, idx + 1);
            }
        }
    }

    let (issues, issue_count) = collector.finish();
    ValidationReport::from_issues(dataset.len(), issues, issue_count)
}

pub fn impact_stats(dataset: &Dataset) -> Result<ImpactStats, Error> {
    if dataset.column_index("entity").is_none() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("dataset has no `entity` column")
            .with_hint("Stats need an `entity` column; run `impact2json check` for details."));
    }
    let entities: BTreeSet<String> = dataset
        .records()
        .filter_map(|record| record.get("entity").and_then(entity_text))
        .collect();
    Ok(ImpactStats {
        total: dataset.len(),
        unique_entities: entities.len(),
        entities: entities.into_iter().collect(),
    })
}

#[derive(Default)]
struct IssueCollector {
    issues: Vec<ValidationIssue>,
    per_code: HashMap<String, usize>,
    total: usize,
}

impl IssueCollector {
    fn push(&mut self, issue: ValidationIssue) {
        self.total += 1;
        let count = self.per_code.entry(issue.code.clone()).or_default();
        *count += 1;
        if *count <= MAX_ISSUES_PER_CODE {
            self.issues.push(issue);
        }
    }

    fn finish(self) -> (Vec<ValidationIssue>, usize) {
        (self.issues, self.total)
    }
}

fn issue(code: &str, message: String, row: Option<usize>, column: Option<&str>) -> ValidationIssue {
    ValidationIssue {
        code: code.to_string(),
        message,
        row,
        column: column.map(str::to_string),
    }
}

fn describe(cell: &Cell) -> &'static str {
    match cell {
        Cell::Null => "null",
        Cell::Bool(_) => "boolean",
        Cell::Int(_) | Cell::UInt(_) | Cell::Float(_) => "number",
        Cell::Text(_) => "string",
    }
}

fn id_key(cell: &Cell) -> String {
    match cell {
        Cell::Int(value) => value.to_string(),
        Cell::UInt(value) => value.to_string(),
        Cell::Float(value) => value.to_string(),
        _ => String::new(),
    }
}

// Entity columns that happen to be numeric still count as entities.
fn entity_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Null => None,
        Cell::Text(text) => Some(text.clone()),
        Cell::Bool(value) => Some(value.to_string()),
        Cell::Int(_) | Cell::UInt(_) | Cell::Float(_) => Some(id_key(cell)),
    }
}
