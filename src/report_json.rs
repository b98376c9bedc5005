//! Purpose: JSON envelopes for command results (stdout) and notices (stderr).
//! Exports: `convert_summary_json`, `validation_report_json`, `impact_stats_json`,
//! `padded_notice_json`.
//! Role: Keep stdout payload shapes in one place, separate from dispatch.
//! Invariants: Stable key names for summary, report, and stats payloads.
//! Invariants: Optional fields are omitted rather than emitted as null.

use std::path::Path;

use impact2json::api::{ConvertSummary, ImpactStats, ValidationIssue, ValidationReport};
use serde_json::{Map, Value, json};

pub(crate) fn convert_summary_json(summary: &ConvertSummary) -> Value {
    let columns = summary
        .columns
        .iter()
        .zip(summary.column_types.iter())
        .map(|(name, column_type)| json!({ "name": name, "type": column_type.as_str() }))
        .collect::<Vec<_>>();
    json!({
        "converted": {
            "input": summary.input.display().to_string(),
            "output": summary.output.display().to_string(),
            "rows": summary.rows,
            "padded_rows": summary.padded_rows,
            "bytes": summary.bytes_written,
            "columns": columns,
        }
    })
}

pub(crate) fn validation_report_json(input: &Path, report: &ValidationReport) -> Value {
    let issues = report.issues.iter().map(issue_json).collect::<Vec<_>>();
    json!({
        "report": {
            "input": input.display().to_string(),
            "status": report.status.as_str(),
            "records": report.records,
            "issue_count": report.issue_count,
            "issues": issues,
        }
    })
}

pub(crate) fn impact_stats_json(stats: &ImpactStats) -> Value {
    json!({
        "stats": {
            "total": stats.total,
            "unique_entities": stats.unique_entities,
            "entities": stats.entities,
        }
    })
}

/// Non-fatal stderr notice for rows that were shorter than the header.
pub(crate) fn padded_notice_json(
    cmd: &str,
    input: &Path,
    padded_rows: usize,
    time: &str,
) -> Value {
    json!({
        "notice": {
            "kind": "padded",
            "time": time,
            "cmd": cmd,
            "input": input.display().to_string(),
            "message": format!("padded {padded_rows} short row(s) with null"),
            "padded_rows": padded_rows,
        }
    })
}

fn issue_json(issue: &ValidationIssue) -> Value {
    let mut map = Map::new();
    map.insert("code".to_string(), json!(issue.code));
    map.insert("message".to_string(), json!(issue.message));
    if let Some(row) = issue.row {
        map.insert("row".to_string(), json!(row));
    }
    if let Some(column) = &issue.column {
        map.insert("column".to_string(), json!(column));
    }
    Value::Object(map)
}
