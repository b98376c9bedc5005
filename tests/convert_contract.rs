//! Purpose: Contract coverage for the conversion properties front-end consumers rely on.
//! Exports: Integration tests only.
//! Role: Exercise the public `api` surface end to end through real files.
//! Invariants: One output object per data row, keyed by exactly the header names.
//! Invariants: Output bytes are deterministic for identical input.

use std::collections::BTreeSet;
use std::fs;

use impact2json::api::{
    ConvertConfig, ErrorKind, InferOptions, InferPolicy, ReadOptions, convert, convert_with,
    load_dataset,
};
use serde_json::{Value, json};

fn convert_text(text: &str) -> Value {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    let output = temp.path().join("out.json");
    fs::write(&input, text).expect("write input");
    convert(&input, &output).expect("convert");
    serde_json::from_slice(&fs::read(&output).expect("read output")).expect("json")
}

#[test]
fn every_row_becomes_one_object_with_header_keys() {
    let cases = [
        "a,b,c\n1,2,3\n",
        "id,entity,impact\n1,WHO,x\n2,,y\n3,WFP,\n",
        "only\n\"quoted, value\"\n\"\"\n",
        "x,y\n1,2\n3,4\n5,6\n7,8\n",
    ];
    for text in cases {
        let header: BTreeSet<String> = text
            .lines()
            .next()
            .expect("header")
            .split(',')
            .map(str::to_string)
            .collect();
        let data_rows = text.lines().count() - 1;

        let value = convert_text(text);
        let rows = value.as_array().expect("array");
        assert_eq!(rows.len(), data_rows, "input: {text:?}");
        for row in rows {
            let keys: BTreeSet<String> =
                row.as_object().expect("object").keys().cloned().collect();
            assert_eq!(keys, header, "input: {text:?}");
        }
    }
}

#[test]
fn header_only_produces_empty_array() {
    assert_eq!(convert_text("name,value\n"), json!([]));
}

#[test]
fn empty_field_is_null_not_empty_string() {
    let value = convert_text("name,note\nflood,\n");
    assert_eq!(value[0]["note"], Value::Null);
}

#[test]
fn mixed_column_keeps_numbers_as_text() {
    let value = convert_text("code\n12\nA7\n");
    assert_eq!(value, json!([{"code": "12"}, {"code": "A7"}]));
}

#[test]
fn infer_off_keeps_everything_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    let output = temp.path().join("out.json");
    fs::write(&input, "n,flag\n1,true\n,false\n").expect("write input");
    let config = ConvertConfig::new(&input, &output)
        .with_infer(InferOptions::default().with_policy(InferPolicy::Off));

    convert_with(&config).expect("convert");
    let value: Value = serde_json::from_slice(&fs::read(&output).expect("read")).expect("json");
    assert_eq!(
        value,
        json!([
            {"n": "1", "flag": "true"},
            {"n": null, "flag": "false"}
        ])
    );
}

#[test]
fn strict_config_rejects_short_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("in.csv");
    let output = temp.path().join("out.json");
    fs::write(&input, "a,b\n1\n").expect("write input");
    let config = ConvertConfig::new(&input, &output).with_strict(true);

    let err = convert_with(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!output.exists());
}

#[test]
fn duplicate_headers_are_suffixed() {
    let value = convert_text("a,a,\n1,2,3\n");
    assert_eq!(value, json!([{"a": 1, "a.1": 2, "Unnamed: 2": 3}]));
}

#[test]
fn suffixed_duplicate_does_not_collide_with_existing_header() {
    let value = convert_text("a,a,a.1\n1,2,3\n");
    assert_eq!(value, json!([{"a": 1, "a.1": 2, "a.1.1": 3}]));
}

#[test]
fn load_dataset_reports_missing_input() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = load_dataset(&temp.path().join("nope.csv"), &ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
