//! JSON encoding and output-file writing for datasets.
//!
//! Output is a pretty-printed array with two-space indentation and no
//! trailing newline. Non-ASCII text is written as-is.
use std::fs;
use std::io;
use std::path::Path;

use super::dataset::Dataset;
use super::error::{Error, ErrorKind};

pub fn to_json_bytes(dataset: &Dataset) -> Result<Vec<u8>, Error> {
    serde_json::to_vec_pretty(dataset).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode json")
            .with_source(err)
    })
}

/// Create or truncate `path` and write `bytes` to it.
pub fn write_output(path: &Path, bytes: &[u8], create_dirs: bool) -> Result<(), Error> {
    if create_dirs {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| write_error(err, parent))?;
        }
    }
    fs::write(path, bytes).map_err(|err| write_error(err, path))
}

fn write_error(err: io::Error, path: &Path) -> Error {
    let message = match err.kind() {
        io::ErrorKind::NotFound => "output directory does not exist",
        io::ErrorKind::PermissionDenied => "permission denied writing output",
        _ => "failed to write output",
    };
    Error::new(ErrorKind::Write)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{to_json_bytes, write_output};
    use crate::core::dataset::{ReadOptions, read_csv};
    use crate::core::error::ErrorKind;

    fn encode(text: &str) -> String {
        let dataset = read_csv(text.as_bytes(), &ReadOptions::default()).expect("read");
        String::from_utf8(to_json_bytes(&dataset).expect("encode")).expect("utf8")
    }

    #[test]
    fn scenario_output_is_pretty_and_ordered() {
        let json = encode("name,value\nflood,100\ndrought,\n");
        let expected = "[\n  {\n    \"name\": \"flood\",\n    \"value\": 100\n  },\n  {\n    \"name\": \"drought\",\n    \"value\": null\n  }\n]";
        assert_eq!(json, expected);
    }

    #[test]
    fn header_only_is_empty_array() {
        assert_eq!(encode("a,b\n"), "[]");
    }

    #[test]
    fn key_order_follows_columns_not_alphabet() {
        let json = encode("zeta,alpha\n1,2\n");
        let zeta = json.find("\"zeta\"").expect("zeta");
        let alpha = json.find("\"alpha\"").expect("alpha");
        assert!(zeta < alpha);
    }

    #[test]
    fn non_ascii_is_written_literally() {
        let json = encode("entity,impact\nUNHCR,Soutien à 5 millions de réfugiés\n");
        assert!(json.contains("Soutien à 5 millions de réfugiés"));
        assert!(!json.contains("\\u00e0"));
    }

    #[test]
    fn floats_keep_a_fraction() {
        let json = encode("share\n1\n2.5\n");
        assert!(json.contains("1.0"));
        assert!(json.contains("2.5"));
    }

    #[test]
    fn missing_parent_is_a_write_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing").join("out.json");
        let err = write_output(&path, b"[]", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(!path.exists());
    }

    #[test]
    fn create_dirs_builds_the_parent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("public").join("data").join("out.json");
        write_output(&path, b"[]", true).expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"[]");
    }
}
