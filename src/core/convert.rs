//! Purpose: Run the full CSV-to-JSON conversion between two files.
//! Exports: `ConvertConfig`, `ConvertSummary`, `convert`, `convert_with`, `load_dataset`.
//! Role: Ties reading, inference, encoding, and writing into one call.
//! Invariants: The input is fully read and encoded before the output is opened.
//! Invariants: A failed read never creates or touches the output file.
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::dataset::{Dataset, ReadOptions, read_csv};
use super::encode::{to_json_bytes, write_output};
use super::error::{Error, ErrorKind};
use super::infer::{ColumnType, InferOptions};

pub const DEFAULT_INPUT: &str = "data/input/impacts.csv";
pub const DEFAULT_OUTPUT: &str = "public/data/impacts.json";

#[derive(Clone, Debug)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub read: ReadOptions,
    pub create_dirs: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT, DEFAULT_OUTPUT)
    }
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            read: ReadOptions::default(),
            create_dirs: false,
        }
    }

    pub fn with_read(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    pub fn with_infer(mut self, infer: InferOptions) -> Self {
        self.read.infer = infer;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.read.strict = strict;
        self
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConvertSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: usize,
    pub padded_rows: usize,
    pub bytes_written: usize,
}

/// Convert `input` to `output` with default inference.
pub fn convert(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<(), Error> {
    let config = ConvertConfig::new(input.as_ref(), output.as_ref());
    convert_with(&config).map(|_| ())
}

pub fn convert_with(config: &ConvertConfig) -> Result<ConvertSummary, Error> {
    let dataset = load_dataset(&config.input, &config.read)?;
    write_dataset(&dataset, config)
}

/// Encode and write an already loaded dataset.
pub fn write_dataset(dataset: &Dataset, config: &ConvertConfig) -> Result<ConvertSummary, Error> {
    let bytes = to_json_bytes(dataset)?;
    write_output(&config.output, &bytes, config.create_dirs)?;
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        rows = dataset.len(),
        bytes = bytes.len(),
        "wrote json"
    );

    Ok(ConvertSummary {
        input: config.input.clone(),
        output: config.output.clone(),
        columns: dataset.columns().to_vec(),
        column_types: dataset.column_types().to_vec(),
        rows: dataset.len(),
        padded_rows: dataset.padded_rows(),
        bytes_written: bytes.len(),
    })
}

pub fn load_dataset(path: &Path, options: &ReadOptions) -> Result<Dataset, Error> {
    let file = File::open(path).map_err(|err| open_error(err, path))?;
    tracing::debug!(path = %path.display(), "reading csv");
    read_csv(BufReader::new(file), options).map_err(|err| {
        if err.path().is_some() {
            err
        } else {
            err.with_path(path)
        }
    })
}

fn open_error(err: io::Error, path: &Path) -> Error {
    let (kind, message) = match err.kind() {
        io::ErrorKind::NotFound => (ErrorKind::NotFound, "input file not found"),
        io::ErrorKind::PermissionDenied => (ErrorKind::Io, "permission denied reading input"),
        _ => (ErrorKind::Io, "failed to open input"),
    };
    Error::new(kind)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}
