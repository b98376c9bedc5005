//! Purpose: Define the public Rust API boundary for impact2json.
//! Exports: Conversion entry points, dataset/inference types, impact checks, errors.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to core modules.

pub use crate::core::convert::{
    ConvertConfig, ConvertSummary, DEFAULT_INPUT, DEFAULT_OUTPUT, convert, convert_with,
    load_dataset, write_dataset,
};
pub use crate::core::dataset::{Dataset, ReadOptions, Record, normalize_headers, read_csv};
pub use crate::core::encode::{to_json_bytes, write_output};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::impact::{
    ImpactStats, REQUIRED_COLUMNS, ValidationIssue, ValidationReport, ValidationStatus,
    check_impacts, impact_stats,
};
pub use crate::core::infer::{
    Cell, ColumnType, DEFAULT_NULL_VALUES, InferOptions, InferPolicy, cast, infer_column,
};
