// Core modules implementing reading, inference, encoding, and error modeling.
pub mod convert;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod impact;
pub mod infer;
