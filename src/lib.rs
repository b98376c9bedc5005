//! Purpose: Library crate behind the `impact2json` CLI and its tests.
//! Exports: `api` (conversion, inference, impact checks, errors).
//! Role: Keeps conversion logic out of the binary so it can be tested directly.
//! Invariants: `api` is the only public path to core modules.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
mod core;
