//! Shared test utilities for casefile integration tests.
//!
//! - `TestHarness` wires a pipeline over a temp-dir object store
//! - builders create records, PDFs and DOCX packages for seeding folders

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{RecordingNotifier, ScriptedChat, TestHarness, BUCKET};
