//! Tracing and logging setup shared by the terminal binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init};
