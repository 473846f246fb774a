//! Models Module
//!
//! Per-call options and the expiry union.

pub mod options;

pub use options::{CallOptions, Expiry};
