//! Common types and utilities for the tqual qualifier checker.
//!
//! This crate provides foundational pieces shared by the host type model and
//! the qualifier solver:
//! - String interning (`Atom`, `Interner`)
//! - Recursion and capacity limits
//! - Tracing bootstrap (`init_tracing`)

// String interning for class, type-parameter and qualifier names
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;

// Tracing subscriber setup driven by TQUAL_LOG / TQUAL_LOG_FORMAT
pub mod tracing_config;
pub use tracing_config::{LogFormat, init_tracing, try_init_tracing};
