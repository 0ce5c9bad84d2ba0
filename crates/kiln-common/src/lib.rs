//! Common types and utilities for the kiln analysis server.
//!
//! This crate provides foundational types used across all kiln crates:
//! - File identity (`FileHandle`) derived from project-relative paths
//! - Position/Range/Location types for source locations
//! - Diagnostics and the diagnostic message catalog
//! - Server limits and thresholds

// Canonical file identity used as every cache key
pub mod file_handle;
pub use file_handle::{FileHandle, normalize_lexically};

// Position/Range types for line/column source locations
pub mod position;
pub use position::{Location, Position, Range};

// Diagnostics produced by analysis and owned by the error cache
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticMessage};

// Centralized limits and thresholds
pub mod limits;
