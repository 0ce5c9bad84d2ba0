//! Centralized limits and thresholds for the analysis server.
//!
//! This module provides shared constants for scheduling, memory pressure,
//! and recursion depths used throughout the codebase. Centralizing these values
//! keeps the recheck pipeline, the type lattice, and their tests agreeing on
//! the same numbers.

// =============================================================================
// Scheduling
// =============================================================================

/// Largest analysis batch that still runs sequentially.
///
/// A recheck whose analysis targets number more than this fans out across the
/// worker pool; batches of this size or smaller run on the request thread,
/// where the cost of dispatching work to other threads would dominate.
pub const PARALLEL_CHECK_THRESHOLD: usize = 5;

// =============================================================================
// Memory Pressure
// =============================================================================

/// Heap use ratio above which a recheck reclaims memory before running.
///
/// The ratio is reported by a `MemoryProbe` as used/available. Reclamation is
/// advisory: it never changes analysis results, only the footprint of caches
/// that will be rebuilt on demand.
pub const HEAP_RATIO_GC_THRESHOLD: f64 = 0.5;

/// Default memory budget used by the `/proc/self/statm` probe (4 GiB).
pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Page size assumed when converting `statm` page counts to bytes.
pub const STATM_PAGE_SIZE: u64 = 4096;

// =============================================================================
// Fixpoint / Recursion Limits
// =============================================================================

/// Maximum number of deferred-queue generations drained by one flush.
///
/// Each generation rechecks the dependents of the previous one. Ripples
/// subtract files already in the check set, so a cycle in the dependency
/// graph keeps producing work only while new files are reached; this bound
/// stops a flush from running unbounded on a pathological graph.
pub const MAX_FLUSH_GENERATIONS: usize = 1024;

/// Maximum depth when walking class ancestry.
///
/// Guards ancestor enumeration and attribute resolution against cyclic or
/// absurdly deep class hierarchies coming from partially edited sources.
///
/// ```text
/// class A(B)
/// class B(A)   # cycle: ancestry of A never terminates without the guard
/// ```
pub const MAX_ANCESTRY_DEPTH: usize = 256;

/// Maximum nesting depth for type expressions in queries (`List[List[...]]`).
pub const MAX_TYPE_EXPRESSION_DEPTH: usize = 64;

// =============================================================================
// Transport
// =============================================================================

/// Largest `Content-Length` body the framed transport will read (64 MiB).
///
/// A larger header is rejected before any buffer is allocated for it.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;
