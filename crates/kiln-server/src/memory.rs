//! Memory-pressure policy.
//!
//! Before each recheck the server samples the heap use ratio. Above
//! `HEAP_RATIO_GC_THRESHOLD` it drops the memoized attribute cache, returns
//! spare capacity from its maps, and asks the probe to reclaim. None of this
//! changes analysis results; it only trades memory for recomputation.

use std::path::PathBuf;

use tracing::info;

use kiln_common::limits::{HEAP_RATIO_GC_THRESHOLD, STATM_PAGE_SIZE};

use crate::services::MemoryProbe;
use crate::state::ServerState;

/// Resident set size from `/proc/self/statm` against a fixed budget.
#[derive(Debug, Clone)]
pub struct StatmProbe {
    statm_path: PathBuf,
    budget_bytes: u64,
}

impl StatmProbe {
    pub fn new(budget_bytes: u64) -> Self {
        Self::with_path("/proc/self/statm", budget_bytes)
    }

    pub fn with_path(statm_path: impl Into<PathBuf>, budget_bytes: u64) -> Self {
        Self {
            statm_path: statm_path.into(),
            budget_bytes,
        }
    }

    /// Resident bytes, or `None` where `statm` is unavailable.
    pub fn resident_bytes(&self) -> Option<u64> {
        std::fs::read_to_string(&self.statm_path)
            .ok()
            .and_then(|s| s.split_whitespace().nth(1)?.parse::<u64>().ok())
            .map(|pages| pages * STATM_PAGE_SIZE)
    }
}

impl MemoryProbe for StatmProbe {
    fn heap_use_ratio(&self) -> f64 {
        if self.budget_bytes == 0 {
            return 0.0;
        }
        self.resident_bytes()
            .map_or(0.0, |bytes| bytes as f64 / self.budget_bytes as f64)
    }
}

/// Run the reclamation pass when the probe reports pressure.
///
/// Returns whether a pass ran.
pub fn relieve_memory_pressure(state: &mut ServerState, probe: &dyn MemoryProbe) -> bool {
    let before = probe.heap_use_ratio();
    if before <= HEAP_RATIO_GC_THRESHOLD {
        return false;
    }

    state.environment.invalidate_attribute_cache();
    state.environment.shrink_to_fit();
    state.errors.shrink_to_fit();
    state.lookups.shrink_to_fit();
    probe.reclaim();

    let after = probe.heap_use_ratio();
    info!(before, after, "reclaimed memory under pressure");
    true
}
