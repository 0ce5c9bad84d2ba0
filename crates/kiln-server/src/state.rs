//! Server State, threaded by value through every request.

use indexmap::IndexSet;
use serde::Serialize;

use kiln_common::FileHandle;
use kiln_solver::TypeEnvironment;

use crate::deferred::DeferredQueue;
use crate::error_cache::ErrorCache;
use crate::lookup::LookupStore;
use crate::performance::ServerPerformance;

/// Whether the transport should keep accepting requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Running,
    /// Stop or shutdown was processed; accept nothing further.
    Stopping,
    /// The client sent exit.
    Exited,
}

#[derive(Debug, Default)]
pub struct ServerState {
    pub environment: TypeEnvironment,
    pub errors: ErrorCache,
    pub lookups: LookupStore,
    pub deferred: DeferredQueue,
    /// Every handle ever analyzed, in first-check order.
    pub handles: IndexSet<FileHandle>,
    pub performance: ServerPerformance,
    pub status: ServerStatus,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_accepting_requests(&self) -> bool {
        self.status == ServerStatus::Running
    }

    /// Drop the environment, both caches and pending work. Known handles,
    /// performance records and status are kept.
    pub(crate) fn reset_analysis(&mut self) {
        self.environment = TypeEnvironment::new();
        self.errors.clear();
        self.lookups.clear();
        self.deferred.clear();
    }
}
