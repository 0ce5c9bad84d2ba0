//! Interfaces to the collaborators the core drives but does not implement.
//!
//! The recheck pipeline calls these at fixed steps: the parser during
//! re-parse, the suppression registrar after repopulation, the analyzer for
//! every analysis target, and the memory probe before each recheck. Rage
//! requests go to the log collector verbatim.

use serde::Serialize;

use kiln_common::{Diagnostic, FileHandle};
use kiln_solver::{ModuleDefinition, TypeEnvironment};

use crate::config::ServerConfiguration;
use crate::lookup::LookupTable;
use crate::scheduling::SchedulingMode;

/// Parser/binder for one source file.
pub trait SourceParser: Send + Sync {
    /// Module-level bindings of `handle`, or `None` when the file is gone.
    ///
    /// Syntax errors are not failures: the parser returns whatever bindings it
    /// recovered and the analyzer reports the errors as diagnostics. An `Err`
    /// is a broken service contract and fails the whole request.
    fn parse(
        &self,
        config: &ServerConfiguration,
        handle: &FileHandle,
    ) -> anyhow::Result<Option<ModuleDefinition>>;
}

/// Output of analyzing one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileAnalysis {
    pub diagnostics: Vec<Diagnostic>,
    pub lookup: LookupTable,
}

/// Per-file analysis against a repopulated environment.
///
/// Must be callable from several worker threads at once; the environment is
/// shared read-only for the duration of a batch.
pub trait Analyzer: Send + Sync {
    fn analyze_file(
        &self,
        handle: &FileHandle,
        environment: &TypeEnvironment,
    ) -> anyhow::Result<FileAnalysis>;

    /// Called once per analysis batch before any file is analyzed.
    fn on_schedule(&self, _mode: SchedulingMode, _batch_len: usize) {}
}

pub trait SuppressionRegistrar: Send + Sync {
    fn register(&self, handles: &[FileHandle]);
}

/// Registrar for servers that do not track suppression directives.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSuppressions;

impl SuppressionRegistrar for NoSuppressions {
    fn register(&self, _handles: &[FileHandle]) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogItem {
    pub title: String,
    pub contents: String,
}

pub trait LogCollector: Send + Sync {
    fn collect_logs(&self, config: &ServerConfiguration) -> anyhow::Result<Vec<LogItem>>;
}

/// Runtime memory signal.
pub trait MemoryProbe: Send + Sync {
    /// Used/available memory, usually in `0.0..=1.0`.
    fn heap_use_ratio(&self) -> f64;

    /// Ask the allocator or runtime to return memory. Called after the server
    /// has dropped its own caches.
    fn reclaim(&self) {}
}

/// Everything the core needs from the outside world.
pub struct Services {
    pub parser: Box<dyn SourceParser>,
    pub analyzer: Box<dyn Analyzer>,
    pub suppressions: Box<dyn SuppressionRegistrar>,
    pub logs: Box<dyn LogCollector>,
    pub memory: Box<dyn MemoryProbe>,
}
