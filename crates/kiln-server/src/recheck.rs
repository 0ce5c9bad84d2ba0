//! Recheck Pipeline and the deferred-queue flush.
//!
//! One recheck runs these steps in order:
//! 1. relieve memory pressure if the probe reports it
//! 2. queue a check of the direct dependents of changed files
//! 3. pick the scheduling mode for the analysis batch
//! 4. re-parse the changed files
//! 5. drop memoized attribute resolutions
//! 6. repopulate the environment with the re-parsed modules
//! 7. notify the suppression registrar
//! 8. analyze every check file against the updated environment
//! 9. replace the lookup tables of the analyzed files
//! 10. replace their error-cache entries
//! 11. add them to the known handles
//! 12. build the per-file error map over the check files
//!
//! Ripples go through the deferred queue instead of recursing, so the depth
//! of a recheck never depends on the shape of the dependency graph.

use anyhow::Context;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use tracing::{debug, info_span, warn};

use kiln_common::FileHandle;
use kiln_common::limits::MAX_FLUSH_GENERATIONS;
use kiln_solver::ModuleDefinition;

use crate::deferred::RecheckRequest;
use crate::error_cache::{FileErrorMap, build_file_error_map};
use crate::memory::relieve_memory_pressure;
use crate::scheduling::SchedulingMode;
use crate::server::Server;
use crate::services::FileAnalysis;
use crate::state::ServerState;

impl Server {
    /// Run one recheck and return the error map over its check files.
    ///
    /// Parse and analysis problems are diagnostics; an `Err` here means a
    /// collaborator broke its contract and the request failed as a whole.
    pub fn type_check(
        &self,
        mut state: ServerState,
        request: RecheckRequest,
    ) -> anyhow::Result<(ServerState, FileErrorMap)> {
        let RecheckRequest {
            update_files,
            check_files,
        } = RecheckRequest::flatten([request]);
        let _span = info_span!(
            "type_check",
            update = update_files.len(),
            check = check_files.len()
        )
        .entered();

        relieve_memory_pressure(&mut state, self.services.memory.as_ref());

        if !update_files.is_empty() {
            let checking: FxHashSet<&FileHandle> = check_files.iter().collect();
            let mut ripple: IndexSet<FileHandle> = IndexSet::new();
            for changed in &update_files {
                for dependent in state.environment.dependents_of(changed) {
                    if !checking.contains(&dependent) {
                        ripple.insert(dependent);
                    }
                }
            }
            if !ripple.is_empty() {
                debug!(files = ripple.len(), "deferring recheck of dependents");
                state
                    .deferred
                    .push(RecheckRequest::check_only(ripple.into_iter().collect()));
            }
        }

        let mode = SchedulingMode::for_batch(check_files.len(), self.config.parallel_threshold);

        let reparsed = self.reparse(&update_files)?;

        state.environment.invalidate_attribute_cache();
        if !reparsed.is_empty() {
            let _span = info_span!("repopulate", files = reparsed.len()).entered();
            state.environment.repopulate(reparsed);
            self.services.suppressions.register(&update_files);
        }

        let analyses = self.analyze(&state, &check_files, mode)?;

        let mut diagnostics = Vec::new();
        for (handle, analysis) in check_files.iter().zip(analyses) {
            state.lookups.replace(handle.clone(), analysis.lookup);
            diagnostics.extend(analysis.diagnostics);
        }
        state.errors.replace_for(&check_files, diagnostics.clone());
        state.handles.extend(check_files.iter().cloned());

        Ok((state, build_file_error_map(&check_files, diagnostics)))
    }

    fn reparse(
        &self,
        update_files: &[FileHandle],
    ) -> anyhow::Result<Vec<(FileHandle, Option<ModuleDefinition>)>> {
        if update_files.is_empty() {
            return Ok(Vec::new());
        }
        let _span = info_span!("reparse", files = update_files.len()).entered();
        update_files
            .iter()
            .map(|handle| {
                let module = self
                    .services
                    .parser
                    .parse(&self.config, handle)
                    .with_context(|| format!("failed to parse {handle}"))?;
                Ok((handle.clone(), module))
            })
            .collect()
    }

    /// Analyze `targets` under `mode`. Results come back in target order, and
    /// only after every worker has finished.
    fn analyze(
        &self,
        state: &ServerState,
        targets: &[FileHandle],
        mode: SchedulingMode,
    ) -> anyhow::Result<Vec<FileAnalysis>> {
        let _span = info_span!("analyze_files", files = targets.len(), mode = mode.as_str())
            .entered();
        let analyzer = self.services.analyzer.as_ref();
        analyzer.on_schedule(mode, targets.len());

        let environment = &state.environment;
        mode.run(targets, |handle| {
            analyzer
                .analyze_file(handle, environment)
                .with_context(|| format!("failed to analyze {handle}"))
        })
        .into_iter()
        .collect()
    }

    /// Drain the deferred queue to a fixpoint, then return every cached
    /// diagnostic over every known file.
    pub fn flush(&self, mut state: ServerState) -> anyhow::Result<(ServerState, FileErrorMap)> {
        let _span = info_span!("flush_errors").entered();
        let mut generations = 0;
        while !state.deferred.is_empty() {
            if generations == MAX_FLUSH_GENERATIONS {
                warn!(
                    pending = state.deferred.len(),
                    "flush generation limit reached, leaving remaining rechecks queued"
                );
                break;
            }
            let request = RecheckRequest::flatten(state.deferred.take());
            (state, _) = self.type_check(state, request)?;
            generations += 1;
        }
        debug!(generations, "deferred queue drained");

        let errors = build_file_error_map(&state.handles, state.errors.all());
        Ok((state, errors))
    }
}

#[cfg(test)]
#[path = "../tests/recheck_tests.rs"]
mod recheck_tests;
