//! Request Dispatcher.
//!
//! `Server::process` is a total function over `Request`: it consumes the
//! current state, runs the matching handler and hands back the next state
//! with an optional response. Requests are processed one at a time, so the
//! environment is never written while a query reads it.

use std::time::Instant;

use indexmap::IndexSet;
use tracing::{debug, info, info_span};

use kiln_common::{FileHandle, Location, Position};
use kiln_solver::QueryEngine;

use crate::bridge::{self, BridgedRequest};
use crate::config::ServerConfiguration;
use crate::deferred::RecheckRequest;
use crate::error::InvalidRequestError;
use crate::error_cache::{FileErrorMap, build_file_error_map};
use crate::performance::RequestKind;
use crate::protocol::{Request, Response, TypeQuery};
use crate::services::Services;
use crate::state::{ServerState, ServerStatus};

pub struct Server {
    pub(crate) config: ServerConfiguration,
    pub(crate) services: Services,
}

/// Result of resolving a hover request against the lookup store.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub location: Option<Location>,
    pub text: String,
}

impl Server {
    pub fn new(config: ServerConfiguration, services: Services) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &ServerConfiguration {
        &self.config
    }

    /// Handle one request and record its timing under its kind.
    pub fn process(
        &self,
        state: ServerState,
        request: Request,
    ) -> anyhow::Result<(ServerState, Option<Response>)> {
        let kind = RequestKind::of(&request);
        let _span = info_span!("request", kind = kind.as_str()).entered();
        let start = Instant::now();

        let (mut state, response) = self.dispatch(state, request)?;

        let elapsed = start.elapsed();
        state.performance.record(kind, elapsed);
        info!(
            kind = kind.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "request processed"
        );
        Ok((state, response))
    }

    fn dispatch(
        &self,
        mut state: ServerState,
        request: Request,
    ) -> anyhow::Result<(ServerState, Option<Response>)> {
        match request {
            Request::TypeCheck {
                update_files,
                check_files,
            } => {
                let request = RecheckRequest::new(
                    self.config.file_handles(&update_files),
                    self.config.file_handles(&check_files),
                );
                let (state, errors) = self.type_check(state, request)?;
                Ok((state, Some(Response::TypeErrors { errors })))
            }
            Request::TypeQuery { query } => {
                let response = self.type_query(&state, query);
                Ok((state, response))
            }
            Request::DisplayCachedErrors { files } => {
                let errors = self.display_cached_errors(&state, &files);
                Ok((state, Some(Response::TypeErrors { errors })))
            }
            Request::FlushErrors => {
                let (state, errors) = self.flush(state)?;
                Ok((state, Some(Response::TypeErrors { errors })))
            }
            Request::Stop | Request::ClientShutdown => {
                state.status = ServerStatus::Stopping;
                Ok((state, Some(Response::Ok)))
            }
            Request::ClientExit => {
                state.status = ServerStatus::Exited;
                Ok((state, None))
            }
            Request::Reinitialize => {
                let (state, errors) = self.reinitialize(state)?;
                Ok((state, Some(Response::TypeErrors { errors })))
            }
            Request::GetDefinition { file, position } => {
                let location = self.definition(&state, &file, position);
                Ok((state, Some(Response::GetDefinition { location })))
            }
            Request::Hover { file, position } => {
                let HoverInfo { location, text } = self.hover(&state, &file, position);
                Ok((state, Some(Response::Hover { location, text })))
            }
            Request::Rage => {
                let items = self.services.logs.collect_logs(&self.config)?;
                Ok((state, Some(Response::Rage { items })))
            }
            Request::Bridged { message } => match bridge::decode(&message) {
                Some(request) => self.dispatch_bridged(state, request),
                None => {
                    debug!("dropping undecodable bridged message");
                    Ok((state, None))
                }
            },
            Request::ClientConnection { .. } => Err(InvalidRequestError::new(
                "client connection",
                "connections are admitted by the transport before dispatch",
            )
            .into()),
        }
    }

    fn dispatch_bridged(
        &self,
        mut state: ServerState,
        request: BridgedRequest,
    ) -> anyhow::Result<(ServerState, Option<Response>)> {
        let message = match request {
            BridgedRequest::Definition { id, file, position } => {
                let location = self.definition(&state, &file, position);
                bridge::encode_definition(id, location.as_ref(), &self.config)?
            }
            BridgedRequest::Hover { id, file, position } => {
                let hover = self.hover(&state, &file, position);
                bridge::encode_hover(id, &hover)?
            }
            BridgedRequest::Shutdown { id } => {
                state.status = ServerStatus::Stopping;
                bridge::encode_result(id, &())?
            }
            BridgedRequest::Exit => {
                state.status = ServerStatus::Exited;
                return Ok((state, None));
            }
            BridgedRequest::Rage { id } => {
                let items = self.services.logs.collect_logs(&self.config)?;
                bridge::encode_result(id, &items)?
            }
            BridgedRequest::DidSave { file } => {
                let handles = self.config.file_handles([&file]);
                let request = RecheckRequest::new(handles.clone(), handles);
                let (next, errors) = self.type_check(state, request)?;
                state = next;
                bridge::encode_type_errors(&errors)?
            }
            BridgedRequest::Unknown { method } => {
                debug!(%method, "ignoring unsupported bridged method");
                return Ok((state, None));
            }
        };
        Ok((state, Some(Response::Bridged { message })))
    }

    fn type_query(&self, state: &ServerState, query: TypeQuery) -> Option<Response> {
        let engine = QueryEngine::new(&state.environment);
        let result = match query {
            TypeQuery::LessOrEqual { left, right } => engine.less_or_equal(&left, &right),
            TypeQuery::Join { left, right } => engine.join(&left, &right),
            TypeQuery::Meet { left, right } => engine.meet(&left, &right),
            TypeQuery::NormalizeType { expression } => engine.normalize(&expression),
            TypeQuery::Superclasses { name } => Ok(engine.superclasses(&name)?),
            TypeQuery::Attributes { name } => Ok(engine.attributes(&name)?),
            TypeQuery::TypeAtPosition { file, position } => {
                let handle = self.lookup_handle(&file)?;
                let (_, annotation) = state.lookups.get(&handle)?.annotation_at(position)?;
                Ok(annotation.to_string())
            }
        };
        Some(match result {
            Ok(text) => Response::TypeQuery { text },
            Err(error) => Response::QueryError {
                message: error.to_string(),
            },
        })
    }

    /// Cached diagnostics with no recomputation.
    ///
    /// No files means every known file. Otherwise only files that map to a
    /// known handle are reported; the rest are dropped.
    pub fn display_cached_errors(&self, state: &ServerState, files: &[String]) -> FileErrorMap {
        if files.is_empty() {
            return build_file_error_map(&state.handles, state.errors.all());
        }
        // Two spellings of one file map to one handle and are reported once.
        let handles: IndexSet<FileHandle> = self
            .config
            .file_handles(files)
            .into_iter()
            .filter(|handle| state.handles.contains(handle))
            .collect();
        let handles: Vec<FileHandle> = handles.into_iter().collect();
        build_file_error_map(&handles, state.errors.for_files(&handles))
    }

    /// Reset everything derived from sources and recheck every known file.
    fn reinitialize(
        &self,
        mut state: ServerState,
    ) -> anyhow::Result<(ServerState, FileErrorMap)> {
        let known: Vec<FileHandle> = state.handles.iter().cloned().collect();
        info!(files = known.len(), "reinitializing");
        state.reset_analysis();
        let (state, _) = self.type_check(state, RecheckRequest::new(known.clone(), known))?;
        self.flush(state)
    }

    /// Handle for a hover or definition path.
    ///
    /// Tries the configured roots first, then falls back to treating the raw
    /// path as a handle.
    fn lookup_handle(&self, path: &str) -> Option<FileHandle> {
        // TODO: the raw-path fallback can hide a client and server disagreeing
        // on the project root; revisit once editor clients send root-relative
        // URIs.
        self.config.file_handle(path).or_else(|| {
            let fallback = FileHandle::new(path.trim_start_matches(['/', '\\']));
            if let Some(handle) = &fallback {
                debug!(%path, %handle, "path outside every root, using raw path");
            }
            fallback
        })
    }

    /// Definition location of the symbol at `position`, if known.
    pub fn definition(
        &self,
        state: &ServerState,
        path: &str,
        position: Position,
    ) -> Option<Location> {
        let handle = self.lookup_handle(path)?;
        state.lookups.get(&handle)?.definition_at(position).cloned()
    }

    /// Hover summary at `position`. Misses are described, not errors.
    pub fn hover(&self, state: &ServerState, path: &str, position: Position) -> HoverInfo {
        let Some(handle) = self.lookup_handle(path) else {
            return HoverInfo {
                location: None,
                text: format!("No type information: `{path}` is outside the project"),
            };
        };
        let Some(table) = state.lookups.get(&handle) else {
            return HoverInfo {
                location: None,
                text: format!("No type information: `{handle}` has not been checked"),
            };
        };
        match table.annotation_at(position) {
            Some((range, annotation)) => HoverInfo {
                location: Some(Location::new(handle.clone(), *range)),
                text: format!("{annotation} ({handle}:{position})"),
            },
            None => HoverInfo {
                location: None,
                text: format!("No type annotation at {handle}:{position}"),
            },
        }
    }
}

#[cfg(test)]
#[path = "../tests/server_tests.rs"]
mod server_tests;
