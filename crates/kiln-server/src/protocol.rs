//! Request and response shapes handled by the dispatcher.
//!
//! The transport decodes one `Request` per message and encodes the optional
//! `Response` back. File operands are raw paths; the dispatcher maps them to
//! canonical handles.

use serde::{Deserialize, Serialize};

use kiln_common::{Location, Position};

use crate::error_cache::FileErrorMap;
use crate::services::LogItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Re-parse `update_files` into the environment and re-analyze
    /// `check_files`.
    TypeCheck {
        #[serde(default)]
        update_files: Vec<String>,
        #[serde(default)]
        check_files: Vec<String>,
    },
    TypeQuery {
        query: TypeQuery,
    },
    /// Cached diagnostics without recomputation; no files means all files.
    DisplayCachedErrors {
        #[serde(default)]
        files: Vec<String>,
    },
    FlushErrors,
    Stop,
    ClientShutdown,
    ClientExit,
    Reinitialize,
    GetDefinition {
        file: String,
        position: Position,
    },
    Hover {
        file: String,
        position: Position,
    },
    Rage,
    /// A JSON-RPC message from an editor client, decoded by `bridge`.
    Bridged {
        message: serde_json::Value,
    },
    /// Connection admission. Handled by the transport; never valid here.
    ClientConnection {
        client: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TypeQuery {
    LessOrEqual { left: String, right: String },
    Join { left: String, right: String },
    Meet { left: String, right: String },
    Superclasses { name: String },
    NormalizeType { expression: String },
    Attributes { name: String },
    TypeAtPosition { file: String, position: Position },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    /// Per-file diagnostics: check, flush, reinitialize and display-cached.
    TypeErrors {
        errors: FileErrorMap,
    },
    TypeQuery {
        text: String,
    },
    /// A query whose operands could not be parsed or resolved.
    QueryError {
        message: String,
    },
    GetDefinition {
        location: Option<Location>,
    },
    Hover {
        location: Option<Location>,
        text: String,
    },
    Rage {
        items: Vec<LogItem>,
    },
    /// Acknowledges stop and shutdown.
    Ok,
    /// Encoded JSON-RPC reply or notification for a bridged request.
    Bridged {
        message: serde_json::Value,
    },
    /// Transport-level failure to decode a request.
    Error {
        message: String,
    },
}
