//! Bridged-protocol codec.
//!
//! Editor clients speak JSON-RPC. The transport wraps each of their messages
//! in `Request::Bridged`; this module decodes the handful of methods the core
//! answers and encodes replies back. Messages that do not decode are dropped,
//! and methods the core does not handle decode to `Unknown`, which gets no
//! reply.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use kiln_common::{Location, Position};

use crate::config::ServerConfiguration;
use crate::error_cache::FileErrorMap;
use crate::server::HoverInfo;

/// Notification carrying the error map produced by a save.
pub const TYPE_ERRORS_NOTIFICATION: &str = "kiln/typeErrors";

#[derive(Debug, Clone, PartialEq)]
pub enum BridgedRequest {
    Definition {
        id: Value,
        file: String,
        position: Position,
    },
    Hover {
        id: Value,
        file: String,
        position: Position,
    },
    Shutdown {
        id: Value,
    },
    Exit,
    Rage {
        id: Value,
    },
    /// A saved file: re-parse and recheck it.
    DidSave {
        file: String,
    },
    Unknown {
        method: String,
    },
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct TextDocumentIdentifier {
    uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDocumentPositionParams {
    text_document: TextDocumentIdentifier,
    position: Position,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidSaveParams {
    text_document: TextDocumentIdentifier,
}

/// Path named by a `file://` URI, percent-decoded; other strings are taken
/// as paths.
pub fn uri_to_path(uri: &str) -> String {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map_or_else(|| uri.to_string(), |path| path.to_string_lossy().into_owned())
}

/// `file://` URI for an absolute path.
fn path_to_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}

/// Decode one JSON-RPC message. `None` means the message is malformed.
pub fn decode(message: &Value) -> Option<BridgedRequest> {
    let raw = RawMessage::deserialize(message).ok()?;
    let request = match raw.method.as_str() {
        "textDocument/definition" | "textDocument/hover" => {
            let params = TextDocumentPositionParams::deserialize(&raw.params).ok()?;
            let id = raw.id?;
            let file = uri_to_path(&params.text_document.uri);
            if raw.method == "textDocument/definition" {
                BridgedRequest::Definition {
                    id,
                    file,
                    position: params.position,
                }
            } else {
                BridgedRequest::Hover {
                    id,
                    file,
                    position: params.position,
                }
            }
        }
        "shutdown" => BridgedRequest::Shutdown { id: raw.id? },
        "exit" => BridgedRequest::Exit,
        "telemetry/rage" => BridgedRequest::Rage { id: raw.id? },
        "textDocument/didSave" => {
            let params = DidSaveParams::deserialize(&raw.params).ok()?;
            BridgedRequest::DidSave {
                file: uri_to_path(&params.text_document.uri),
            }
        }
        _ => BridgedRequest::Unknown { method: raw.method },
    };
    Some(request)
}

pub fn encode_result(id: Value, result: &impl Serialize) -> anyhow::Result<Value> {
    Ok(json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": serde_json::to_value(result)?,
    }))
}

/// Definition reply with the location as an absolute `file://` URI.
pub fn encode_definition(
    id: Value,
    location: Option<&Location>,
    config: &ServerConfiguration,
) -> anyhow::Result<Value> {
    let result = location.map(|location| {
        json!({
            "uri": path_to_uri(&config.resolve(&location.file)),
            "range": location.range,
        })
    });
    encode_result(id, &result)
}

pub fn encode_hover(id: Value, hover: &HoverInfo) -> anyhow::Result<Value> {
    let mut result = json!({
        "contents": {"kind": "plaintext", "value": hover.text},
    });
    if let Some(location) = &hover.location {
        result["range"] = serde_json::to_value(location.range)?;
    }
    encode_result(id, &result)
}

pub fn encode_type_errors(errors: &FileErrorMap) -> anyhow::Result<Value> {
    Ok(json!({
        "jsonrpc": "2.0",
        "method": TYPE_ERRORS_NOTIFICATION,
        "params": {"errors": serde_json::to_value(errors)?},
    }))
}

#[cfg(test)]
#[path = "../tests/bridge_tests.rs"]
mod bridge_tests;
