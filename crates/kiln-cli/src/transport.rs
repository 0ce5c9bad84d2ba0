//! Stdio transport.
//!
//! Two framings, chosen on the command line:
//! - `lines`: one JSON request per line in, one JSON response per line out
//! - `framed`: `Content-Length` framed JSON both ways; a header-less line is
//!   accepted as a bare JSON message
//!
//! Requests that fail to decode get a `Response::Error` and the loop goes on.
//! Connection requests are admitted here and never reach the dispatcher. The
//! loop ends at end of input or once the state stops accepting requests.

use std::io::{BufRead, Write};

use anyhow::{Context, bail};
use tracing::{debug, info};

use kiln_common::limits::MAX_MESSAGE_BYTES;
use kiln_server::{Request, Response, Server, ServerState};

use crate::args::Protocol;

/// Read one `Content-Length` framed message. `None` at end of input.
pub fn read_framed_message(reader: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    let header = loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if !line.is_empty() {
            break line.to_string();
        }
    };

    let Some(length) = header.strip_prefix("Content-Length:") else {
        return Ok(Some(header));
    };
    let length = length
        .trim()
        .parse::<usize>()
        .with_context(|| format!("invalid Content-Length: {}", length.trim()))?;
    if length > MAX_MESSAGE_BYTES {
        bail!("Content-Length {length} exceeds the {MAX_MESSAGE_BYTES} byte limit");
    }

    let mut separator = String::new();
    reader.read_line(&mut separator)?;

    let mut body = vec![0u8; length];
    reader
        .read_exact(&mut body)
        .context("truncated message body")?;
    String::from_utf8(body)
        .map(Some)
        .context("invalid UTF-8 in message body")
}

pub fn write_framed_message(output: &mut impl Write, message: &str) -> anyhow::Result<()> {
    write!(output, "Content-Length: {}\r\n\r\n{}", message.len(), message)?;
    output.flush()?;
    Ok(())
}

fn read_message(protocol: Protocol, input: &mut impl BufRead) -> anyhow::Result<Option<String>> {
    match protocol {
        Protocol::Framed => read_framed_message(input),
        Protocol::Lines => {
            let mut line = String::new();
            if input
                .read_line(&mut line)
                .context("failed to read from stdin")?
                == 0
            {
                return Ok(None);
            }
            Ok(Some(line))
        }
    }
}

fn write_response(
    protocol: Protocol,
    output: &mut impl Write,
    response: &Response,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(response)?;
    match protocol {
        Protocol::Framed => write_framed_message(output, &json),
        Protocol::Lines => {
            writeln!(output, "{json}")?;
            output.flush()?;
            Ok(())
        }
    }
}

/// Serve requests from `input` until it ends or the server stops.
///
/// Returns the final state. A dispatcher error is fatal and ends the loop.
pub fn serve(
    server: &Server,
    mut state: ServerState,
    protocol: Protocol,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<ServerState> {
    while let Some(message) = read_message(protocol, input)? {
        if message.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&message) {
            Ok(request) => request,
            Err(error) => {
                debug!(%error, "undecodable request");
                let response = Response::Error {
                    message: format!("invalid request: {error}"),
                };
                write_response(protocol, output, &response)?;
                continue;
            }
        };

        let response = match request {
            Request::ClientConnection { client } => {
                info!(%client, "client connected");
                Some(Response::Ok)
            }
            request => {
                let (next, response) = server.process(state, request)?;
                state = next;
                response
            }
        };
        if let Some(response) = &response {
            write_response(protocol, output, response)?;
        }

        if !state.is_accepting_requests() {
            info!(status = ?state.status, "no longer accepting requests");
            break;
        }
    }
    Ok(state)
}

#[cfg(test)]
#[path = "../tests/transport_tests.rs"]
mod transport_tests;
