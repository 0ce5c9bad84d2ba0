use std::io::Cursor;

use serde_json::{Value, json};

use kiln_server::ServerStatus;

use super::*;
use crate::test_support::Project;

fn run(project: &Project, protocol: Protocol, input: &str) -> (ServerState, Vec<u8>) {
    let server = project.server();
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    let state = serve(&server, ServerState::new(), protocol, &mut input, &mut output).unwrap();
    (state, output)
}

fn lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn framed(message: &Value) -> String {
    let body = message.to_string();
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

#[test]
fn test_lines_protocol_round_trip() {
    let project = Project::new();
    project.write("a.kiln", "class A\nclass B(A)\n");
    let input = [
        json!({"type": "typeCheck", "updateFiles": ["a.kiln"], "checkFiles": ["a.kiln"]}),
        json!({"type": "typeQuery", "query": {"kind": "superclasses", "name": "B"}}),
    ]
    .iter()
    .map(|request| format!("{request}\n"))
    .collect::<String>();

    let (state, output) = run(&project, Protocol::Lines, &input);
    let responses = lines(&output);
    assert_eq!(
        responses[0],
        json!({"type": "typeErrors", "errors": {"a.kiln": []}})
    );
    assert_eq!(responses[1], json!({"type": "typeQuery", "text": "A"}));
    assert!(state.is_accepting_requests());
}

#[test]
fn test_undecodable_request_gets_error_and_loop_continues() {
    let project = Project::new();
    let input = "{not json}\n\n{\"type\": \"rage\"}\n";

    let (_, output) = run(&project, Protocol::Lines, input);
    let responses = lines(&output);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["type"], json!("error"));
    assert!(
        responses[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid request")
    );
    assert_eq!(responses[1], json!({"type": "rage", "items": []}));
}

#[test]
fn test_stop_ends_the_loop() {
    let project = Project::new();
    let input = "{\"type\": \"stop\"}\n{\"type\": \"rage\"}\n";

    let (state, output) = run(&project, Protocol::Lines, input);
    assert_eq!(lines(&output), vec![json!({"type": "ok"})]);
    assert_eq!(state.status, ServerStatus::Stopping);
}

#[test]
fn test_client_connection_is_admitted_by_transport() {
    let project = Project::new();
    let input = "{\"type\": \"clientConnection\", \"client\": \"editor\"}\n";

    let (state, output) = run(&project, Protocol::Lines, input);
    assert_eq!(lines(&output), vec![json!({"type": "ok"})]);
    assert_eq!(state.performance.request_count(), 0);
}

#[test]
fn test_framed_protocol() {
    let project = Project::new();
    project.write("a.kiln", "class A(Missing)\n");
    let input = format!(
        "{}{}",
        framed(&json!({"type": "typeCheck", "updateFiles": ["a.kiln"], "checkFiles": ["a.kiln"]})),
        framed(&json!({"type": "clientExit"})),
    );

    let (state, output) = run(&project, Protocol::Framed, &input);
    assert_eq!(state.status, ServerStatus::Exited);

    let mut reader = Cursor::new(output);
    let message = read_framed_message(&mut reader).unwrap().unwrap();
    let response: Value = serde_json::from_str(&message).unwrap();
    assert_eq!(response["errors"]["a.kiln"][0]["code"], json!(1002));
    assert_eq!(read_framed_message(&mut reader).unwrap(), None);
}

#[test]
fn test_read_framed_message_accepts_bare_json_and_rejects_bad_length() {
    let mut reader = Cursor::new(b"\r\n{\"type\": \"stop\"}\n".to_vec());
    assert_eq!(
        read_framed_message(&mut reader).unwrap().as_deref(),
        Some("{\"type\": \"stop\"}")
    );

    let mut reader = Cursor::new(b"Content-Length: many\r\n\r\n{}".to_vec());
    let error = read_framed_message(&mut reader).unwrap_err();
    assert!(error.to_string().contains("invalid Content-Length"));
}

#[test]
fn test_read_framed_message_rejects_oversized_length() {
    let header = format!("Content-Length: {}\r\n\r\n{{}}", MAX_MESSAGE_BYTES + 1);
    let mut reader = Cursor::new(header.into_bytes());
    let error = read_framed_message(&mut reader).unwrap_err();
    assert!(error.to_string().contains("exceeds"), "{error}");

    let mut reader = Cursor::new(b"Content-Length: 99999999999\r\n\r\n".to_vec());
    assert!(read_framed_message(&mut reader).is_err());
}
