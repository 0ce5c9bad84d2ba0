//! End-to-end request sequences through the public server API, with requests
//! decoded from JSON the way the transport receives them.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use serde_json::json;

use kiln_common::{Diagnostic, FileHandle, Location, Range};
use kiln_server::{
    Analyzer, FileAnalysis, FileErrorMap, LogCollector, LogItem, MemoryProbe, NoSuppressions,
    Request, Response, Server, ServerConfiguration, ServerState, Services, SourceParser,
};
use kiln_solver::{ClassDefinition, ClassName, ModuleDefinition, TypeEnvironment};

type Sources = Arc<RwLock<FxHashMap<FileHandle, ModuleDefinition>>>;

fn handle(path: &str) -> FileHandle {
    FileHandle::new(path).unwrap()
}

fn module(path: &str, imports: &[&str], classes: &[(&str, &[&str])]) -> ModuleDefinition {
    ModuleDefinition {
        imports: imports.iter().map(|import| handle(import)).collect(),
        classes: classes
            .iter()
            .map(|(name, bases)| ClassDefinition {
                name: ClassName::from(*name),
                bases: bases.iter().map(|base| ClassName::from(*base)).collect(),
                attributes: Vec::new(),
                location: Location::new(handle(path), Range::default()),
            })
            .collect(),
    }
}

struct FixtureParser(Sources);

impl SourceParser for FixtureParser {
    fn parse(
        &self,
        _config: &ServerConfiguration,
        handle: &FileHandle,
    ) -> anyhow::Result<Option<ModuleDefinition>> {
        Ok(self.0.read().unwrap().get(handle).cloned())
    }
}

/// Reports every declared base the environment does not know.
struct BaseChecker;

impl Analyzer for BaseChecker {
    fn analyze_file(
        &self,
        handle: &FileHandle,
        environment: &TypeEnvironment,
    ) -> anyhow::Result<FileAnalysis> {
        let mut analysis = FileAnalysis::default();
        let Some(module) = environment.module(handle) else {
            return Ok(analysis);
        };
        for class in &module.classes {
            for base in &class.bases {
                if !environment.contains_class(base) {
                    analysis.diagnostics.push(Diagnostic::error(
                        class.location.clone(),
                        format!("unknown base `{base}`"),
                        1002,
                    ));
                }
            }
        }
        Ok(analysis)
    }
}

struct NoLogs;

impl LogCollector for NoLogs {
    fn collect_logs(&self, _config: &ServerConfiguration) -> anyhow::Result<Vec<LogItem>> {
        Ok(Vec::new())
    }
}

struct NoPressure;

impl MemoryProbe for NoPressure {
    fn heap_use_ratio(&self) -> f64 {
        0.0
    }
}

fn setup() -> (Server, Sources) {
    let sources = Sources::default();
    let server = Server::new(
        ServerConfiguration::new("/project"),
        Services {
            parser: Box::new(FixtureParser(Arc::clone(&sources))),
            analyzer: Box::new(BaseChecker),
            suppressions: Box::new(NoSuppressions),
            logs: Box::new(NoLogs),
            memory: Box::new(NoPressure),
        },
    );
    (server, sources)
}

fn send(
    server: &Server,
    state: ServerState,
    request: serde_json::Value,
) -> (ServerState, Option<Response>) {
    let request: Request = serde_json::from_value(request).unwrap();
    server.process(state, request).unwrap()
}

fn errors(response: Option<Response>) -> FileErrorMap {
    match response {
        Some(Response::TypeErrors { errors }) => errors,
        other => panic!("expected type errors, got {other:?}"),
    }
}

#[test]
fn test_edit_base_module_and_flush_dependents() {
    let (server, sources) = setup();
    sources
        .write()
        .unwrap()
        .insert(handle("base.kiln"), module("base.kiln", &[], &[("Base", &[])]));
    sources.write().unwrap().insert(
        handle("derived.kiln"),
        module("derived.kiln", &["base.kiln"], &[("Derived", &["Base"])]),
    );

    let files = json!(["/project/base.kiln", "/project/derived.kiln"]);
    let (state, response) = send(
        &server,
        ServerState::new(),
        json!({"type": "typeCheck", "updateFiles": files, "checkFiles": files}),
    );
    let initial = errors(response);
    assert_eq!(initial.len(), 2);
    assert!(initial.values().all(Vec::is_empty));

    // Rename Base: derived.kiln is not rechecked until the flush.
    sources
        .write()
        .unwrap()
        .insert(handle("base.kiln"), module("base.kiln", &[], &[("Root", &[])]));
    let (state, response) = send(
        &server,
        state,
        json!({"type": "typeCheck", "updateFiles": ["base.kiln"], "checkFiles": ["base.kiln"]}),
    );
    assert_eq!(errors(response).len(), 1);

    let (state, response) = send(
        &server,
        state,
        json!({"type": "displayCachedErrors", "files": ["derived.kiln"]}),
    );
    assert!(errors(response)[&handle("derived.kiln")].is_empty());

    let (state, response) = send(&server, state, json!({"type": "flushErrors"}));
    let flushed = errors(response);
    assert_eq!(flushed[&handle("derived.kiln")].len(), 1);
    assert_eq!(
        flushed[&handle("derived.kiln")][0].message_text,
        "unknown base `Base`"
    );

    let (_, response) = send(
        &server,
        state,
        json!({"type": "typeQuery", "query": {"kind": "superclasses", "name": "Derived"}}),
    );
    assert_eq!(
        response,
        Some(Response::TypeQuery {
            text: String::new()
        })
    );
}

#[test]
fn test_query_scenario_over_checked_sources() {
    let (server, sources) = setup();
    sources.write().unwrap().insert(
        handle("shapes.kiln"),
        module(
            "shapes.kiln",
            &[],
            &[("Shape", &[]), ("Circle", &["Shape"]), ("Square", &["Shape"])],
        ),
    );
    let (state, _) = send(
        &server,
        ServerState::new(),
        json!({"type": "typeCheck", "updateFiles": ["shapes.kiln"], "checkFiles": ["shapes.kiln"]}),
    );

    let query = |kind: &str, left: &str, right: &str| {
        json!({"type": "typeQuery", "query": {"kind": kind, "left": left, "right": right}})
    };
    let (state, response) = send(&server, state, query("lessOrEqual", "Circle", "Shape"));
    assert_eq!(response, Some(Response::TypeQuery { text: "true".into() }));
    let (state, response) = send(&server, state, query("join", "Circle", "Square"));
    assert_eq!(response, Some(Response::TypeQuery { text: "Shape".into() }));
    let (state, response) = send(&server, state, query("meet", "Circle", "Square"));
    assert_eq!(
        response,
        Some(Response::TypeQuery {
            text: "undefined".into()
        })
    );
    let (_, response) = send(&server, state, query("join", "Circle", "Hexagon"));
    assert!(matches!(response, Some(Response::QueryError { .. })));
}

#[test]
fn test_stop_ends_the_session() {
    let (server, _) = setup();
    let (state, response) = send(&server, ServerState::new(), json!({"type": "stop"}));
    assert_eq!(response, Some(Response::Ok));
    assert!(!state.is_accepting_requests());
}
