//! Stub frontend for `.kiln` files.
//!
//! A stub file declares imports and classes, one per line, with attributes
//! indented under their class:
//!
//! ```text
//! # comments run to the end of the line
//! import lib/base.kiln
//! class Derived(Base, Mixin):
//!     name: str
//!     children: List[Derived]
//! ```
//!
//! `StubParser` turns a file into a `ModuleDefinition` and keeps the parsed
//! outline (source ranges of imports and bases, plus syntax problems) for
//! `StubAnalyzer`, which reports unresolved names against the environment and
//! fills the file's lookup table. Columns are byte offsets into the line.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::debug;
use walkdir::WalkDir;

use kiln_common::diagnostics::diagnostic_codes;
use kiln_common::{Diagnostic, FileHandle, Location, Position, Range};
use kiln_server::{
    Analyzer, FileAnalysis, LogDirectoryCollector, LookupTable, NoSuppressions, SchedulingMode,
    ServerConfiguration, Services, SourceParser, StatmProbe,
};
use kiln_solver::{
    Attribute, ClassDefinition, ClassName, ModuleDefinition, Type, TypeEnvironment,
    TypeParseError, parse_type_expression,
};

pub const SOURCE_EXTENSION: &str = "kiln";

/// A base-class reference in a class header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseReference {
    pub range: Range,
    pub class: ClassName,
    pub base: ClassName,
}

/// Everything one parse of a stub file produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StubOutline {
    pub module: ModuleDefinition,
    pub imports: Vec<(Range, FileHandle)>,
    pub bases: Vec<BaseReference>,
    /// Syntax problems, reported by the analyzer.
    pub problems: Vec<Diagnostic>,
}

fn span(line: usize, start: usize, end: usize) -> Range {
    Range::new(
        Position::new(line as u32, start as u32),
        Position::new(line as u32, end as u32),
    )
}

/// Offset of the first non-blank byte of `piece` within its line, given the
/// offset `piece` starts at.
fn trimmed_start(offset: usize, piece: &str) -> usize {
    offset + (piece.len() - piece.trim_start().len())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct StubReader<'a> {
    handle: &'a FileHandle,
    outline: StubOutline,
}

impl StubReader<'_> {
    fn problem(&mut self, range: Range, message: impl AsRef<str>) {
        self.outline.problems.push(Diagnostic::from_code(
            Location::new(self.handle.clone(), range),
            diagnostic_codes::PARSE_ERROR,
            &[message.as_ref()],
        ));
    }

    fn read_import(&mut self, line: usize, offset: usize, rest: &str) {
        let path = rest.trim();
        let start = trimmed_start(offset, rest);
        let range = span(line, start, start + path.len());
        match FileHandle::new(path) {
            Some(import) => {
                self.outline.module.imports.push(import.clone());
                self.outline.imports.push((range, import));
            }
            None => self.problem(range, format!("invalid import path `{path}`")),
        }
    }

    fn read_class(&mut self, line: usize, offset: usize, rest: &str) {
        let header = rest.trim_end();
        let header = header.strip_suffix(':').unwrap_or(header);
        let (name_part, bases_part) = match header.split_once('(') {
            Some((name, bases)) => match bases.trim_end().strip_suffix(')') {
                Some(bases) => (name, Some(bases)),
                None => {
                    let end = offset + header.len();
                    self.problem(span(line, offset, end), "expected `)` to close the base list");
                    return;
                }
            },
            None => (header, None),
        };

        let name = name_part.trim();
        let name_start = trimmed_start(offset, name_part);
        let name_range = span(line, name_start, name_start + name.len());
        if !is_identifier(name) {
            self.problem(name_range, format!("invalid class name `{name}`"));
            return;
        }
        let class_name = ClassName::from(name);

        let mut bases = Vec::new();
        if let Some(list) = bases_part {
            let mut piece_offset = offset + name_part.len() + 1;
            for piece in list.split(',') {
                let base = piece.trim();
                let start = trimmed_start(piece_offset, piece);
                let range = span(line, start, start + base.len());
                piece_offset += piece.len() + 1;
                if base.is_empty() {
                    continue;
                }
                if !is_identifier(base) {
                    self.problem(range, format!("invalid base class `{base}`"));
                    continue;
                }
                let base = ClassName::from(base);
                bases.push(base.clone());
                self.outline.bases.push(BaseReference {
                    range,
                    class: class_name.clone(),
                    base,
                });
            }
        }

        self.outline.module.classes.push(ClassDefinition {
            name: class_name,
            bases,
            attributes: Vec::new(),
            location: Location::new(self.handle.clone(), name_range),
        });
    }

    fn read_attribute(&mut self, line: usize, offset: usize, body: &str) {
        let Some((name_part, annotation)) = body.split_once(':') else {
            let range = span(line, offset, offset + body.len());
            self.problem(range, "expected `name: Type`");
            return;
        };
        let name = name_part.trim();
        let name_range = span(line, offset, offset + name.len());
        if !is_identifier(name) {
            self.problem(name_range, format!("invalid attribute name `{name}`"));
            return;
        }
        let annotation_start = trimmed_start(offset + name_part.len() + 1, annotation);
        let annotation_range = span(
            line,
            annotation_start,
            annotation_start + annotation.trim().len(),
        );
        let annotation = match parse_type_expression(annotation) {
            Ok(annotation) => annotation,
            Err(error) => {
                self.problem(annotation_range, error.to_string());
                return;
            }
        };
        let Some(class) = self.outline.module.classes.last_mut() else {
            self.problem(name_range, "attribute outside of a class");
            return;
        };
        class.attributes.push(Attribute {
            name: name.to_string(),
            annotation,
            location: Some(Location::new(self.handle.clone(), name_range)),
        });
    }
}

/// Parse the text of one stub file. Never fails; problems are collected in
/// the outline.
pub fn parse_stub(handle: &FileHandle, text: &str) -> StubOutline {
    let mut reader = StubReader {
        handle,
        outline: StubOutline::default(),
    };
    for (line, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or_default().trim_end();
        if content.trim().is_empty() {
            continue;
        }
        let indent = content.len() - content.trim_start().len();
        if indent > 0 {
            reader.read_attribute(line, indent, &content[indent..]);
        } else if let Some(rest) = content.strip_prefix("import ") {
            reader.read_import(line, "import ".len(), rest);
        } else if let Some(rest) = content.strip_prefix("class ") {
            reader.read_class(line, "class ".len(), rest);
        } else {
            let word = content.split_whitespace().next().unwrap_or_default();
            reader.problem(span(line, 0, word.len()), format!("unexpected `{word}`"));
        }
    }
    reader.outline
}

/// Outlines from the most recent parse of each file.
#[derive(Debug, Default)]
pub struct OutlineStore {
    outlines: DashMap<FileHandle, Arc<StubOutline>, FxBuildHasher>,
}

impl OutlineStore {
    pub fn get(&self, handle: &FileHandle) -> Option<Arc<StubOutline>> {
        self.outlines.get(handle).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }
}

pub struct StubParser {
    outlines: Arc<OutlineStore>,
}

impl StubParser {
    pub fn new(outlines: Arc<OutlineStore>) -> Self {
        Self { outlines }
    }
}

impl SourceParser for StubParser {
    fn parse(
        &self,
        config: &ServerConfiguration,
        handle: &FileHandle,
    ) -> anyhow::Result<Option<ModuleDefinition>> {
        let path = config.resolve(handle);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(%handle, "source removed");
                self.outlines.outlines.remove(handle);
                return Ok(None);
            }
            Err(error) => {
                return Err(error).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let outline = parse_stub(handle, &text);
        let module = outline.module.clone();
        self.outlines
            .outlines
            .insert(handle.clone(), Arc::new(outline));
        Ok(Some(module))
    }
}

pub struct StubAnalyzer {
    outlines: Arc<OutlineStore>,
}

impl StubAnalyzer {
    pub fn new(outlines: Arc<OutlineStore>) -> Self {
        Self { outlines }
    }
}

impl Analyzer for StubAnalyzer {
    fn analyze_file(
        &self,
        handle: &FileHandle,
        environment: &TypeEnvironment,
    ) -> anyhow::Result<FileAnalysis> {
        Ok(match self.outlines.get(handle) {
            Some(outline) => analyze_outline(handle, &outline, environment),
            None => FileAnalysis::default(),
        })
    }

    fn on_schedule(&self, mode: SchedulingMode, batch_len: usize) {
        debug!(mode = mode.as_str(), files = batch_len, "analysis batch scheduled");
    }
}

/// Diagnostics and lookup entries for one parsed file.
pub fn analyze_outline(
    handle: &FileHandle,
    outline: &StubOutline,
    environment: &TypeEnvironment,
) -> FileAnalysis {
    let mut diagnostics = outline.problems.clone();
    let mut lookup = LookupTable::new();
    let at = |range: Range| Location::new(handle.clone(), range);

    for (range, import) in &outline.imports {
        if !environment.contains_module(import) {
            diagnostics.push(Diagnostic::from_code(
                at(*range),
                diagnostic_codes::UNDEFINED_IMPORT,
                &[import.as_str()],
            ));
        }
    }

    for class in &outline.module.classes {
        let range = class.location.range;
        lookup.define(range, class.location.clone());
        lookup.annotate(range, Type::class(&class.name));

        match environment.class_owner(&class.name) {
            Some(owner) if owner != handle => diagnostics.push(Diagnostic::from_code(
                class.location.clone(),
                diagnostic_codes::DUPLICATE_CLASS,
                &[&*class.name, owner.as_str()],
            )),
            _ => {
                let inconsistent = environment
                    .linearization(&class.name)
                    .is_some_and(|order| !order.is_consistent() || order.is_cyclic());
                if inconsistent {
                    diagnostics.push(Diagnostic::from_code(
                        class.location.clone(),
                        diagnostic_codes::INCONSISTENT_ANCESTRY,
                        &[&*class.name],
                    ));
                }
            }
        }

        for attribute in &class.attributes {
            let location = attribute
                .location
                .clone()
                .unwrap_or_else(|| class.location.clone());
            lookup.annotate(location.range, attribute.annotation.clone());
            match environment.validate_type(&attribute.annotation) {
                Ok(()) => {}
                Err(TypeParseError::UnknownClass(name)) => {
                    diagnostics.push(Diagnostic::from_code(
                        location,
                        diagnostic_codes::UNDEFINED_ANNOTATION,
                        &[name.as_str()],
                    ));
                }
                Err(error) => diagnostics.push(Diagnostic::from_code(
                    location,
                    diagnostic_codes::PARSE_ERROR,
                    &[error.to_string().as_str()],
                )),
            }
        }
    }

    for reference in &outline.bases {
        match environment.class_definition(&reference.base) {
            Some(definition) => {
                lookup.define(reference.range, definition.location.clone());
                lookup.annotate(reference.range, Type::class(&reference.base));
            }
            None => diagnostics.push(Diagnostic::from_code(
                at(reference.range),
                diagnostic_codes::UNDEFINED_BASE_CLASS,
                &[&*reference.base, &*reference.class],
            )),
        }
    }

    FileAnalysis {
        diagnostics,
        lookup,
    }
}

/// Every `.kiln` file under the configured roots, in root order and then
/// file-name order. A handle found under several roots is listed once.
pub fn discover_sources(config: &ServerConfiguration) -> Vec<FileHandle> {
    let mut seen = FxHashSet::default();
    let mut handles = Vec::new();
    for root in config.roots() {
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !has_source_extension(path) {
                continue;
            }
            let Some(handle) = path
                .strip_prefix(root)
                .ok()
                .and_then(|relative| FileHandle::new(&relative.to_string_lossy()))
            else {
                continue;
            };
            if seen.insert(handle.clone()) {
                handles.push(handle);
            }
        }
    }
    handles
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Collaborators backed by the stub frontend and the default probes.
pub fn stub_services(config: &ServerConfiguration) -> Services {
    let outlines = Arc::new(OutlineStore::default());
    Services {
        parser: Box::new(StubParser::new(Arc::clone(&outlines))),
        analyzer: Box::new(StubAnalyzer::new(outlines)),
        suppressions: Box::new(NoSuppressions),
        logs: Box::new(LogDirectoryCollector),
        memory: Box::new(StatmProbe::new(config.memory_budget_bytes)),
    }
}

#[cfg(test)]
#[path = "../tests/frontend_tests.rs"]
mod frontend_tests;
