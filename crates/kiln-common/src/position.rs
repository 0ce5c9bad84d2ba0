//! Position and location utilities.
//!
//! Lookup tables and diagnostics are addressed by line/column positions.

use serde::{Deserialize, Serialize};

use crate::file_handle::FileHandle;

/// A position in a source file (0-indexed line and column).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// Whether `position` falls inside this range. Empty ranges contain
    /// their start position.
    pub fn contains(&self, position: Position) -> bool {
        if self.start == self.end {
            return position == self.start;
        }
        self.start <= position && position < self.end
    }

    /// Whether this range lies entirely within `other`.
    pub fn is_within(&self, other: &Range) -> bool {
        other.start <= self.start && self.end <= other.end
    }
}

/// A location in a source file (file handle + range).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "path")]
    pub file: FileHandle,
    pub range: Range,
}

impl Location {
    pub fn new(file: FileHandle, range: Range) -> Self {
        Location { file, range }
    }
}
