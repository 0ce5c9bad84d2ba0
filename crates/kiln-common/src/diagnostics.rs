//! Diagnostics reported by analysis.
//!
//! A `Diagnostic` is immutable once produced: the error cache only ever
//! replaces a file's diagnostics wholesale, it never edits one in place.

use serde::{Deserialize, Serialize};

use crate::file_handle::FileHandle;
use crate::position::Location;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const UNDEFINED_IMPORT: u32 = 1001;
    pub const UNDEFINED_BASE_CLASS: u32 = 1002;
    pub const UNDEFINED_ANNOTATION: u32 = 1003;
    pub const INCONSISTENT_ANCESTRY: u32 = 1004;
    pub const DUPLICATE_CLASS: u32 = 1005;
    pub const PARSE_ERROR: u32 = 1006;
}

pub const DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::UNDEFINED_IMPORT,
        category: DiagnosticCategory::Error,
        message: "Could not find module `{0}`.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNDEFINED_BASE_CLASS,
        category: DiagnosticCategory::Error,
        message: "Base class `{0}` of `{1}` is not defined.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNDEFINED_ANNOTATION,
        category: DiagnosticCategory::Error,
        message: "Annotation `{0}` is not defined as a type.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::INCONSISTENT_ANCESTRY,
        category: DiagnosticCategory::Error,
        message: "Cannot create a consistent method resolution order for `{0}`.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_CLASS,
        category: DiagnosticCategory::Warning,
        message: "Class `{0}` is redefined; the definition in `{1}` wins.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::PARSE_ERROR,
        category: DiagnosticCategory::Error,
        message: "Parse error: {0}",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub location: Location,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(location: Location, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            location,
            message_text: message.into(),
        }
    }

    /// Build a diagnostic from the message catalog.
    ///
    /// Unknown codes fall back to an error category with the joined args as text.
    pub fn from_code(location: Location, code: u32, args: &[&str]) -> Self {
        match DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code) {
            Some(template) => Self {
                category: template.category,
                code,
                location,
                message_text: format_message(template.message, args),
            },
            None => Self::error(location, args.join(" "), code),
        }
    }

    /// The file this diagnostic belongs to in the error cache.
    pub fn file(&self) -> &FileHandle {
        &self.location.file
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
