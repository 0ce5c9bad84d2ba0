//! Log-bundle collection for rage requests.

use std::fs;

use anyhow::Context;
use walkdir::WalkDir;

use crate::config::ServerConfiguration;
use crate::services::{LogCollector, LogItem};

/// Returns every regular file under the configured log directory, sorted by
/// path, as one item each. No log directory means an empty bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDirectoryCollector;

impl LogCollector for LogDirectoryCollector {
    fn collect_logs(&self, config: &ServerConfiguration) -> anyhow::Result<Vec<LogItem>> {
        let Some(directory) = &config.log_directory else {
            return Ok(Vec::new());
        };
        if !directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry.with_context(|| format!("reading {}", directory.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let contents = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let title = path
                .strip_prefix(directory)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            items.push(LogItem {
                title,
                contents: String::from_utf8_lossy(&contents).into_owned(),
            });
        }
        Ok(items)
    }
}
