use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use kiln_server::ServerConfiguration;

/// CLI arguments for the kiln-server binary.
#[derive(Parser, Debug)]
#[command(
    name = "kiln-server",
    version,
    about = "Incremental type-analysis server for .kiln stub files"
)]
pub struct ServerArgs {
    /// Project root; file handles are relative to it.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Additional root searched after the project root. Repeatable.
    #[arg(long = "search-path", alias = "searchPath")]
    pub search_paths: Vec<PathBuf>,

    /// Directory whose files are returned by the rage request.
    #[arg(long = "log-dir", alias = "logDir")]
    pub log_dir: Option<PathBuf>,

    /// Memory budget in MiB used to compute the heap use ratio.
    #[arg(long = "memory-budget-mb", alias = "memoryBudgetMb")]
    pub memory_budget_mb: Option<u64>,

    /// Stdio framing.
    #[arg(long, value_enum, default_value_t = Protocol::Lines)]
    pub protocol: Protocol,

    /// Skip the initial check of every source under the roots.
    #[arg(long = "no-initial-check", alias = "noInitialCheck")]
    pub no_initial_check: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Protocol {
    /// One JSON request per line, one JSON response per line.
    Lines,
    /// Content-Length framed JSON messages.
    Framed,
}

impl ServerArgs {
    pub fn configuration(&self) -> ServerConfiguration {
        let mut config = ServerConfiguration::new(&self.root);
        config.search_paths = self.search_paths.clone();
        config.log_directory = self.log_dir.clone();
        if let Some(megabytes) = self.memory_budget_mb {
            config.memory_budget_bytes = megabytes * 1024 * 1024;
        }
        config
    }
}
