//! Request-processing core of the kiln incremental analysis server.
//!
//! This crate provides:
//! - `Server`, the request dispatcher, and the recheck pipeline behind it
//! - `ServerState`: error cache, lookup store, deferred queue, known handles
//! - Collaborator interfaces (`SourceParser`, `Analyzer`, `MemoryProbe`, ...)
//! - Request/response shapes and the bridged JSON-RPC codec
//! - Tracing configuration shared by the binaries

pub mod bridge;
pub mod config;
pub mod deferred;
pub mod error;
pub mod error_cache;
pub mod logs;
pub mod lookup;
pub mod memory;
pub mod performance;
pub mod protocol;
mod recheck;
pub mod scheduling;
pub mod server;
pub mod services;
pub mod state;
pub mod tracing_config;

pub use config::ServerConfiguration;
pub use deferred::{DeferredQueue, RecheckRequest};
pub use error::InvalidRequestError;
pub use error_cache::{ErrorCache, FileErrorMap, build_file_error_map};
pub use logs::LogDirectoryCollector;
pub use lookup::{LookupEntry, LookupStore, LookupTable};
pub use memory::StatmProbe;
pub use performance::{RequestKind, RequestTiming, ServerPerformance};
pub use protocol::{Request, Response, TypeQuery};
pub use scheduling::SchedulingMode;
pub use server::{HoverInfo, Server};
pub use services::{
    Analyzer, FileAnalysis, LogCollector, LogItem, MemoryProbe, NoSuppressions, Services,
    SourceParser, SuppressionRegistrar,
};
pub use state::{ServerState, ServerStatus};

#[cfg(test)]
#[path = "../tests/test_support.rs"]
pub(crate) mod test_support;
