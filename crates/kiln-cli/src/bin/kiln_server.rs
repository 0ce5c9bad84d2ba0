//! kiln-server: incremental type-analysis server over stdio.
//!
//! On start the server checks every `.kiln` source under its roots, then
//! serves requests until the client stops it or closes stdin.
//!
//! ```bash
//! echo '{"type":"typeQuery","query":{"kind":"superclasses","name":"Derived"}}' \
//!     | kiln-server --root ./stubs
//! ```

use std::io::{BufReader, stdin, stdout};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use kiln_cli::args::ServerArgs;
use kiln_cli::frontend::{discover_sources, stub_services};
use kiln_cli::transport::serve;
use kiln_server::tracing_config::init_tracing;
use kiln_server::{RecheckRequest, Server, ServerState};

fn main() -> Result<()> {
    init_tracing();

    let args = ServerArgs::parse();
    let config = args.configuration();
    let root = config.project_root.clone();
    let server = Server::new(config.clone(), stub_services(&config));

    let mut state = ServerState::new();
    if !args.no_initial_check {
        let sources = discover_sources(&config);
        info!(files = sources.len(), root = %root.display(), "initial check");
        let (checked, _) = server
            .type_check(state, RecheckRequest::new(sources.clone(), sources))
            .context("initial check failed")?;
        let (flushed, _) = server.flush(checked).context("initial flush failed")?;
        state = flushed;
    }

    info!(protocol = ?args.protocol, "kiln-server ready");
    let mut input = BufReader::new(stdin().lock());
    let mut output = stdout().lock();
    let state = serve(&server, state, args.protocol, &mut input, &mut output)?;
    info!(
        requests = state.performance.request_count(),
        status = ?state.status,
        "kiln-server exiting"
    );
    Ok(())
}
