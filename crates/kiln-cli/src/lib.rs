//! Library half of the `kiln-server` binary.
//!
//! - `args`: command-line arguments and the configuration built from them
//! - `frontend`: the `.kiln` stub-file parser and analyzer plugged into the
//!   server's collaborator interfaces
//! - `transport`: stdio framing and the request loop

pub mod args;
pub mod frontend;
pub mod transport;

#[cfg(test)]
#[path = "../tests/test_support.rs"]
pub(crate) mod test_support;
