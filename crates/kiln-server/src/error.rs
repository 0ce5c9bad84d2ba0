//! Errors the dispatcher raises itself.
//!
//! Collaborator failures travel as `anyhow::Error`; the types here let callers
//! tell a protocol violation apart from a broken service via `downcast_ref`.

use std::fmt;

/// A request that must be intercepted before it reaches the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRequestError {
    pub request: &'static str,
    pub reason: &'static str,
}

impl InvalidRequestError {
    pub fn new(request: &'static str, reason: &'static str) -> Self {
        Self { request, reason }
    }
}

impl fmt::Display for InvalidRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request `{}`: {}", self.request, self.reason)
    }
}

impl std::error::Error for InvalidRequestError {}
