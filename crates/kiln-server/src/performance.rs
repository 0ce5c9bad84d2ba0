//! Per-request performance records.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::protocol::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    TypeCheck,
    TypeQuery,
    DisplayCachedErrors,
    FlushErrors,
    Stop,
    ClientShutdown,
    ClientExit,
    Reinitialize,
    GetDefinition,
    Hover,
    Rage,
    Bridged,
    ClientConnection,
}

impl RequestKind {
    pub fn of(request: &Request) -> Self {
        match request {
            Request::TypeCheck { .. } => RequestKind::TypeCheck,
            Request::TypeQuery { .. } => RequestKind::TypeQuery,
            Request::DisplayCachedErrors { .. } => RequestKind::DisplayCachedErrors,
            Request::FlushErrors => RequestKind::FlushErrors,
            Request::Stop => RequestKind::Stop,
            Request::ClientShutdown => RequestKind::ClientShutdown,
            Request::ClientExit => RequestKind::ClientExit,
            Request::Reinitialize => RequestKind::Reinitialize,
            Request::GetDefinition { .. } => RequestKind::GetDefinition,
            Request::Hover { .. } => RequestKind::Hover,
            Request::Rage => RequestKind::Rage,
            Request::Bridged { .. } => RequestKind::Bridged,
            Request::ClientConnection { .. } => RequestKind::ClientConnection,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::TypeCheck => "type_check",
            RequestKind::TypeQuery => "type_query",
            RequestKind::DisplayCachedErrors => "display_cached_errors",
            RequestKind::FlushErrors => "flush_errors",
            RequestKind::Stop => "stop",
            RequestKind::ClientShutdown => "client_shutdown",
            RequestKind::ClientExit => "client_exit",
            RequestKind::Reinitialize => "reinitialize",
            RequestKind::GetDefinition => "get_definition",
            RequestKind::Hover => "hover",
            RequestKind::Rage => "rage",
            RequestKind::Bridged => "bridged",
            RequestKind::ClientConnection => "client_connection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTiming {
    /// Duration of the most recent request of this kind.
    pub last: Duration,
    pub total: Duration,
    pub count: u64,
}

#[derive(Debug, Default, Clone)]
pub struct ServerPerformance {
    timings: FxHashMap<RequestKind, RequestTiming>,
}

impl ServerPerformance {
    pub(crate) fn record(&mut self, kind: RequestKind, duration: Duration) {
        let timing = self.timings.entry(kind).or_insert(RequestTiming {
            last: Duration::ZERO,
            total: Duration::ZERO,
            count: 0,
        });
        timing.last = duration;
        timing.total += duration;
        timing.count += 1;
    }

    pub fn timing(&self, kind: RequestKind) -> Option<RequestTiming> {
        self.timings.get(&kind).copied()
    }

    pub fn request_count(&self) -> u64 {
        self.timings.values().map(|timing| timing.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_per_kind() {
        let mut performance = ServerPerformance::default();
        performance.record(RequestKind::Hover, Duration::from_millis(3));
        performance.record(RequestKind::Hover, Duration::from_millis(5));
        performance.record(RequestKind::Rage, Duration::from_millis(1));

        let hover = performance.timing(RequestKind::Hover).unwrap();
        assert_eq!(hover.last, Duration::from_millis(5));
        assert_eq!(hover.total, Duration::from_millis(8));
        assert_eq!(hover.count, 2);
        assert!(performance.timing(RequestKind::TypeCheck).is_none());
        assert_eq!(performance.request_count(), 3);
    }
}
