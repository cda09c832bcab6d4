//! Backend reachability monitoring.
//!
//! An owned background task that periodically probes the backend and
//! publishes the result. Nothing is process-global: the caller starts a
//! monitor, reads or subscribes to its status through the returned
//! [`MonitorHandle`], and stops it explicitly (or drops the handle).
//!
//! Time comes from an injectable [`Clock`]; tick scheduling uses
//! `tokio::time`, so tests can run with a paused runtime clock.

mod clock;
mod monitor;
mod probe;

pub use clock::{Clock, FixedClock, SystemClock};
pub use monitor::{MonitorHandle, Reachability, ReachabilityMonitor, ReachabilityState};
pub use probe::{HttpProbe, Probe};
