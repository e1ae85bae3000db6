//! core/mod.rs
//!
//! The scan service:
//! - Accept batches of host file handles (dispatch)
//! - Fan each batch out over a small fixed pool of worker threads (pool)
//! - Read tags per handle and stream one line per record back (tags)
//!
//! Data flow:
//!   transport -> Dispatcher -> TaskQueue -> workers -> Inspector
//!     -> per-worker buffer -> ResponseChannel -> transport
//!
//! Nothing in here installs a logger or parses CLI flags; that's the
//! binary's job.

pub mod dispatch;
pub mod handles;
pub mod library;
pub mod pool;
pub mod tags;
pub mod transport;
pub mod types;
