//! Pipeline entry points for poller operations.
//!
//! - `run_poller`: Fetch every outlet, then write the report, snapshot and cache
//! - `run_check`: Probe whether the vendor session is alive
//! - `run_validate`: Check the configuration and station directory

pub mod poll;

pub use poll::{run_check, run_poller, run_validate};
