//! Broadcasting for real-time event streaming.
//!
//! Any number of subscribers (a CLI, a UI bridge) can follow a run.

pub mod run_progress;

pub use run_progress::RunProgressBroadcaster;
