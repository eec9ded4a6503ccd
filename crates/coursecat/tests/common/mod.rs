//! Shared test utilities for coursecat integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a pipeline to an in-memory store and a scripted service
//! - Builders for course records

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{RecordingStore, ScriptedService, SnapshotRecorder, TestHarness};
