//! Output sinks for the radar data logger.
//!
//! This crate provides:
//! - `Destination` describing where frame lines go (stdout or a file)
//! - `SinkOpener`/`FrameSink` traits for opening and writing sinks
//! - `StandardSinkOpener` backed by stdout or a created/truncated file
//! - `MockSinkOpener` capturing output for tests

pub mod sink;

pub use sink::{
    Destination, FrameSink, MockSink, MockSinkOpener, OutputSink, SinkError, SinkOpener,
    StandardSinkOpener,
};
