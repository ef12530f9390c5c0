//! Sink abstraction for frame output.
//!
//! A sink receives one text line per frame. Standard output is flushed by the
//! caller after every line and never closed; files are buffered and flushed
//! when closed.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// Where frame lines are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Destination {
    /// The process's standard output.
    #[default]
    Stdout,
    /// A file, created or truncated when opened.
    File(PathBuf),
}

impl Destination {
    /// Stdout when `path` is `None`, otherwise that file.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Destination::Stdout, Destination::File)
    }

    /// Path of a file destination.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Stdout => None,
            Destination::File(path) => Some(path),
        }
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Destination::Stdout)
    }
}

/// Trait for a writable frame sink.
pub trait FrameSink {
    /// Write one rendered line. The line carries its own terminator.
    fn write_line(&mut self, line: &str) -> Result<(), SinkError>;

    /// Push buffered output to the destination.
    fn flush(&mut self) -> Result<(), SinkError>;

    /// True when writing to standard output.
    fn is_stdout(&self) -> bool;

    /// Flush and release the sink. Standard output stays open.
    fn close(self) -> Result<(), SinkError>
    where
        Self: Sized;
}

/// Trait for opening sinks.
/// Abstracted for testing with mock implementations.
pub trait SinkOpener {
    type Sink: FrameSink;

    /// Open the sink for `destination`.
    fn open(&self, destination: &Destination) -> Result<Self::Sink, SinkError>;
}

/// Sink writing to stdout or a file.
#[derive(Debug)]
pub enum OutputSink {
    Stdout(Stdout),
    File(BufWriter<File>),
}

impl FrameSink for OutputSink {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let result = match self {
            OutputSink::Stdout(out) => out.write_all(line.as_bytes()),
            OutputSink::File(file) => file.write_all(line.as_bytes()),
        };
        result.map_err(SinkError::Write)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        let result = match self {
            OutputSink::Stdout(out) => out.flush(),
            OutputSink::File(file) => file.flush(),
        };
        result.map_err(SinkError::Write)
    }

    fn is_stdout(&self) -> bool {
        matches!(self, OutputSink::Stdout(_))
    }

    fn close(self) -> Result<(), SinkError> {
        match self {
            OutputSink::Stdout(mut out) => out.flush().map_err(SinkError::Write),
            OutputSink::File(file) => {
                let file = file
                    .into_inner()
                    .map_err(|e| SinkError::Write(e.into_error()))?;
                file.sync_data().map_err(SinkError::Write)
            }
        }
    }
}

/// Real sink opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardSinkOpener;

impl SinkOpener for StandardSinkOpener {
    type Sink = OutputSink;

    fn open(&self, destination: &Destination) -> Result<OutputSink, SinkError> {
        match destination {
            Destination::Stdout => Ok(OutputSink::Stdout(io::stdout())),
            Destination::File(path) => {
                let file = File::create(path).map_err(|source| SinkError::Open {
                    path: path.clone(),
                    source,
                })?;
                Ok(OutputSink::File(BufWriter::new(file)))
            }
        }
    }
}

#[derive(Debug, Default)]
struct MockSinkState {
    contents: String,
    opened: usize,
    flushes: usize,
    closed: bool,
    fail_open: bool,
    fail_write_at: Option<usize>,
    writes: usize,
}

/// Mock sink opener for testing.
/// Cloning creates a new handle to the same captured output.
#[derive(Debug, Clone, Default)]
pub struct MockSinkOpener {
    state: Arc<RwLock<MockSinkState>>,
}

impl MockSinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `open` fail as if the filesystem refused.
    pub fn failing_open(self) -> Self {
        self.state.write().unwrap().fail_open = true;
        self
    }

    /// Fail the write with this 0-based index.
    pub fn failing_write_at(self, write: usize) -> Self {
        self.state.write().unwrap().fail_write_at = Some(write);
        self
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.state.read().unwrap().contents.clone()
    }

    /// Written lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    /// Number of times a sink was opened.
    pub fn opened(&self) -> usize {
        self.state.read().unwrap().opened
    }

    /// Number of explicit flushes.
    pub fn flushes(&self) -> usize {
        self.state.read().unwrap().flushes
    }

    /// Whether the last opened sink was closed.
    pub fn closed(&self) -> bool {
        self.state.read().unwrap().closed
    }
}

impl SinkOpener for MockSinkOpener {
    type Sink = MockSink;

    fn open(&self, destination: &Destination) -> Result<MockSink, SinkError> {
        let mut state = self.state.write().unwrap();
        if state.fail_open {
            return Err(SinkError::Open {
                path: destination
                    .path()
                    .map_or_else(|| PathBuf::from("<stdout>"), Path::to_path_buf),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "simulated failure"),
            });
        }
        state.opened += 1;
        state.closed = false;
        Ok(MockSink {
            state: self.state.clone(),
            stdout: destination.is_stdout(),
        })
    }
}

/// Sink handed out by `MockSinkOpener`.
#[derive(Debug)]
pub struct MockSink {
    state: Arc<RwLock<MockSinkState>>,
    stdout: bool,
}

impl FrameSink for MockSink {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let mut state = self.state.write().unwrap();
        let write = state.writes;
        state.writes += 1;
        if state.fail_write_at == Some(write) {
            return Err(SinkError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated failure",
            )));
        }
        state.contents.push_str(line);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.state.write().unwrap().flushes += 1;
        Ok(())
    }

    fn is_stdout(&self) -> bool {
        self.stdout
    }

    fn close(self) -> Result<(), SinkError> {
        self.state.write().unwrap().closed = true;
        Ok(())
    }
}
