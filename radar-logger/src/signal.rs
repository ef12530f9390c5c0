//! Termination signal for runs that poll until interrupted.
//!
//! `TerminationSignal` wraps a shared atomic flag. The Ctrl+C handler only
//! stores `true` into it; the acquisition loop reads it once per iteration.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Trait for checking whether the run should stop.
pub trait TerminationCheck: Send + Sync {
    /// Returns true once termination has been requested.
    fn should_terminate(&self) -> bool;
}

/// Flag raised by an interrupt. Never cleared.
#[derive(Debug, Clone)]
pub struct TerminationSignal {
    flag: Arc<AtomicBool>,
}

impl TerminationSignal {
    /// Create a signal and register the SIGINT handler that raises it.
    ///
    /// If the handler cannot be registered (e.g., already registered), the
    /// returned signal can still be raised with `trigger`.
    pub fn install() -> Self {
        let signal = Self::manual();
        let flag = signal.flag.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            log::warn!("could not install interrupt handler: {}", e);
        }
        signal
    }

    /// Create a signal without registering a handler.
    pub fn manual() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raise the signal. Idempotent.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl TerminationCheck for TerminationSignal {
    fn should_terminate(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Test double that never requests termination.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverTerminate;

impl TerminationCheck for NeverTerminate {
    fn should_terminate(&self) -> bool {
        false
    }
}

/// Test double that always requests termination.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysTerminate;

impl TerminationCheck for AlwaysTerminate {
    fn should_terminate(&self) -> bool {
        true
    }
}

/// Test double that answers `false` to the first `n` checks and `true` after.
#[derive(Debug, Default)]
pub struct TerminateAfter {
    remaining: AtomicUsize,
    checks: AtomicUsize,
}

impl TerminateAfter {
    pub fn new(checks: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(checks),
            checks: AtomicUsize::new(0),
        }
    }

    /// Number of times the signal was consulted.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl TerminationCheck for TerminateAfter {
    fn should_terminate(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }
}
