//! Sleep abstraction for pacing frames.
//!
//! This module provides a `Sleeper` trait so the simulated runtime can keep
//! its update rate in production and return immediately in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for sleeping between frames.
pub trait Sleeper: Send + Sync {
    /// Sleep for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Real sleeper that uses `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSleeper;

impl RealSleeper {
    /// Create a new real sleeper.
    pub fn new() -> Self {
        Self
    }
}

impl Sleeper for RealSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mock sleeper for testing - returns immediately and remembers how long it
/// was asked to sleep in total.
#[derive(Debug, Default, Clone)]
pub struct MockSleeper {
    slept_micros: Arc<AtomicU64>,
}

impl MockSleeper {
    /// Create a new mock sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested sleep time.
    pub fn total_slept(&self) -> Duration {
        Duration::from_micros(self.slept_micros.load(Ordering::SeqCst))
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept_micros
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }
}
