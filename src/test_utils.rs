//! Test utilities.
//!
//! Shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Instrumented hooks for asserting exclusion and pairing properties
//!
//! # Example
//! ```
//! use concurrent_cube::test_utils::init_test_logging;
//!
//! init_test_logging();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use crate::hooks::Hooks;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Hooks that count every invocation.
///
/// The pairing invariant under cancellation is: at any instant, each
/// `before_*` count is at least its `after_*` count, and once all threads
/// have returned the counts are equal.
#[derive(Debug, Default)]
pub struct CountingHooks {
    before_rotations: AtomicUsize,
    after_rotations: AtomicUsize,
    before_snapshots: AtomicUsize,
    after_snapshots: AtomicUsize,
}

impl CountingHooks {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `before_rotation` invocations so far.
    #[must_use]
    pub fn before_rotations(&self) -> usize {
        self.before_rotations.load(Ordering::SeqCst)
    }

    /// Number of `after_rotation` invocations so far.
    #[must_use]
    pub fn after_rotations(&self) -> usize {
        self.after_rotations.load(Ordering::SeqCst)
    }

    /// Number of `before_snapshot` invocations so far.
    #[must_use]
    pub fn before_snapshots(&self) -> usize {
        self.before_snapshots.load(Ordering::SeqCst)
    }

    /// Number of `after_snapshot` invocations so far.
    #[must_use]
    pub fn after_snapshots(&self) -> usize {
        self.after_snapshots.load(Ordering::SeqCst)
    }
}

impl Hooks for CountingHooks {
    fn before_rotation(&self, _face: usize, _layer: usize) {
        self.before_rotations.fetch_add(1, Ordering::SeqCst);
    }

    fn after_rotation(&self, _face: usize, _layer: usize) {
        self.after_rotations.fetch_add(1, Ordering::SeqCst);
    }

    fn before_snapshot(&self) {
        self.before_snapshots.fetch_add(1, Ordering::SeqCst);
    }

    fn after_snapshot(&self) {
        self.after_snapshots.fetch_add(1, Ordering::SeqCst);
    }
}
