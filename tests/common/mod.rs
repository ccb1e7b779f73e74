//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use concurrent_cube::Hooks;
use parking_lot::Mutex;
use proptest::test_runner::Config as ProptestConfig;

/// Small deterministic RNG (xorshift64*), so stress tests are reproducible
/// from their seed without a rand dependency.
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Waits for `count` completion signals, failing loudly instead of hanging
/// when a thread deadlocks.
pub fn await_completions(rx: &Receiver<()>, count: usize, timeout: Duration, what: &str) {
    for done in 0..count {
        rx.recv_timeout(timeout).unwrap_or_else(|_| {
            panic!("{what}: only {done} of {count} threads finished within {timeout:?}")
        });
    }
}

/// Proptest configuration with a bounded case count, so the property
/// suites stay fast in CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    ProptestConfig::with_cases(cases)
}

/// The rotation group a face belongs to: opposite faces share a group.
pub fn rotation_group(face: usize) -> usize {
    match face {
        0 | 5 => 0,
        1 | 3 => 1,
        _ => 2,
    }
}

/// The face-independent index of the physical layer a request names.
pub fn canonical_layer(face: usize, layer: usize, size: usize) -> usize {
    if face < 3 {
        layer
    } else {
        size - layer - 1
    }
}

/// Occupancy ledger checked from inside the hooks, the only vantage point
/// with exact admission windows. Flags a violation whenever two mutually
/// exclusive operations are in their bodies at once.
pub struct LedgerHooks {
    size: usize,
    inner: Mutex<Ledger>,
    violations: AtomicUsize,
}

struct Ledger {
    rotations: [Vec<usize>; 3],
    snapshots: usize,
}

impl LedgerHooks {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            inner: Mutex::new(Ledger {
                rotations: [vec![0; size], vec![0; size], vec![0; size]],
                snapshots: 0,
            }),
            violations: AtomicUsize::new(0),
        }
    }

    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    /// True when every occupancy counter is back to zero.
    pub fn quiescent(&self) -> bool {
        let ledger = self.inner.lock();
        ledger.snapshots == 0 && ledger.rotations.iter().flatten().all(|&c| c == 0)
    }

    fn flag_violation(&self) {
        self.violations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Hooks for LedgerHooks {
    fn before_rotation(&self, face: usize, layer: usize) {
        let group = rotation_group(face);
        let layer = canonical_layer(face, layer, self.size);
        let mut ledger = self.inner.lock();
        if ledger.snapshots > 0 {
            self.flag_violation();
        }
        for (other, counts) in ledger.rotations.iter().enumerate() {
            if other != group && counts.iter().any(|&c| c > 0) {
                self.flag_violation();
            }
        }
        if ledger.rotations[group][layer] > 0 {
            self.flag_violation();
        }
        ledger.rotations[group][layer] += 1;
        drop(ledger);
        thread::yield_now();
    }

    fn after_rotation(&self, face: usize, layer: usize) {
        let group = rotation_group(face);
        let layer = canonical_layer(face, layer, self.size);
        self.inner.lock().rotations[group][layer] -= 1;
    }

    fn before_snapshot(&self) {
        let mut ledger = self.inner.lock();
        if ledger.rotations.iter().flatten().any(|&c| c > 0) {
            self.flag_violation();
        }
        ledger.snapshots += 1;
        drop(ledger);
        thread::yield_now();
    }

    fn after_snapshot(&self) {
        self.inner.lock().snapshots -= 1;
    }
}
