//! Admission protocol and baton-passing release cascade.
//!
//! All scheduling counters live in one [`SchedState`] behind one
//! `parking_lot::Mutex`; one condvar gate exists per (rotation group,
//! canonical layer) pair plus one for the snapshot class. A thread blocks
//! on exactly one gate while queued.
//!
//! # Hand-off
//!
//! The exclusive token is never released to "anyone" mid-cascade. When a
//! thread wakes a waiter, it first completes that waiter's admission under
//! the lock (withdraws its wait counters, marks its layer active), then
//! leaves a ticket on the gate and notifies it. The ticket is the baton:
//! any thread that observes the state between hand-off and wake-up already
//! sees the admitted waiter as active, so no interleaving can violate the
//! exclusion invariants, and the woken thread has nothing left to acquire.
//!
//! # Cascades
//!
//! Immediately after admission, before its body runs, a rotation thread
//! hands one further admission to the lowest waiting free layer above its
//! own (the woken thread continues the scan); a snapshot thread hands
//! admissions to every waiting snapshot thread in one pass. After its body,
//! a thread retires and, if it was the last active one and anyone waits,
//! selects the next batch round-robin starting after its own group.

mod state;

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::cancel::{CancelToken, WakeFn};
use crate::error::CubeError;
use crate::layer::{Group, GROUP_COUNT, SNAPSHOT_GROUP};
use state::SchedState;

/// Identifies the gate a waiter blocks on.
#[derive(Debug, Clone, Copy)]
enum GateId {
    Layer(usize, usize),
    Snapshot,
}

#[derive(Debug)]
struct SchedShared {
    state: Mutex<SchedState>,
    /// One gate per (rotation group, canonical layer).
    layer_gates: Vec<Vec<Condvar>>,
    snapshot_gate: Condvar,
}

impl SchedShared {
    fn gate(&self, id: GateId) -> &Condvar {
        match id {
            GateId::Layer(group, layer) => &self.layer_gates[group][layer],
            GateId::Snapshot => &self.snapshot_gate,
        }
    }
}

/// The admission scheduler for one cube.
#[derive(Debug)]
pub(crate) struct Scheduler {
    shared: Arc<SchedShared>,
}

impl Scheduler {
    pub(crate) fn new(size: usize) -> Self {
        let layer_gates = (0..GROUP_COUNT - 1)
            .map(|_| (0..size).map(|_| Condvar::new()).collect())
            .collect();
        Self {
            shared: Arc::new(SchedShared {
                state: Mutex::new(SchedState::new(size)),
                layer_gates,
                snapshot_gate: Condvar::new(),
            }),
        }
    }

    /// Builds the waker a [`CancelToken`] invokes to rouse a blocked thread.
    ///
    /// The waker takes the scheduler lock before notifying, so the cancel
    /// flag set beforehand is always observed by the woken sleeper.
    fn gate_waker(&self, id: GateId) -> WakeFn {
        let shared = Arc::downgrade(&self.shared);
        Arc::new(move || {
            if let Some(shared) = shared.upgrade() {
                let _guard = shared.state.lock();
                shared.gate(id).notify_all();
            }
        })
    }

    /// Runs the admission protocol for a rotation of `group.index()` /
    /// `layer`. On `Ok(())` the caller must run the operation body and then
    /// call [`Scheduler::finish_rotation`]. On `Err(Cancelled)` all
    /// bookkeeping and hand-off duties are already discharged and the body
    /// must not run.
    pub(crate) fn acquire_rotation(
        &self,
        group: Group,
        layer: usize,
        cancel: &CancelToken,
    ) -> Result<(), CubeError> {
        let group = group.index();
        let mut state = self.shared.state.lock();
        let mut handed_off = false;

        if state.may_start_rotation(group, layer) {
            state.admit_rotation(group, layer);
            trace!(group, layer, "rotation admitted directly");
        } else {
            state.enqueue_rotation(group, layer);
            let gate = GateId::Layer(group, layer);
            let _watch = cancel.watch(self.gate_waker(gate));
            loop {
                // Admission wins over cancellation: a handed-off baton must
                // never be dropped.
                if state.take_rotation_ticket(group, layer) {
                    handed_off = true;
                    break;
                }
                if cancel.is_cancelled() {
                    state.dequeue_rotation(group, layer);
                    trace!(group, layer, "rotation waiter withdrew on cancel");
                    return Err(CubeError::Cancelled);
                }
                self.shared.gate(gate).wait(&mut state);
            }
        }

        self.extend_rotation_batch(&mut state, group, layer);

        if handed_off && cancel.is_cancelled() {
            // The hand-off was honored above; retire without running the
            // body, exactly as a zero-length completion.
            state.retire_rotation(group, layer);
            self.drain_locked(&mut state, group);
            trace!(group, layer, "admitted rotation cancelled before body");
            return Err(CubeError::Cancelled);
        }
        Ok(())
    }

    /// Retires a finished rotation and runs the drain cascade.
    pub(crate) fn finish_rotation(&self, group: Group, layer: usize) {
        let group = group.index();
        let mut state = self.shared.state.lock();
        state.retire_rotation(group, layer);
        self.drain_locked(&mut state, group);
    }

    /// Admission protocol for a snapshot; contract as for
    /// [`Scheduler::acquire_rotation`].
    pub(crate) fn acquire_snapshot(&self, cancel: &CancelToken) -> Result<(), CubeError> {
        let mut state = self.shared.state.lock();
        let mut handed_off = false;

        if state.may_start_snapshot() {
            state.admit_snapshot();
            trace!("snapshot admitted directly");
        } else {
            state.enqueue_snapshot();
            let _watch = cancel.watch(self.gate_waker(GateId::Snapshot));
            loop {
                if state.take_snapshot_ticket() {
                    handed_off = true;
                    break;
                }
                if cancel.is_cancelled() {
                    state.dequeue_snapshot();
                    trace!("snapshot waiter withdrew on cancel");
                    return Err(CubeError::Cancelled);
                }
                self.shared.snapshot_gate.wait(&mut state);
            }
        }

        self.extend_snapshot_batch(&mut state);

        if handed_off && cancel.is_cancelled() {
            state.retire_snapshot();
            self.drain_locked(&mut state, SNAPSHOT_GROUP);
            trace!("admitted snapshot cancelled before body");
            return Err(CubeError::Cancelled);
        }
        Ok(())
    }

    /// Retires a finished snapshot and runs the drain cascade.
    pub(crate) fn finish_snapshot(&self) {
        let mut state = self.shared.state.lock();
        state.retire_snapshot();
        self.drain_locked(&mut state, SNAPSHOT_GROUP);
    }

    /// Intra-batch cascade for rotations: hand one admission to the lowest
    /// waiting free layer above `layer`. The woken thread continues the scan
    /// from its own layer, so one hand-off chain starts the whole cohort.
    fn extend_rotation_batch(&self, state: &mut SchedState, group: usize, layer: usize) {
        if let Some(next) = state.next_waiting_layer_above(group, layer) {
            state.dequeue_rotation(group, next);
            state.admit_rotation(group, next);
            state.put_rotation_ticket(group, next);
            self.shared.layer_gates[group][next].notify_one();
            trace!(group, from = layer, to = next, "baton passed within rotation batch");
        }
    }

    /// Intra-batch cascade for snapshots: admit every waiting snapshot
    /// thread in one pass.
    fn extend_snapshot_batch(&self, state: &mut SchedState) {
        let waiting = state.waiting_in_group(SNAPSHOT_GROUP);
        if waiting == 0 {
            return;
        }
        for _ in 0..waiting {
            state.dequeue_snapshot();
            state.admit_snapshot();
        }
        state.put_snapshot_tickets(waiting);
        self.shared.snapshot_gate.notify_all();
        trace!(admitted = waiting, "snapshot batch fanned out");
    }

    /// Drain cascade: once the cube goes idle with threads still waiting,
    /// hand one admission to the first waiting group in round-robin order
    /// starting after the finishing group. That thread's intra-batch pass
    /// then pulls in the rest of its cohort.
    fn drain_locked(&self, state: &mut SchedState, finishing_group: usize) {
        if state.active_count() != 0 || state.total_waiting() == 0 {
            return;
        }
        for offset in 1..=GROUP_COUNT {
            let next = (finishing_group + offset) % GROUP_COUNT;
            if state.waiting_in_group(next) == 0 {
                continue;
            }
            if next == SNAPSHOT_GROUP {
                state.dequeue_snapshot();
                state.admit_snapshot();
                state.put_snapshot_tickets(1);
                self.shared.snapshot_gate.notify_one();
                trace!(from = finishing_group, "drain cascade woke snapshot batch");
                return;
            }
            if let Some(first) = state.first_waiting_layer(next) {
                state.dequeue_rotation(next, first);
                state.admit_rotation(next, first);
                state.put_rotation_ticket(next, first);
                self.shared.layer_gates[next][first].notify_one();
                trace!(
                    from = finishing_group,
                    to = next,
                    layer = first,
                    "drain cascade woke rotation batch"
                );
                return;
            }
        }
    }
}
