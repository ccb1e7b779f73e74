//! Shared scheduling state.
//!
//! Every counter of the admission protocol lives in one struct behind one
//! lock. Nothing here blocks; the blocking protocol and the hand-off logic
//! are in the parent module.

use crate::layer::{GROUP_COUNT, SNAPSHOT_GROUP};

/// Number of rotation groups (all groups except the snapshot class).
const ROTATION_GROUPS: usize = GROUP_COUNT - 1;

/// All scheduling counters, owned by the scheduler's single mutex.
///
/// Sized once at construction; no per-operation allocation.
#[derive(Debug)]
pub(crate) struct SchedState {
    size: usize,
    /// Group of the running batch; meaningful only while `active_count > 0`.
    active_group: usize,
    /// Number of admitted operations currently between admission and retire.
    active_count: usize,
    /// Per rotation group, which canonical layers are currently running.
    active_layers: Vec<Vec<bool>>,
    /// Total threads registered as waiting, across all groups.
    total_waiting: usize,
    waiting_by_group: [usize; GROUP_COUNT],
    /// Rotation groups only: waiters per canonical layer.
    waiting_by_layer: Vec<Vec<usize>>,
    /// Admissions handed to sleeping rotation waiters whose bookkeeping the
    /// waker already performed on their behalf.
    rotation_tickets: Vec<Vec<usize>>,
    /// Same, for the snapshot gate.
    snapshot_tickets: usize,
}

impl SchedState {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            active_group: 0,
            active_count: 0,
            active_layers: vec![vec![false; size]; ROTATION_GROUPS],
            total_waiting: 0,
            waiting_by_group: [0; GROUP_COUNT],
            waiting_by_layer: vec![vec![0; size]; ROTATION_GROUPS],
            rotation_tickets: vec![vec![0; size]; ROTATION_GROUPS],
            snapshot_tickets: 0,
        }
    }

    /// True when a group other than `group` has at least one waiter.
    fn has_foreign_waiters(&self, group: usize) -> bool {
        self.total_waiting > self.waiting_by_group[group]
    }

    /// Admission rule for a rotation request: an idle cube admits anyone;
    /// an active same-group batch may be joined opportunistically only while
    /// no other group is waiting and the layer itself is free.
    pub(crate) fn may_start_rotation(&self, group: usize, layer: usize) -> bool {
        self.active_count == 0
            || (self.active_group == group
                && !self.active_layers[group][layer]
                && !self.has_foreign_waiters(group))
    }

    /// Admission rule for a snapshot request; snapshots have no layer
    /// concept, so any count of them may join while no other group waits.
    pub(crate) fn may_start_snapshot(&self) -> bool {
        self.active_count == 0
            || (self.active_group == SNAPSHOT_GROUP && !self.has_foreign_waiters(SNAPSHOT_GROUP))
    }

    pub(crate) fn admit_rotation(&mut self, group: usize, layer: usize) {
        debug_assert!(
            !self.active_layers[group][layer],
            "canonical layer admitted twice"
        );
        debug_assert!(self.active_count == 0 || self.active_group == group);
        self.active_group = group;
        self.active_layers[group][layer] = true;
        self.active_count += 1;
    }

    pub(crate) fn admit_snapshot(&mut self) {
        debug_assert!(self.active_count == 0 || self.active_group == SNAPSHOT_GROUP);
        self.active_group = SNAPSHOT_GROUP;
        self.active_count += 1;
    }

    pub(crate) fn retire_rotation(&mut self, group: usize, layer: usize) {
        debug_assert!(self.active_layers[group][layer]);
        self.active_layers[group][layer] = false;
        self.active_count -= 1;
    }

    pub(crate) fn retire_snapshot(&mut self) {
        debug_assert!(self.active_group == SNAPSHOT_GROUP && self.active_count > 0);
        self.active_count -= 1;
    }

    pub(crate) fn enqueue_rotation(&mut self, group: usize, layer: usize) {
        self.total_waiting += 1;
        self.waiting_by_group[group] += 1;
        self.waiting_by_layer[group][layer] += 1;
        self.debug_check();
    }

    pub(crate) fn dequeue_rotation(&mut self, group: usize, layer: usize) {
        self.total_waiting -= 1;
        self.waiting_by_group[group] -= 1;
        self.waiting_by_layer[group][layer] -= 1;
        self.debug_check();
    }

    pub(crate) fn enqueue_snapshot(&mut self) {
        self.total_waiting += 1;
        self.waiting_by_group[SNAPSHOT_GROUP] += 1;
        self.debug_check();
    }

    pub(crate) fn dequeue_snapshot(&mut self) {
        self.total_waiting -= 1;
        self.waiting_by_group[SNAPSHOT_GROUP] -= 1;
        self.debug_check();
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active_count
    }

    pub(crate) fn total_waiting(&self) -> usize {
        self.total_waiting
    }

    pub(crate) fn waiting_in_group(&self, group: usize) -> usize {
        self.waiting_by_group[group]
    }

    /// Lowest canonical layer of `group` with at least one waiter.
    pub(crate) fn first_waiting_layer(&self, group: usize) -> Option<usize> {
        (0..self.size).find(|&layer| self.waiting_by_layer[group][layer] > 0)
    }

    /// Lowest canonical layer strictly above `layer` that has a waiter and
    /// is not already running. The scan never wraps below `layer`; waiters
    /// on lower layers are serviced when the group is next selected.
    pub(crate) fn next_waiting_layer_above(&self, group: usize, layer: usize) -> Option<usize> {
        (layer + 1..self.size).find(|&next| {
            self.waiting_by_layer[group][next] > 0 && !self.active_layers[group][next]
        })
    }

    pub(crate) fn take_rotation_ticket(&mut self, group: usize, layer: usize) -> bool {
        if self.rotation_tickets[group][layer] > 0 {
            self.rotation_tickets[group][layer] -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn put_rotation_ticket(&mut self, group: usize, layer: usize) {
        self.rotation_tickets[group][layer] += 1;
    }

    pub(crate) fn take_snapshot_ticket(&mut self) -> bool {
        if self.snapshot_tickets > 0 {
            self.snapshot_tickets -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn put_snapshot_tickets(&mut self, count: usize) {
        self.snapshot_tickets += count;
    }

    fn debug_check(&self) {
        debug_assert_eq!(
            self.total_waiting,
            self.waiting_by_group.iter().sum::<usize>(),
            "total_waiting out of sync with per-group counts"
        );
        for group in 0..ROTATION_GROUPS {
            debug_assert_eq!(
                self.waiting_by_group[group],
                self.waiting_by_layer[group].iter().sum::<usize>(),
                "group waiter count out of sync with per-layer counts"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn idle_cube_admits_any_request() {
        init_test("idle_cube_admits_any_request");
        let state = SchedState::new(3);
        crate::assert_with_log!(state.may_start_rotation(0, 0), "rotation", true, true);
        crate::assert_with_log!(state.may_start_snapshot(), "snapshot", true, true);
        crate::test_complete!("idle_cube_admits_any_request");
    }

    #[test]
    fn cross_group_requests_are_refused_while_active() {
        init_test("cross_group_requests_are_refused_while_active");
        let mut state = SchedState::new(3);
        state.admit_rotation(0, 1);
        let other_group = state.may_start_rotation(1, 0);
        crate::assert_with_log!(!other_group, "other rotation group", false, other_group);
        let snapshot = state.may_start_snapshot();
        crate::assert_with_log!(!snapshot, "snapshot during rotation", false, snapshot);
        crate::test_complete!("cross_group_requests_are_refused_while_active");
    }

    #[test]
    fn same_group_joins_on_free_layers_only() {
        init_test("same_group_joins_on_free_layers_only");
        let mut state = SchedState::new(3);
        state.admit_rotation(0, 1);
        let free_layer = state.may_start_rotation(0, 2);
        crate::assert_with_log!(free_layer, "free layer joins", true, free_layer);
        let busy_layer = state.may_start_rotation(0, 1);
        crate::assert_with_log!(!busy_layer, "busy layer waits", false, busy_layer);
        crate::test_complete!("same_group_joins_on_free_layers_only");
    }

    #[test]
    fn foreign_waiter_blocks_opportunistic_join() {
        init_test("foreign_waiter_blocks_opportunistic_join");
        let mut state = SchedState::new(3);
        state.admit_rotation(0, 0);
        state.enqueue_snapshot();
        let join = state.may_start_rotation(0, 1);
        crate::assert_with_log!(!join, "join refused", false, join);
        state.dequeue_snapshot();
        let join = state.may_start_rotation(0, 1);
        crate::assert_with_log!(join, "join allowed again", true, join);
        crate::test_complete!("foreign_waiter_blocks_opportunistic_join");
    }

    #[test]
    fn same_group_waiters_do_not_block_joins() {
        init_test("same_group_waiters_do_not_block_joins");
        let mut state = SchedState::new(3);
        state.admit_rotation(0, 0);
        state.enqueue_rotation(0, 0);
        let join = state.may_start_rotation(0, 1);
        crate::assert_with_log!(join, "same-group waiter ignored", true, join);
        crate::test_complete!("same_group_waiters_do_not_block_joins");
    }

    #[test]
    fn layer_scans_respect_activity_and_direction() {
        init_test("layer_scans_respect_activity_and_direction");
        let mut state = SchedState::new(4);
        state.enqueue_rotation(0, 1);
        state.enqueue_rotation(0, 3);
        let first = state.first_waiting_layer(0);
        crate::assert_with_log!(first == Some(1), "lowest waiting layer", Some(1usize), first);
        let above = state.next_waiting_layer_above(0, 1);
        crate::assert_with_log!(above == Some(3), "next above 1", Some(3usize), above);
        let none_below = state.next_waiting_layer_above(0, 3);
        crate::assert_with_log!(none_below.is_none(), "no wrap-around", true, none_below.is_none());
        state.admit_rotation(0, 3);
        let skips_active = state.next_waiting_layer_above(0, 1);
        crate::assert_with_log!(
            skips_active.is_none(),
            "active layer skipped",
            true,
            skips_active.is_none()
        );
        crate::test_complete!("layer_scans_respect_activity_and_direction");
    }

    #[test]
    fn tickets_are_counted_exactly() {
        init_test("tickets_are_counted_exactly");
        let mut state = SchedState::new(2);
        crate::assert_with_log!(!state.take_rotation_ticket(0, 0), "no ticket yet", false, false);
        state.put_rotation_ticket(0, 0);
        crate::assert_with_log!(state.take_rotation_ticket(0, 0), "ticket taken", true, true);
        crate::assert_with_log!(!state.take_rotation_ticket(0, 0), "ticket spent", false, false);
        state.put_snapshot_tickets(2);
        crate::assert_with_log!(state.take_snapshot_ticket(), "first snapshot ticket", true, true);
        crate::assert_with_log!(state.take_snapshot_ticket(), "second snapshot ticket", true, true);
        crate::assert_with_log!(!state.take_snapshot_ticket(), "tickets spent", false, false);
        crate::test_complete!("tickets_are_counted_exactly");
    }
}
