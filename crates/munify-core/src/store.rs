//! In-memory assignment store for the loaded week.
//!
//! The store is a dumb map from work item to [`ScheduleSlot`]. It performs no
//! legality checks (that is the applier's job) and never talks to the network.
//! Each placement remembers the order in which it was made so that cells list
//! their items in assignment order instead of jumping around on every render.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::model::{ScheduleSlot, WorkItemId};

/// Current slot of one item plus its assignment sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub slot: ScheduleSlot,
    pub seq: u64,
}

/// Immutable copy of the store taken before an optimistic move.
///
/// Two snapshots are equal when they hold the same placements; the
/// generation counter is bookkeeping and is not compared.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    placements: BTreeMap<WorkItemId, Placement>,
    generation: u64,
}

impl StoreSnapshot {
    #[must_use]
    pub const fn placements(&self) -> &BTreeMap<WorkItemId, Placement> {
        &self.placements
    }

    /// Store generation at the time the snapshot was taken.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn slot_of(&self, id: WorkItemId) -> Option<ScheduleSlot> {
        self.placements.get(&id).map(|placement| placement.slot)
    }
}

impl PartialEq for StoreSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.placements == other.placements
    }
}

impl Eq for StoreSnapshot {}

/// Mapping `WorkItem.id -> ScheduleSlot` for the current week window.
#[derive(Debug, Clone, Default)]
pub struct AssignmentStore {
    placements: BTreeMap<WorkItemId, Placement>,
    next_seq: u64,
    generation: u64,
}

impl AssignmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole window with freshly fetched placements.
    ///
    /// Sequence numbers follow the iteration order, so the backend's ordering
    /// becomes the initial cell ordering.
    pub fn load(&mut self, placements: impl IntoIterator<Item = (WorkItemId, ScheduleSlot)>) {
        self.placements.clear();
        for (id, slot) in placements {
            let seq = self.bump_seq();
            self.placements.insert(id, Placement { slot, seq });
        }
        self.generation += 1;
    }

    /// Current slot of `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the item is not part of the loaded week.
    pub fn get(&self, id: WorkItemId) -> Result<ScheduleSlot, StoreError> {
        self.placements
            .get(&id)
            .map(|placement| placement.slot)
            .ok_or(StoreError::NotFound(id))
    }

    #[must_use]
    pub fn placement(&self, id: WorkItemId) -> Option<Placement> {
        self.placements.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: WorkItemId) -> bool {
        self.placements.contains_key(&id)
    }

    /// Overwrite the slot of `id`.
    ///
    /// Setting an item to the slot it already occupies changes nothing, not
    /// even its position within the cell.
    pub fn set(&mut self, id: WorkItemId, slot: ScheduleSlot) {
        if self
            .placements
            .get(&id)
            .is_some_and(|placement| placement.slot == slot)
        {
            return;
        }
        let seq = self.bump_seq();
        self.placements.insert(id, Placement { slot, seq });
        self.generation += 1;
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            placements: self.placements.clone(),
            generation: self.generation,
        }
    }

    /// Restore every placement from `snapshot`.
    pub fn replace(&mut self, snapshot: StoreSnapshot) {
        self.placements = snapshot.placements;
        self.generation += 1;
    }

    /// Restore the placement of a single item from `snapshot`, leaving every
    /// other item as it currently is.
    pub fn restore_item(&mut self, snapshot: &StoreSnapshot, id: WorkItemId) {
        match snapshot.placements.get(&id) {
            Some(placement) => {
                self.placements.insert(id, *placement);
            }
            None => {
                self.placements.remove(&id);
            }
        }
        self.generation += 1;
    }

    /// Monotonic counter bumped on every effective mutation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Items in `slot`, in assignment order.
    #[must_use]
    pub fn items_in(&self, slot: ScheduleSlot) -> Vec<WorkItemId> {
        let mut matching: Vec<(u64, WorkItemId)> = self
            .placements
            .iter()
            .filter(|(_, placement)| placement.slot == slot)
            .map(|(id, placement)| (placement.seq, *id))
            .collect();
        matching.sort_unstable();
        matching.into_iter().map(|(_, id)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkItemId, ScheduleSlot)> + '_ {
        self.placements
            .iter()
            .map(|(id, placement)| (*id, placement.slot))
    }

    const fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn slot(assignee: u64, day: u32) -> ScheduleSlot {
        ScheduleSlot::scheduled(
            assignee,
            NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date"),
        )
    }

    fn loaded() -> AssignmentStore {
        let mut store = AssignmentStore::new();
        store.load([
            (1, slot(7, 4)),
            (2, slot(7, 4)),
            (3, ScheduleSlot::Unassigned),
        ]);
        store
    }

    #[test]
    fn get_unknown_item_is_not_found() {
        let store = loaded();
        assert_eq!(store.get(99), Err(StoreError::NotFound(99)));
        assert_eq!(store.get(3), Ok(ScheduleSlot::Unassigned));
    }

    #[test]
    fn items_in_follow_assignment_order() {
        let mut store = loaded();
        store.set(3, slot(7, 4));
        assert_eq!(store.items_in(slot(7, 4)), vec![1, 2, 3]);

        store.set(1, slot(9, 5));
        store.set(1, slot(7, 4));
        assert_eq!(store.items_in(slot(7, 4)), vec![2, 3, 1]);
    }

    #[test]
    fn set_to_current_slot_is_a_no_op() {
        let mut store = loaded();
        let before = store.snapshot();
        let generation = store.generation();
        store.set(1, slot(7, 4));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn replace_restores_snapshot_exactly() {
        let mut store = loaded();
        let before = store.snapshot();
        store.set(3, slot(9, 5));
        store.set(1, ScheduleSlot::Unassigned);
        store.replace(before.clone());
        assert_eq!(store.snapshot(), before);
        assert!(store.generation() > before.generation());
    }

    #[test]
    fn restore_item_keeps_other_moves() {
        let mut store = loaded();
        let before = store.snapshot();
        store.set(3, slot(9, 5));
        store.set(2, slot(9, 6));
        store.restore_item(&before, 3);
        assert_eq!(store.get(3), Ok(ScheduleSlot::Unassigned));
        assert_eq!(store.get(2), Ok(slot(9, 6)));
        assert_eq!(store.placement(3), before.placements().get(&3).copied());
    }

    #[test]
    fn load_replaces_previous_window() {
        let mut store = loaded();
        store.load([(10, ScheduleSlot::Unassigned)]);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(1));
        assert!(store.contains(10));
    }
}
