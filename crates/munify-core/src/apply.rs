//! Optimistic mutation of the assignment store.
//!
//! Applied synchronously at drag end, before the backend confirms anything.
//!
//! Edge-case policy:
//! - dropping onto the unassigned pool is refused; unassigning is a separate,
//!   guarded action in the item's detail view;
//! - absences and capacity are soft constraints shown by the projection and
//!   never block a move.

use crate::error::{PlanningError, UnsupportedMove};
use crate::model::{MoveIntent, ScheduleSlot};
use crate::store::AssignmentStore;

/// Check whether `intent` may be applied at all.
///
/// # Errors
///
/// [`UnsupportedMove::IntoUnassignedPool`] for any move whose target is the
/// pool, whatever the item's current slot.
pub const fn validate(intent: &MoveIntent) -> Result<(), UnsupportedMove> {
    match intent.to {
        ScheduleSlot::Unassigned => Err(UnsupportedMove::IntoUnassignedPool),
        ScheduleSlot::Scheduled { .. } => Ok(()),
    }
}

/// Apply `intent` to `store`. Returns whether the store changed.
///
/// Applying the same intent twice leaves the store as after the first call.
///
/// # Errors
///
/// - [`PlanningError::Unsupported`] when the target is the pool.
/// - [`PlanningError::Store`] when the item is not loaded in this week.
pub fn apply(store: &mut AssignmentStore, intent: &MoveIntent) -> Result<bool, PlanningError> {
    validate(intent)?;
    let current = store.get(intent.work_item)?;
    if current == intent.to {
        return Ok(false);
    }
    store.set(intent.work_item, intent.to);
    tracing::trace!(%intent, "applied optimistically");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::ItemKind;
    use chrono::NaiveDate;

    fn cell(assignee: u64, day: u32) -> ScheduleSlot {
        ScheduleSlot::scheduled(
            assignee,
            NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date"),
        )
    }

    fn intent(work_item: u64, from: ScheduleSlot, to: ScheduleSlot) -> MoveIntent {
        MoveIntent {
            kind: ItemKind::Reclamo,
            work_item,
            from,
            to,
        }
    }

    #[test]
    fn moves_item_to_target() {
        let mut store = AssignmentStore::new();
        store.load([(42, ScheduleSlot::Unassigned)]);
        let changed = apply(&mut store, &intent(42, ScheduleSlot::Unassigned, cell(7, 4)))
            .expect("apply succeeds");
        assert!(changed);
        assert_eq!(store.get(42), Ok(cell(7, 4)));
    }

    #[test]
    fn second_apply_is_idempotent() {
        let mut store = AssignmentStore::new();
        store.load([(42, cell(7, 4))]);
        let mv = intent(42, cell(7, 4), cell(9, 5));
        assert!(apply(&mut store, &mv).expect("first apply"));
        let once = store.snapshot();
        assert!(!apply(&mut store, &mv).expect("second apply"));
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn pool_target_is_rejected_without_mutation() {
        let mut store = AssignmentStore::new();
        store.load([(42, cell(7, 4)), (43, ScheduleSlot::Unassigned)]);
        let before = store.snapshot();
        for mv in [
            intent(42, cell(7, 4), ScheduleSlot::Unassigned),
            intent(43, ScheduleSlot::Unassigned, ScheduleSlot::Unassigned),
        ] {
            assert_eq!(
                apply(&mut store, &mv),
                Err(PlanningError::Unsupported(UnsupportedMove::IntoUnassignedPool))
            );
        }
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let mut store = AssignmentStore::new();
        store.load([(1, ScheduleSlot::Unassigned)]);
        assert_eq!(
            apply(&mut store, &intent(2, ScheduleSlot::Unassigned, cell(7, 4))),
            Err(PlanningError::Store(StoreError::NotFound(2)))
        );
        assert_eq!(store.len(), 1);
    }
}
