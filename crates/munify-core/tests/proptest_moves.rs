use chrono::NaiveDate;
use munify_core::apply;
use munify_core::dnd;
use munify_core::error::{PlanningError, UnsupportedMove};
use munify_core::model::{ItemKind, MoveIntent, ScheduleSlot};
use munify_core::store::AssignmentStore;
use proptest::prelude::*;

fn arb_slot() -> impl Strategy<Value = ScheduleSlot> {
    prop_oneof![
        1 => Just(ScheduleSlot::Unassigned),
        4 => (1u64..6, 0u32..7).prop_map(|(assignee, offset)| {
            let date = NaiveDate::from_ymd_opt(2024, 3, 4 + offset).expect("valid date");
            ScheduleSlot::scheduled(assignee, date)
        }),
    ]
}

fn arb_store() -> impl Strategy<Value = AssignmentStore> {
    prop::collection::vec(arb_slot(), 1..12).prop_map(|slots| {
        let mut store = AssignmentStore::new();
        store.load(
            slots
                .into_iter()
                .enumerate()
                .map(|(index, slot)| (index as u64, slot)),
        );
        store
    })
}

fn intent_for(store: &AssignmentStore, work_item: u64, to: ScheduleSlot) -> MoveIntent {
    MoveIntent {
        kind: ItemKind::Reclamo,
        work_item,
        from: store.get(work_item).unwrap_or(ScheduleSlot::Unassigned),
        to,
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn apply_is_idempotent(store in arb_store(), pick in any::<prop::sample::Index>(), to in arb_slot()) {
        let mut store = store;
        let id = pick.index(store.len()) as u64;
        let intent = intent_for(&store, id, to);

        let first = apply::apply(&mut store, &intent);
        let once = store.snapshot();
        let second = apply::apply(&mut store, &intent);

        prop_assert_eq!(store.snapshot(), once);
        prop_assert_eq!(first.is_ok(), second.is_ok());
    }

    #[test]
    fn every_item_stays_in_exactly_one_bucket(
        store in arb_store(),
        moves in prop::collection::vec((any::<prop::sample::Index>(), arb_slot()), 0..20),
    ) {
        let mut store = store;
        let ids: Vec<u64> = store.iter().map(|(id, _)| id).collect();
        for (pick, to) in moves {
            let id = ids[pick.index(ids.len())];
            let intent = intent_for(&store, id, to);
            let _ = apply::apply(&mut store, &intent);
        }

        let mut buckets: Vec<ScheduleSlot> = store.iter().map(|(_, slot)| slot).collect();
        buckets.sort();
        buckets.dedup();
        let listed: usize = buckets.iter().map(|slot| store.items_in(*slot).len()).sum();
        prop_assert_eq!(listed, ids.len());
        for id in &ids {
            prop_assert!(store.get(*id).is_ok());
        }
    }

    #[test]
    fn rollback_restores_state_exactly(store in arb_store(), pick in any::<prop::sample::Index>(), to in arb_slot()) {
        let mut store = store;
        let id = pick.index(store.len()) as u64;
        let before = store.snapshot();

        let intent = intent_for(&store, id, to);
        let _ = apply::apply(&mut store, &intent);
        store.replace(before.clone());

        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn pool_target_always_rejected(store in arb_store(), pick in any::<prop::sample::Index>()) {
        let mut store = store;
        let id = pick.index(store.len()) as u64;
        let before = store.snapshot();

        let intent = intent_for(&store, id, ScheduleSlot::Unassigned);
        let result = apply::apply(&mut store, &intent);

        prop_assert_eq!(
            result,
            Err(PlanningError::Unsupported(UnsupportedMove::IntoUnassignedPool))
        );
        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn decoder_never_panics(source in ".{0,40}", destination in ".{0,40}", draggable in ".{0,20}") {
        let _ = dnd::decode(&source, &destination, &draggable);
    }

    #[test]
    fn foreign_bucket_ids_are_malformed(raw in "[^au].{0,30}") {
        prop_assert!(dnd::parse_slot(&raw).is_err());
        prop_assert!(dnd::decode(&raw, "unassigned", "reclamo-1").is_err());
    }

    #[test]
    fn encoded_slots_decode_back(slot in arb_slot(), id in 0u64..1_000_000) {
        let intent = dnd::decode(
            "unassigned",
            &dnd::slot_dom_id(&slot),
            &dnd::draggable_dom_id(ItemKind::Reclamo, id),
        );
        prop_assert_eq!(intent.map(|intent| (intent.work_item, intent.to)), Ok((id, slot)));
    }
}
