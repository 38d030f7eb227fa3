//! Random but reproducible planning weeks.

use chrono::{Duration, NaiveDate};

use munify_core::gateway::{ScheduledItem, WeekWindow};
use munify_core::model::{Absence, AbsenceKind, Assignee, Category, WorkItem};
use munify_core::week::WeekRange;

use crate::rng::DeterministicRng;

const CATEGORIES: [(u64, &str, &str); 4] = [
    (1, "Alumbrado", "#f5c542"),
    (2, "Bacheo", "#8a8a8a"),
    (3, "Arbolado", "#3fa34d"),
    (4, "Residuos", "#a34d3f"),
];

const NAMES: [&str; 8] = [
    "Marta", "Julio", "Ana", "Rodrigo", "Lucia", "Pablo", "Ines", "Tomas",
];

const ABSENCE_KINDS: [AbsenceKind; 5] = [
    AbsenceKind::Vacation,
    AbsenceKind::SickLeave,
    AbsenceKind::Leave,
    AbsenceKind::Training,
    AbsenceKind::Other,
];

/// Shape of the generated week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureShape {
    pub assignees: usize,
    pub items: usize,
}

/// Build the initial server state for `week`.
///
/// Roughly 40% of the items start in the unassigned pool.
#[must_use]
pub fn generate_week(shape: FixtureShape, week: &WeekRange, rng: &mut DeterministicRng) -> WeekWindow {
    let days = week.days();
    let assignees: Vec<Assignee> = (0..shape.assignees)
        .map(|index| {
            let id = 100 + index as u64;
            let name = NAMES.get(index % NAMES.len()).copied().unwrap_or("Staff");
            let capacity = 2 + u32::try_from(rng.next_bounded(5)).unwrap_or(0);
            let skills: Vec<u64> = CATEGORIES
                .iter()
                .map(|(id, _, _)| *id)
                .filter(|_| rng.hit_rate_percent(40))
                .collect();
            Assignee::new(id, format!("{name} {id}"))
                .with_capacity(capacity)
                .with_skills(skills)
        })
        .collect();

    let mut absences = Vec::new();
    for assignee in &assignees {
        if !rng.hit_rate_percent(25) {
            continue;
        }
        let Some(start) = rng.pick(&days).copied() else {
            continue;
        };
        let length = i64::try_from(rng.next_bounded(3)).unwrap_or(0);
        absences.push(Absence {
            assignee_id: assignee.id,
            start,
            end: start + Duration::days(length),
            kind: ABSENCE_KINDS[rng.next_index(ABSENCE_KINDS.len())],
        });
    }

    let mut scheduled = Vec::new();
    let mut unassigned = Vec::new();
    for index in 0..shape.items {
        let item = random_item(1000 + index as u64, rng);
        let slot = if rng.hit_rate_percent(40) {
            None
        } else {
            pick_cell(&assignees, &days, rng)
        };
        match slot {
            Some((assignee_id, date)) => scheduled.push(ScheduledItem {
                work_item: item,
                assignee_id,
                date,
            }),
            None => unassigned.push(item),
        }
    }

    WeekWindow {
        assignees,
        absences,
        scheduled,
        unassigned,
    }
}

fn random_item(id: u64, rng: &mut DeterministicRng) -> WorkItem {
    let item = WorkItem::new(id, format!("Reclamo {id}"));
    match rng.pick(&CATEGORIES) {
        Some((category, name, color)) if rng.hit_rate_percent(85) => item.with_category(Category {
            id: *category,
            name: (*name).to_string(),
            color: (*color).to_string(),
        }),
        _ => item,
    }
}

/// Random `(assignee, day)` cell, `None` when the board has no cells.
pub fn pick_cell(
    assignees: &[Assignee],
    days: &[NaiveDate],
    rng: &mut DeterministicRng,
) -> Option<(u64, NaiveDate)> {
    let assignee = rng.pick(assignees)?;
    let date = rng.pick(days)?;
    Some((assignee.id, *date))
}
