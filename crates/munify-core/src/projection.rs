//! Read-only grid view derived from the assignment store.
//!
//! A projection holds no state of its own. Every call reads the store, so a
//! projection taken after a move or rollback always shows the current board.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gateway::WeekWindow;
use crate::model::{Absence, Assignee, AssigneeId, ScheduleSlot, WorkItem, WorkItemId};
use crate::store::AssignmentStore;
use crate::week::WeekRange;

/// Display classification of a cell's item count.
///
/// Thresholds are fixed: `<= 2` low, `3..=4` medium, `>= 5` high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadClass {
    Low,
    Medium,
    High,
}

#[must_use]
pub const fn load_classification(count: usize) -> LoadClass {
    match count {
        0..=2 => LoadClass::Low,
        3..=4 => LoadClass::Medium,
        _ => LoadClass::High,
    }
}

/// Static part of the loaded week: item details, staff and absences.
#[derive(Debug, Clone, Default)]
pub struct BoardCatalog {
    items: BTreeMap<WorkItemId, WorkItem>,
    assignees: Vec<Assignee>,
    absences: Vec<Absence>,
}

impl BoardCatalog {
    #[must_use]
    pub fn from_window(window: &WeekWindow) -> Self {
        let items = window
            .scheduled
            .iter()
            .map(|entry| &entry.work_item)
            .chain(window.unassigned.iter())
            .map(|item| (item.id, item.clone()))
            .collect();
        Self {
            items,
            assignees: window.assignees.clone(),
            absences: window.absences.clone(),
        }
    }

    #[must_use]
    pub fn item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.items.get(&id)
    }

    #[must_use]
    pub fn assignee(&self, id: AssigneeId) -> Option<&Assignee> {
        self.assignees.iter().find(|assignee| assignee.id == id)
    }

    #[must_use]
    pub fn assignees(&self) -> &[Assignee] {
        &self.assignees
    }

    #[must_use]
    pub fn absences(&self) -> &[Absence] {
        &self.absences
    }

    pub fn item_ids(&self) -> impl Iterator<Item = WorkItemId> + '_ {
        self.items.keys().copied()
    }
}

/// One {assignee × day} cell, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell<'a> {
    pub assignee: AssigneeId,
    pub date: NaiveDate,
    pub items: Vec<&'a WorkItem>,
    pub load: LoadClass,
    /// Absence overlapping this day; shown as a warning, never blocking.
    pub absence: Option<&'a Absence>,
    /// More items than the assignee's advisory capacity.
    pub over_capacity: bool,
    /// Items whose category is outside the assignee's skills.
    pub skill_gaps: Vec<WorkItemId>,
}

impl GridCell<'_> {
    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.absence.is_some() || self.over_capacity || !self.skill_gaps.is_empty()
    }
}

/// One assignee's week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow<'a> {
    pub assignee: &'a Assignee,
    pub cells: Vec<GridCell<'a>>,
    pub total: usize,
}

/// Breach of the "every item in exactly one bucket" invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageViolation {
    /// Item known to the week but missing from the store.
    Missing(WorkItemId),
    /// Store placement with no item behind it.
    Orphan(WorkItemId),
}

/// Derived view over the store for the visible week.
#[derive(Debug, Clone, Copy)]
pub struct GridProjection<'a> {
    store: &'a AssignmentStore,
    catalog: &'a BoardCatalog,
    week: WeekRange,
}

impl<'a> GridProjection<'a> {
    #[must_use]
    pub const fn new(store: &'a AssignmentStore, catalog: &'a BoardCatalog, week: WeekRange) -> Self {
        Self {
            store,
            catalog,
            week,
        }
    }

    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        self.week.days()
    }

    /// Items placed on `assignee` for `date`, in assignment order.
    ///
    /// Placements whose item details are unknown are skipped.
    #[must_use]
    pub fn cell_contents(&self, assignee: AssigneeId, date: NaiveDate) -> Vec<&'a WorkItem> {
        self.resolve(ScheduleSlot::scheduled(assignee, date))
    }

    /// Items waiting in the pool, in assignment order.
    #[must_use]
    pub fn unassigned_pool(&self) -> Vec<&'a WorkItem> {
        self.resolve(ScheduleSlot::Unassigned)
    }

    #[must_use]
    pub fn absence_on(&self, assignee: AssigneeId, date: NaiveDate) -> Option<&'a Absence> {
        self.catalog
            .absences()
            .iter()
            .find(|absence| absence.covers(assignee, date))
    }

    #[must_use]
    pub fn cell(&self, assignee: AssigneeId, date: NaiveDate) -> GridCell<'a> {
        let items = self.cell_contents(assignee, date);
        let staff = self.catalog.assignee(assignee);
        let over_capacity = staff.is_some_and(|staff| items.len() > staff.capacity as usize);
        let skill_gaps = staff.map_or_else(Vec::new, |staff| {
            items
                .iter()
                .filter(|item| !staff.handles(item.category_id()))
                .map(|item| item.id)
                .collect()
        });
        GridCell {
            assignee,
            date,
            load: load_classification(items.len()),
            absence: self.absence_on(assignee, date),
            over_capacity,
            skill_gaps,
            items,
        }
    }

    /// Whole board, one row per loaded assignee in backend order.
    #[must_use]
    pub fn rows(&self) -> Vec<GridRow<'a>> {
        let days = self.days();
        self.catalog
            .assignees()
            .iter()
            .map(|assignee| {
                let cells: Vec<GridCell<'a>> = days
                    .iter()
                    .map(|date| self.cell(assignee.id, *date))
                    .collect();
                let total = cells.iter().map(|cell| cell.items.len()).sum();
                GridRow {
                    assignee,
                    cells,
                    total,
                }
            })
            .collect()
    }

    /// Every item known to the week must have exactly one placement.
    #[must_use]
    pub fn coverage_violations(&self) -> Vec<CoverageViolation> {
        let mut violations: Vec<CoverageViolation> = self
            .catalog
            .item_ids()
            .filter(|id| !self.store.contains(*id))
            .map(CoverageViolation::Missing)
            .collect();
        violations.extend(
            self.store
                .iter()
                .filter(|(id, _)| self.catalog.item(*id).is_none())
                .map(|(id, _)| CoverageViolation::Orphan(id)),
        );
        violations
    }

    fn resolve(&self, slot: ScheduleSlot) -> Vec<&'a WorkItem> {
        self.store
            .items_in(slot)
            .into_iter()
            .filter_map(|id| self.catalog.item(id))
            .collect()
    }
}
