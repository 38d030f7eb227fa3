//! Boundary with the planning backend.
//!
//! Only the payload shapes and the [`PlanningGateway`] trait live here; HTTP
//! framing, auth and retries belong to whatever implements the trait.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::model::{Absence, Assignee, AssigneeId, ScheduleSlot, WorkItem, WorkItemId};
use crate::week::WeekRange;

/// Parameters of a week fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekQuery {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_filter: Option<Vec<AssigneeId>>,
}

impl WeekQuery {
    #[must_use]
    pub fn for_range(range: &WeekRange, assignee_filter: Option<Vec<AssigneeId>>) -> Self {
        Self {
            range_start: range.start(),
            range_end: range.end(),
            assignee_filter,
        }
    }
}

/// A work item already placed on a day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub work_item: WorkItem,
    pub assignee_id: AssigneeId,
    pub date: NaiveDate,
}

/// Everything the board needs to render one week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub scheduled: Vec<ScheduledItem>,
    #[serde(default)]
    pub unassigned: Vec<WorkItem>,
}

impl WeekWindow {
    /// Parse a backend JSON response.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload does not match.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Placements in backend order: scheduled items first, then the pool.
    pub fn placements(&self) -> impl Iterator<Item = (WorkItemId, ScheduleSlot)> + '_ {
        self.scheduled
            .iter()
            .map(|entry| {
                (
                    entry.work_item.id,
                    ScheduleSlot::scheduled(entry.assignee_id, entry.date),
                )
            })
            .chain(
                self.unassigned
                    .iter()
                    .map(|item| (item.id, ScheduleSlot::Unassigned)),
            )
    }
}

/// The one write the board performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignRequest {
    pub work_item: WorkItemId,
    pub assignee_id: AssigneeId,
    pub date: NaiveDate,
}

/// Remote store of planning truth.
///
/// `assign_move` must be idempotent: re-issuing the same assignment is safe.
pub trait PlanningGateway {
    /// Load the whole week window.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] raised by the transport or the server.
    fn fetch_week(&mut self, query: &WeekQuery) -> Result<WeekWindow, GatewayError>;

    /// Persist one assignment.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] raised by the transport or the server.
    fn assign_move(&mut self, request: &AssignRequest) -> Result<(), GatewayError>;
}
