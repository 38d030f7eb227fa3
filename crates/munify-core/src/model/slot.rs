use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::assignee::AssigneeId;
use super::work_item::{ItemKind, WorkItemId};

/// Where a work item sits on the board: a day of one assignee, or the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "bucket", rename_all = "snake_case")]
pub enum ScheduleSlot {
    Unassigned,
    Scheduled {
        assignee: AssigneeId,
        date: NaiveDate,
    },
}

impl ScheduleSlot {
    #[must_use]
    pub const fn scheduled(assignee: AssigneeId, date: NaiveDate) -> Self {
        Self::Scheduled { assignee, date }
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        matches!(self, Self::Unassigned)
    }

    #[must_use]
    pub const fn assignee(&self) -> Option<AssigneeId> {
        match self {
            Self::Scheduled { assignee, .. } => Some(*assignee),
            Self::Unassigned => None,
        }
    }

    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Scheduled { date, .. } => Some(*date),
            Self::Unassigned => None,
        }
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => f.write_str("unassigned"),
            Self::Scheduled { assignee, date } => write!(f, "assignee {assignee} on {date}"),
        }
    }
}

/// A decoded, not yet applied reassignment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveIntent {
    pub kind: ItemKind,
    pub work_item: WorkItemId,
    pub from: ScheduleSlot,
    pub to: ScheduleSlot,
}

impl MoveIntent {
    /// Source and destination are the same bucket.
    #[must_use]
    pub fn is_same_slot(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for MoveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} -> {}",
            self.kind, self.work_item, self.from, self.to
        )
    }
}
