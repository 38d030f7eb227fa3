use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::work_item::CategoryId;

/// Backend identifier of an employee.
pub type AssigneeId = u64;

/// Whether an employee works on the street or at a desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeKind {
    #[default]
    Field,
    Office,
}

/// An employee who can receive complaints. Read-only for the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: AssigneeId,
    pub display_name: String,
    #[serde(default)]
    pub kind: AssigneeKind,
    /// Advisory number of items per day; never enforced.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub skills: BTreeSet<CategoryId>,
}

impl Assignee {
    #[must_use]
    pub fn new(id: AssigneeId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            kind: AssigneeKind::Field,
            capacity: default_capacity(),
            skills: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_skills(mut self, skills: impl IntoIterator<Item = CategoryId>) -> Self {
        self.skills = skills.into_iter().collect();
        self
    }

    /// An assignee with no declared skills is treated as a generalist.
    #[must_use]
    pub fn handles(&self, category: Option<CategoryId>) -> bool {
        match category {
            Some(id) => self.skills.is_empty() || self.skills.contains(&id),
            None => true,
        }
    }
}

const fn default_capacity() -> u32 {
    4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    Vacation,
    SickLeave,
    Leave,
    Training,
    #[default]
    Other,
}

impl fmt::Display for AbsenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vacation => "vacation",
            Self::SickLeave => "sick_leave",
            Self::Leave => "leave",
            Self::Training => "training",
            Self::Other => "other",
        })
    }
}

/// A period during which an assignee is unavailable (both ends inclusive).
///
/// Only used to annotate the grid; it never blocks a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub assignee_id: AssigneeId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub kind: AbsenceKind,
}

impl Absence {
    #[must_use]
    pub fn covers(&self, assignee: AssigneeId, date: NaiveDate) -> bool {
        self.assignee_id == assignee && self.start <= date && date <= self.end
    }
}
