//! Planning board domain types.

pub mod assignee;
pub mod slot;
pub mod work_item;

pub use assignee::{Absence, AbsenceKind, Assignee, AssigneeId, AssigneeKind};
pub use slot::{MoveIntent, ScheduleSlot};
pub use work_item::{Category, CategoryId, ItemKind, ParseEnumError, Status, WorkItem, WorkItemId};
