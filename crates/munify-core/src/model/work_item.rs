use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Stable backend identifier of a complaint.
pub type WorkItemId = u64;

/// Identifier of a complaint category.
pub type CategoryId = u64;

/// Kinds of draggable item on the board.
///
/// Only complaints are scheduled today; the prefix is part of the draggable
/// id format and is reserved for future item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Reclamo,
}

impl ItemKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Reclamo => "reclamo",
        }
    }
}

/// Lifecycle status of a complaint, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    New,
    Assigned,
    InProgress,
    PendingConfirmation,
    Resolved,
    Rejected,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the complaint is closed and only shown for reference.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// Category label shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// CSS color, e.g. `#3b82f6`.
    pub color: String,
}

/// A schedulable complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub address: Option<String>,
}

impl WorkItem {
    /// Minimal item with a title and default status.
    #[must_use]
    pub fn new(id: WorkItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: Status::New,
            category: None,
            address: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<CategoryId> {
        match &self.category {
            Some(category) => Some(category.id),
            None => None,
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draggable kinds are matched exactly: they are part of a wire format.
impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reclamo" => Ok(Self::Reclamo),
            _ => Err(ParseEnumError {
                expected: "item kind",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "pending_confirmation" => Ok(Self::PendingConfirmation),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}
