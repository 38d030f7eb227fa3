use std::fmt;

use crate::model::WorkItemId;

/// Machine-readable error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ItemNotFound,
    MalformedDragId,
    UnsupportedMove,
    GatewayNetwork,
    GatewayRejected,
    GatewayTimeout,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::MalformedDragId => "E2101",
            Self::UnsupportedMove => "E2102",
            Self::GatewayNetwork => "E4001",
            Self::GatewayRejected => "E4002",
            Self::GatewayTimeout => "E4003",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Work item not loaded in this week",
            Self::MalformedDragId => "Malformed drag-and-drop identifier",
            Self::UnsupportedMove => "Move not allowed from the board",
            Self::GatewayNetwork => "Planning backend unreachable",
            Self::GatewayRejected => "Planning backend rejected the move",
            Self::GatewayTimeout => "Planning backend timed out",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .munify/config.toml and retry."),
            Self::ItemNotFound => Some("Reload the week; the item may have been closed or moved."),
            Self::MalformedDragId => None,
            Self::UnsupportedMove => Some("Use the item's detail view to unassign it."),
            Self::GatewayNetwork | Self::GatewayTimeout => {
                Some("Check the connection and repeat the drag.")
            }
            Self::GatewayRejected => Some("Reload the week and review the item before retrying."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lookup failure in the assignment store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("work item {0} is not loaded in the current week")]
    NotFound(WorkItemId),
}

/// A drag identifier that does not follow the board's id format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {role} id '{raw}': {reason}")]
pub struct MalformedId {
    /// Which identifier failed: `source`, `destination` or `draggable`.
    pub role: &'static str,
    pub raw: String,
    pub reason: &'static str,
}

/// A move the board refuses to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedMove {
    #[error("items cannot be dropped into the unassigned pool")]
    IntoUnassignedPool,
}

/// Failure reported by the planning backend for a persist or fetch call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rejected by server (status {status}): {reason}")]
    Rejected { status: u16, reason: String },
    #[error("request timed out")]
    Timeout,
}

/// Any error raised while handling a move on the board.
///
/// None of these escape the controller; they are mapped to notifications.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanningError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Malformed(#[from] MalformedId),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedMove),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl PlanningError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Store(StoreError::NotFound(_)) => ErrorCode::ItemNotFound,
            Self::Malformed(_) => ErrorCode::MalformedDragId,
            Self::Unsupported(_) => ErrorCode::UnsupportedMove,
            Self::Gateway(GatewayError::Network(_)) => ErrorCode::GatewayNetwork,
            Self::Gateway(GatewayError::Rejected { .. }) => ErrorCode::GatewayRejected,
            Self::Gateway(GatewayError::Timeout) => ErrorCode::GatewayTimeout,
        }
    }
}
