//! munify-core library.
//!
//! Weekly planning board engine: an assignment store for one week, the
//! drag-and-drop id codec, optimistic moves with rollback, and the derived
//! grid view.
//!
//! # Conventions
//!
//! - **Errors**: domain errors are `thiserror` enums in [`error`]; config and
//!   other application paths use `anyhow::Result`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod apply;
pub mod config;
pub mod controller;
pub mod dnd;
pub mod error;
pub mod gateway;
pub mod model;
pub mod projection;
pub mod store;
pub mod week;

pub use controller::{DragEnd, DropOutcome, MoveOutcome, ReconciliationController, Resolution};
pub use error::{ErrorCode, GatewayError, PlanningError};
pub use gateway::{AssignRequest, PlanningGateway, WeekQuery, WeekWindow};
pub use model::{ScheduleSlot, WorkItem, WorkItemId};
pub use store::AssignmentStore;
