//! Reconciliation controller for drag-and-drop moves.
//!
//! Each move runs through one small state machine:
//!
//! ```text
//! Idle -> Decoding -> AppliedOptimistically -> Confirmed  -> Idle
//!                                          \-> RolledBack -> Idle
//! ```
//!
//! The controller never performs I/O itself. [`ReconciliationController::drag_end`]
//! decodes and applies a move and hands back the [`AssignRequest`] to persist;
//! the caller dispatches it and later reports the result through
//! [`ReconciliationController::resolve`]. Moves of different items may be in
//! flight at the same time and resolve in any order. A given item has at most
//! one move in flight: it is not draggable until that move resolves.
//!
//! The controller is the only writer of the [`AssignmentStore`]; everything
//! else reads it through [`GridProjection`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::apply;
use crate::config::{EffectiveConfig, ProjectConfig};
use crate::dnd;
use crate::error::{GatewayError, PlanningError};
use crate::gateway::{AssignRequest, PlanningGateway, WeekQuery, WeekWindow};
use crate::model::{AssigneeId, MoveIntent, ScheduleSlot, WorkItemId};
use crate::projection::{BoardCatalog, GridProjection};
use crate::store::{AssignmentStore, StoreSnapshot};
use crate::week::{Navigate, WeekRange};

// ---------------------------------------------------------------------------
// Events and outcomes
// ---------------------------------------------------------------------------

/// Raw ids reported by the UI when a drag ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub source: String,
    /// `None` when the card was dropped outside every droppable.
    pub destination: Option<String>,
    pub draggable: String,
}

impl DragEnd {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        draggable: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: Some(destination.into()),
            draggable: draggable.into(),
        }
    }
}

/// Lifecycle phase of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovePhase {
    Idle,
    Decoding,
    AppliedOptimistically,
    Confirmed,
    RolledBack,
}

impl fmt::Display for MovePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Decoding => "decoding",
            Self::AppliedOptimistically => "applied_optimistically",
            Self::Confirmed => "confirmed",
            Self::RolledBack => "rolled_back",
        })
    }
}

/// Handle of a dispatched move, used to report its gateway result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveTicket(u64);

impl fmt::Display for MoveTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move#{}", self.0)
    }
}

/// Why a drop was not treated as a move. None of these are shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    NoDestination,
    MalformedId,
    UnknownItem,
    /// The item already has a move awaiting the backend.
    InFlight,
    OutsideWeek,
    UnknownAssignee,
}

/// A move applied locally and waiting to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSync {
    pub ticket: MoveTicket,
    pub request: AssignRequest,
}

/// Immediate result of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored(IgnoreReason),
    /// Dropped where it already was.
    NoChange,
    NotAllowed(Notification),
    Dispatched(PendingSync),
}

/// Result of reporting a gateway reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed {
        work_item: WorkItemId,
    },
    /// Local change undone; `refetch` should be loaded to resync with the backend.
    RolledBack {
        work_item: WorkItemId,
        error: GatewayError,
        refetch: WeekQuery,
    },
    /// No move is waiting on this ticket.
    Stale,
}

/// The user-visible outcome of one drag, as reported by
/// [`ReconciliationController::sync_drop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    Succeeded,
    Undone,
    NotAllowed,
    /// Not a move at all; nothing was shown.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Toast to be shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub work_item: Option<WorkItemId>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct InFlightMove {
    ticket: MoveTicket,
    intent: MoveIntent,
    snapshot: StoreSnapshot,
    /// Window epoch when the move was applied.
    epoch: u64,
}

/// Owns the assignment store of the visible week and every move on it.
#[derive(Debug, Clone)]
pub struct ReconciliationController {
    config: ProjectConfig,
    week: WeekRange,
    assignee_filter: Option<Vec<AssigneeId>>,
    catalog: BoardCatalog,
    store: AssignmentStore,
    in_flight: BTreeMap<WorkItemId, InFlightMove>,
    next_ticket: u64,
    /// Bumped whenever the window is reloaded or the week changes.
    epoch: u64,
    notifications: Vec<Notification>,
    pending_refetch: Option<WeekQuery>,
}

impl ReconciliationController {
    /// Empty board showing `week`. Call [`Self::load_week`] with the fetched window.
    #[must_use]
    pub fn new(config: ProjectConfig, week: WeekRange) -> Self {
        Self {
            config,
            week,
            assignee_filter: None,
            catalog: BoardCatalog::default(),
            store: AssignmentStore::new(),
            in_flight: BTreeMap::new(),
            next_ticket: 0,
            epoch: 0,
            notifications: Vec::new(),
            pending_refetch: None,
        }
    }

    /// Board for the week containing `today`, configured from resolved config.
    #[must_use]
    pub fn from_config(config: &EffectiveConfig, today: NaiveDate) -> Self {
        let week = WeekRange::containing(today, config.project.board.include_weekends);
        let mut controller = Self::new(config.project.clone(), week);
        controller.assignee_filter = config.assignee_filter();
        controller
    }

    #[must_use]
    pub const fn week(&self) -> WeekRange {
        self.week
    }

    #[must_use]
    pub const fn store(&self) -> &AssignmentStore {
        &self.store
    }

    #[must_use]
    pub const fn catalog(&self) -> &BoardCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn projection(&self) -> GridProjection<'_> {
        GridProjection::new(&self.store, &self.catalog, self.week)
    }

    /// Query for the visible week.
    #[must_use]
    pub fn week_query(&self) -> WeekQuery {
        WeekQuery::for_range(&self.week, self.assignee_filter.clone())
    }

    /// Switch the visible week and return the query to fetch it.
    ///
    /// The board is empty until the fetched window is loaded.
    pub fn navigate(&mut self, direction: Navigate, today: NaiveDate) -> WeekQuery {
        self.week = self.week.navigate(direction, today);
        self.catalog = BoardCatalog::default();
        self.store.load(std::iter::empty());
        self.epoch += 1;
        self.pending_refetch = None;
        debug!(start = %self.week.start(), "navigated to week");
        self.week_query()
    }

    /// Replace the board contents with a freshly fetched window.
    pub fn load_week(&mut self, window: &WeekWindow) {
        self.catalog = BoardCatalog::from_window(window);
        self.store.load(window.placements());
        self.epoch += 1;
        self.pending_refetch = None;
        debug!(
            start = %self.week.start(),
            items = self.store.len(),
            assignees = self.catalog.assignees().len(),
            "week loaded"
        );
    }

    /// Re-fetch requested by the last rollback, if not yet loaded.
    pub fn take_refetch(&mut self) -> Option<WeekQuery> {
        self.pending_refetch.take()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Cards with a move awaiting the backend must not be draggable.
    #[must_use]
    pub fn is_draggable(&self, id: WorkItemId) -> bool {
        self.store.contains(id) && !self.in_flight.contains_key(&id)
    }

    /// Phase of the move on `id`.
    ///
    /// Decoding, confirmation and rollback complete within a single call, so
    /// only `AppliedOptimistically` and `Idle` are ever observed here.
    #[must_use]
    pub fn move_phase(&self, id: WorkItemId) -> MovePhase {
        if self.in_flight.contains_key(&id) {
            MovePhase::AppliedOptimistically
        } else {
            MovePhase::Idle
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Handle the end of a drag: decode, validate and apply optimistically.
    pub fn drag_end(&mut self, event: &DragEnd) -> DropOutcome {
        let Some(destination) = event.destination.as_deref() else {
            return DropOutcome::Ignored(IgnoreReason::NoDestination);
        };

        debug!(phase = %MovePhase::Decoding, draggable = %event.draggable, "drag ended");
        let intent = match dnd::decode(&event.source, destination, &event.draggable) {
            Ok(intent) if intent.kind == self.config.board.item_kind => intent,
            Ok(intent) => {
                debug!(kind = %intent.kind, "ignoring drop of foreign item kind");
                return DropOutcome::Ignored(IgnoreReason::MalformedId);
            }
            Err(err) => {
                debug!(error = %err, "ignoring malformed drop");
                return DropOutcome::Ignored(IgnoreReason::MalformedId);
            }
        };

        if intent.is_same_slot() {
            return DropOutcome::NoChange;
        }
        if self.in_flight.contains_key(&intent.work_item) {
            debug!(work_item = intent.work_item, "item already has a move in flight");
            return DropOutcome::Ignored(IgnoreReason::InFlight);
        }
        let current = match self.store.get(intent.work_item) {
            Ok(slot) => slot,
            Err(err) => {
                debug!(error = %err, "ignoring drop of unknown item");
                return DropOutcome::Ignored(IgnoreReason::UnknownItem);
            }
        };
        if let Err(err) = apply::validate(&intent) {
            debug!(error = %err, work_item = intent.work_item, "move not allowed");
            let message = self.config.messages.unassign_hint.clone();
            return DropOutcome::NotAllowed(self.notify(
                NotificationLevel::Info,
                message,
                intent.work_item,
            ));
        }
        if let ScheduleSlot::Scheduled { assignee, date } = intent.to {
            if !self.week.contains(date) {
                return DropOutcome::Ignored(IgnoreReason::OutsideWeek);
            }
            if self.catalog.assignee(assignee).is_none() {
                return DropOutcome::Ignored(IgnoreReason::UnknownAssignee);
            }
        }
        if current == intent.to {
            return DropOutcome::NoChange;
        }

        self.dispatch(intent)
    }

    fn dispatch(&mut self, intent: MoveIntent) -> DropOutcome {
        let ScheduleSlot::Scheduled { assignee, date } = intent.to else {
            return DropOutcome::Ignored(IgnoreReason::MalformedId);
        };
        let snapshot = self.store.snapshot();
        match apply::apply(&mut self.store, &intent) {
            Ok(true) => {}
            Ok(false) => return DropOutcome::NoChange,
            Err(PlanningError::Store(_)) => {
                return DropOutcome::Ignored(IgnoreReason::UnknownItem);
            }
            Err(err) => {
                warn!(error = %err, code = %err.code(), "unexpected apply failure");
                return DropOutcome::Ignored(IgnoreReason::MalformedId);
            }
        }

        let ticket = MoveTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight.insert(
            intent.work_item,
            InFlightMove {
                ticket,
                intent,
                snapshot,
                epoch: self.epoch,
            },
        );
        debug!(%ticket, %intent, phase = %MovePhase::AppliedOptimistically, "move dispatched");

        DropOutcome::Dispatched(PendingSync {
            ticket,
            request: AssignRequest {
                work_item: intent.work_item,
                assignee_id: assignee,
                date,
            },
        })
    }

    /// Report the backend's answer for a dispatched move.
    pub fn resolve(&mut self, ticket: MoveTicket, result: Result<(), GatewayError>) -> Resolution {
        let Some(work_item) = self
            .in_flight
            .iter()
            .find(|(_, pending)| pending.ticket == ticket)
            .map(|(id, _)| *id)
        else {
            warn!(%ticket, "gateway reply for unknown move");
            return Resolution::Stale;
        };
        let Some(pending) = self.in_flight.remove(&work_item) else {
            return Resolution::Stale;
        };

        match result {
            Ok(()) => {
                self.settle_confirmed(&pending);
                info!(%ticket, intent = %pending.intent, phase = %MovePhase::Confirmed, "move confirmed");
                let message = self.config.messages.moved.clone();
                self.notify(NotificationLevel::Success, message, work_item);
                debug!(%ticket, phase = %MovePhase::Idle, "move finished");
                Resolution::Confirmed { work_item }
            }
            Err(error) => {
                self.roll_back(&pending);
                warn!(
                    %ticket,
                    intent = %pending.intent,
                    error = %error,
                    code = %PlanningError::from(error.clone()).code(),
                    phase = %MovePhase::RolledBack,
                    "move rolled back"
                );
                let message = self.config.messages.move_failed.clone();
                self.notify(NotificationLevel::Error, message, work_item);
                let refetch = self.week_query();
                self.pending_refetch = Some(refetch.clone());
                debug!(%ticket, phase = %MovePhase::Idle, "move finished");
                Resolution::RolledBack {
                    work_item,
                    error,
                    refetch,
                }
            }
        }
    }

    /// Make sure a confirmed move is visible.
    ///
    /// A reload that landed while the move was pending may have brought back
    /// the pre-move placement; the backend has now accepted the move, so it is
    /// applied again.
    fn settle_confirmed(&mut self, pending: &InFlightMove) {
        if pending.epoch == self.epoch {
            return;
        }
        let work_item = pending.intent.work_item;
        if self.store.contains(work_item) {
            debug!(work_item, "window reloaded since move; re-applying confirmed move");
            self.store.set(work_item, pending.intent.to);
        }
    }

    /// Undo the local effect of `pending`.
    ///
    /// When nothing else touched the store since the snapshot, the snapshot is
    /// restored wholesale; otherwise only this item is put back, keeping other
    /// moves that landed in between. After a reload the local state already
    /// came from the backend and is left alone; the re-fetch settles it.
    fn roll_back(&mut self, pending: &InFlightMove) {
        if pending.epoch != self.epoch {
            debug!(
                work_item = pending.intent.work_item,
                "window reloaded since move; skipping local restore"
            );
            return;
        }
        if self.store.generation() == pending.snapshot.generation() + 1 {
            self.store.replace(pending.snapshot.clone());
        } else {
            self.store
                .restore_item(&pending.snapshot, pending.intent.work_item);
        }
    }

    fn notify(
        &mut self,
        level: NotificationLevel,
        message: String,
        work_item: WorkItemId,
    ) -> Notification {
        let notification = Notification {
            level,
            message,
            work_item: Some(work_item),
        };
        self.notifications.push(notification.clone());
        notification
    }

    // -----------------------------------------------------------------------
    // Blocking drivers
    // -----------------------------------------------------------------------

    /// Fetch and load the visible week.
    ///
    /// # Errors
    ///
    /// The gateway error; the board is left unchanged.
    pub fn refresh<G: PlanningGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
    ) -> Result<(), GatewayError> {
        let window = gateway.fetch_week(&self.week_query())?;
        self.load_week(&window);
        Ok(())
    }

    /// Run one drop end-to-end against a blocking gateway, including the
    /// re-fetch after a rollback.
    pub fn sync_drop<G: PlanningGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        event: &DragEnd,
    ) -> MoveOutcome {
        let pending = match self.drag_end(event) {
            DropOutcome::Dispatched(pending) => pending,
            DropOutcome::NotAllowed(_) => return MoveOutcome::NotAllowed,
            DropOutcome::Ignored(_) | DropOutcome::NoChange => return MoveOutcome::Unchanged,
        };

        let result = gateway.assign_move(&pending.request);
        match self.resolve(pending.ticket, result) {
            Resolution::Confirmed { .. } => MoveOutcome::Succeeded,
            Resolution::RolledBack { refetch, .. } => {
                match gateway.fetch_week(&refetch) {
                    Ok(window) => self.load_week(&window),
                    Err(err) => warn!(error = %err, "re-fetch after rollback failed"),
                }
                MoveOutcome::Undone
            }
            Resolution::Stale => MoveOutcome::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScheduledItem;
    use crate::model::{Assignee, WorkItem};

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date")
    }

    fn board() -> ReconciliationController {
        let mut controller = ReconciliationController::new(
            ProjectConfig::default(),
            WeekRange::containing(march(4), false),
        );
        controller.load_week(&WeekWindow {
            assignees: vec![Assignee::new(7, "Marta"), Assignee::new(9, "Julio")],
            absences: vec![],
            scheduled: vec![ScheduledItem {
                work_item: WorkItem::new(41, "Poda"),
                assignee_id: 7,
                date: march(4),
            }],
            unassigned: vec![WorkItem::new(42, "Bache"), WorkItem::new(43, "Luminaria")],
        });
        controller
    }

    fn dispatched(outcome: DropOutcome) -> PendingSync {
        match outcome {
            DropOutcome::Dispatched(pending) => pending,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn drop_without_destination_is_ignored() {
        let mut controller = board();
        let event = DragEnd {
            source: "unassigned".to_string(),
            destination: None,
            draggable: "reclamo-42".to_string(),
        };
        assert_eq!(
            controller.drag_end(&event),
            DropOutcome::Ignored(IgnoreReason::NoDestination)
        );
    }

    #[test]
    fn malformed_drop_is_silent() {
        let mut controller = board();
        let before = controller.store().snapshot();
        let outcome = controller.drag_end(&DragEnd::new("unassigned", "celda-7", "reclamo-42"));
        assert_eq!(outcome, DropOutcome::Ignored(IgnoreReason::MalformedId));
        assert!(controller.drain_notifications().is_empty());
        assert_eq!(controller.store().snapshot(), before);
    }

    #[test]
    fn in_flight_item_cannot_be_dragged_again() {
        let mut controller = board();
        let pending = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42")),
        );
        assert!(!controller.is_draggable(42));
        assert_eq!(controller.move_phase(42), MovePhase::AppliedOptimistically);
        assert_eq!(
            controller.drag_end(&DragEnd::new(
                "assignee-7-2024-03-05",
                "assignee-9-2024-03-06",
                "reclamo-42"
            )),
            DropOutcome::Ignored(IgnoreReason::InFlight)
        );

        assert!(matches!(
            controller.resolve(pending.ticket, Ok(())),
            Resolution::Confirmed { work_item: 42 }
        ));
        assert!(controller.is_draggable(42));
        assert_eq!(controller.move_phase(42), MovePhase::Idle);
    }

    #[test]
    fn pool_target_surfaces_info_message() {
        let mut controller = board();
        let outcome =
            controller.drag_end(&DragEnd::new("assignee-7-2024-03-04", "unassigned", "reclamo-41"));
        let DropOutcome::NotAllowed(notification) = outcome else {
            panic!("expected NotAllowed");
        };
        assert_eq!(notification.level, NotificationLevel::Info);
        assert_eq!(controller.store().get(41), Ok(ScheduleSlot::scheduled(7, march(4))));
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[test]
    fn drops_outside_week_or_on_unknown_staff_are_ignored() {
        let mut controller = board();
        assert_eq!(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-11", "reclamo-42")),
            DropOutcome::Ignored(IgnoreReason::OutsideWeek)
        );
        assert_eq!(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-8-2024-03-05", "reclamo-42")),
            DropOutcome::Ignored(IgnoreReason::UnknownAssignee)
        );
        assert_eq!(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-99")),
            DropOutcome::Ignored(IgnoreReason::UnknownItem)
        );
    }

    #[test]
    fn stale_source_onto_current_slot_is_no_change() {
        let mut controller = board();
        assert_eq!(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-04", "reclamo-41")),
            DropOutcome::NoChange
        );
    }

    #[test]
    fn out_of_order_failure_keeps_later_move() {
        let mut controller = board();
        let first = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42")),
        );
        let second = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-9-2024-03-06", "reclamo-43")),
        );

        let resolution = controller.resolve(first.ticket, Err(GatewayError::Timeout));
        assert!(matches!(resolution, Resolution::RolledBack { work_item: 42, .. }));
        assert_eq!(controller.store().get(42), Ok(ScheduleSlot::Unassigned));
        assert_eq!(
            controller.store().get(43),
            Ok(ScheduleSlot::scheduled(9, march(6)))
        );
        assert!(controller.take_refetch().is_some());

        assert!(matches!(
            controller.resolve(second.ticket, Ok(())),
            Resolution::Confirmed { work_item: 43 }
        ));
        assert_eq!(controller.resolve(second.ticket, Ok(())), Resolution::Stale);
    }

    #[test]
    fn pool_to_pool_drop_is_no_change_without_message() {
        let mut controller = board();
        let before = controller.store().snapshot();
        assert_eq!(
            controller.drag_end(&DragEnd::new("unassigned", "unassigned", "reclamo-42")),
            DropOutcome::NoChange
        );
        assert_eq!(controller.store().snapshot(), before);
        assert!(controller.drain_notifications().is_empty());
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[test]
    fn confirmation_after_reload_restores_the_move() {
        let mut controller = board();
        let pending = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42")),
        );

        // Reload returns the window as it was before the backend applied the move.
        controller.load_week(&WeekWindow {
            assignees: vec![Assignee::new(7, "Marta"), Assignee::new(9, "Julio")],
            absences: vec![],
            scheduled: vec![],
            unassigned: vec![WorkItem::new(42, "Bache")],
        });
        assert_eq!(controller.store().get(42), Ok(ScheduleSlot::Unassigned));

        assert_eq!(
            controller.resolve(pending.ticket, Ok(())),
            Resolution::Confirmed { work_item: 42 }
        );
        assert_eq!(
            controller.store().get(42),
            Ok(ScheduleSlot::scheduled(7, march(5)))
        );
        assert_eq!(controller.move_phase(42), MovePhase::Idle);
        assert!(controller.projection().coverage_violations().is_empty());
    }

    #[test]
    fn confirmation_after_reload_skips_items_no_longer_loaded() {
        let mut controller = board();
        let pending = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42")),
        );
        controller.load_week(&WeekWindow::default());

        assert_eq!(
            controller.resolve(pending.ticket, Ok(())),
            Resolution::Confirmed { work_item: 42 }
        );
        assert!(controller.store().is_empty());
    }

    #[test]
    fn from_config_applies_filter_and_weekends() {
        let mut config = EffectiveConfig::default();
        config.project.board.include_weekends = true;
        config.user.assignee_filter = vec![7, 9];

        let controller = ReconciliationController::from_config(&config, march(6));
        let query = controller.week_query();
        assert_eq!(query.range_start, march(4));
        assert_eq!(query.range_end, march(10));
        assert_eq!(query.assignee_filter, Some(vec![7, 9]));
        assert_eq!(controller.week().day_count(), 7);

        let unfiltered = ReconciliationController::from_config(&EffectiveConfig::default(), march(6));
        assert_eq!(unfiltered.week_query().range_end, march(8));
        assert_eq!(unfiltered.week_query().assignee_filter, None);
    }

    #[test]
    fn configured_messages_reach_notifications() {
        let mut config = EffectiveConfig::default();
        config.project.messages.moved = "Reclamo asignado".to_string();
        let mut controller = ReconciliationController::from_config(&config, march(4));
        controller.load_week(&WeekWindow {
            assignees: vec![Assignee::new(7, "Marta")],
            absences: vec![],
            scheduled: vec![],
            unassigned: vec![WorkItem::new(42, "Bache")],
        });

        let pending = dispatched(
            controller.drag_end(&DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42")),
        );
        controller.resolve(pending.ticket, Ok(()));
        let notifications = controller.drain_notifications();
        assert_eq!(notifications[0].message, "Reclamo asignado");
    }

    #[test]
    fn navigation_clears_board_until_loaded() {
        let mut controller = board();
        let query = controller.navigate(Navigate::Next, march(4));
        assert_eq!(query.range_start, march(11));
        assert_eq!(query.range_end, march(15));
        assert!(controller.store().is_empty());
        assert!(controller.projection().unassigned_pool().is_empty());
    }
}
