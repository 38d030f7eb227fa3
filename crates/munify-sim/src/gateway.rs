//! Fault-injecting stand-in for the planning backend.
//!
//! By default the server applies an accepted assignment as soon as it is
//! dispatched; only the reply travels through the simulated network, so
//! replies may arrive late and out of order. Failures can optionally still leave their effect on
//! the server ("partial effect"), which only a re-fetch can reveal.
//!
//! With `deferred_effect_percent`, an accepted assignment reaches server truth
//! only when its reply is delivered, so a reload can overtake a pending move.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use munify_core::controller::MoveTicket;
use munify_core::gateway::{AssignRequest, PlanningGateway, ScheduledItem, WeekQuery, WeekWindow};
use munify_core::model::{ScheduleSlot, WorkItem, WorkItemId};
use munify_core::GatewayError;

use crate::rng::DeterministicRng;

/// Fault injection knobs, all in percent unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Maximum reply delay in rounds.
    pub max_delay_rounds: u8,
    /// Assignments rejected by the server.
    pub reject_rate_percent: u8,
    /// Assignments whose reply times out.
    pub timeout_rate_percent: u8,
    /// Share of failed assignments that still took effect on the server.
    pub partial_effect_percent: u8,
    /// Chance of reversing the order of replies ready in the same round.
    pub reorder_rate_percent: u8,
    /// Week fetches that fail.
    pub fetch_failure_percent: u8,
    /// Assignments applied to server truth only when their reply is delivered.
    pub deferred_effect_percent: u8,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            max_delay_rounds: 3,
            reject_rate_percent: 10,
            timeout_rate_percent: 5,
            partial_effect_percent: 20,
            reorder_rate_percent: 20,
            fetch_failure_percent: 10,
            deferred_effect_percent: 30,
        }
    }
}

impl FaultConfig {
    /// No faults at all: every call succeeds immediately.
    #[must_use]
    pub const fn calm() -> Self {
        Self {
            max_delay_rounds: 0,
            reject_rate_percent: 0,
            timeout_rate_percent: 0,
            partial_effect_percent: 0,
            reorder_rate_percent: 0,
            fetch_failure_percent: 0,
            deferred_effect_percent: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingReply {
    deliver_at_round: u64,
    ticket: MoveTicket,
    result: Result<(), GatewayError>,
    /// Server-side write still to happen on delivery.
    deferred: Option<AssignRequest>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStats {
    pub assigns: u64,
    pub rejected: u64,
    pub timed_out: u64,
    pub partial_effects: u64,
    pub deferred_effects: u64,
    pub fetches: u64,
    pub failed_fetches: u64,
}

/// Server truth plus a queue of delayed replies.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    window: WeekWindow,
    items: BTreeMap<WorkItemId, WorkItem>,
    truth: BTreeMap<WorkItemId, ScheduleSlot>,
    pending: Vec<PendingReply>,
    fault: FaultConfig,
    rng: DeterministicRng,
    stats: GatewayStats,
}

impl SimulatedGateway {
    /// Seed the server with `window` as its initial truth.
    #[must_use]
    pub fn new(window: WeekWindow, fault: FaultConfig, rng: DeterministicRng) -> Self {
        let items = window
            .scheduled
            .iter()
            .map(|entry| &entry.work_item)
            .chain(window.unassigned.iter())
            .map(|item| (item.id, item.clone()))
            .collect();
        let truth = window.placements().collect();
        Self {
            window,
            items,
            truth,
            pending: Vec::new(),
            fault,
            rng,
            stats: GatewayStats::default(),
        }
    }

    #[must_use]
    pub const fn fault_config(&self) -> FaultConfig {
        self.fault
    }

    pub const fn set_fault_config(&mut self, fault: FaultConfig) {
        self.fault = fault;
    }

    #[must_use]
    pub const fn stats(&self) -> GatewayStats {
        self.stats
    }

    #[must_use]
    pub const fn truth(&self) -> &BTreeMap<WorkItemId, ScheduleSlot> {
        &self.truth
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Process `request` now and queue its reply for a later round.
    pub fn dispatch(&mut self, ticket: MoveTicket, request: AssignRequest, round: u64) {
        let (result, takes_effect) = self.decide();
        let deferred = if takes_effect
            && self.rng.hit_rate_percent(self.fault.deferred_effect_percent)
        {
            self.stats.deferred_effects += 1;
            Some(request)
        } else {
            if takes_effect {
                self.apply_effect(&request);
            }
            None
        };
        let delay = self
            .rng
            .next_bounded(u64::from(self.fault.max_delay_rounds).saturating_add(1));
        self.pending.push(PendingReply {
            deliver_at_round: round.saturating_add(delay),
            ticket,
            result,
            deferred,
        });
    }

    /// Replies whose delivery round has arrived.
    pub fn deliver_ready(&mut self, round: u64) -> Vec<(MoveTicket, Result<(), GatewayError>)> {
        let (ready, future): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|reply| reply.deliver_at_round <= round);
        self.pending = future;

        let mut ready = ready;
        if ready.len() > 1 && self.rng.hit_rate_percent(self.fault.reorder_rate_percent) {
            ready.reverse();
        }
        ready
            .into_iter()
            .map(|reply| {
                if let Some(request) = &reply.deferred {
                    self.apply_effect(request);
                }
                (reply.ticket, reply.result)
            })
            .collect()
    }

    /// Server truth restricted to what `query` lets the board see.
    #[must_use]
    pub fn visible_truth(&self, query: &WeekQuery) -> BTreeMap<WorkItemId, ScheduleSlot> {
        self.truth
            .iter()
            .filter(|(_, slot)| match (slot.assignee(), &query.assignee_filter) {
                (Some(assignee), Some(filter)) => filter.contains(&assignee),
                _ => true,
            })
            .map(|(id, slot)| (*id, *slot))
            .collect()
    }

    /// Current server truth as a week window.
    #[must_use]
    pub fn snapshot_window(&self) -> WeekWindow {
        let mut scheduled = Vec::new();
        let mut unassigned = Vec::new();
        for (id, slot) in &self.truth {
            let Some(item) = self.items.get(id) else {
                continue;
            };
            match slot {
                ScheduleSlot::Unassigned => unassigned.push(item.clone()),
                ScheduleSlot::Scheduled { assignee, date } => scheduled.push(ScheduledItem {
                    work_item: item.clone(),
                    assignee_id: *assignee,
                    date: *date,
                }),
            }
        }
        WeekWindow {
            assignees: self.window.assignees.clone(),
            absences: self.window.absences.clone(),
            scheduled,
            unassigned,
        }
    }

    /// Whether the next assignment fails and whether it still changes truth.
    fn decide(&mut self) -> (Result<(), GatewayError>, bool) {
        self.stats.assigns += 1;
        let failure = if self.rng.hit_rate_percent(self.fault.reject_rate_percent) {
            self.stats.rejected += 1;
            Some(GatewayError::Rejected {
                status: 409,
                reason: "assignment conflict".to_string(),
            })
        } else if self.rng.hit_rate_percent(self.fault.timeout_rate_percent) {
            self.stats.timed_out += 1;
            Some(GatewayError::Timeout)
        } else {
            None
        };

        let takes_effect = match failure {
            None => true,
            Some(_) => {
                let partial = self.rng.hit_rate_percent(self.fault.partial_effect_percent);
                if partial {
                    self.stats.partial_effects += 1;
                }
                partial
            }
        };

        (failure.map_or(Ok(()), Err), takes_effect)
    }

    fn apply_effect(&mut self, request: &AssignRequest) {
        if let Some(slot) = self.truth.get_mut(&request.work_item) {
            *slot = ScheduleSlot::scheduled(request.assignee_id, request.date);
        }
    }
}

impl PlanningGateway for SimulatedGateway {
    fn fetch_week(&mut self, query: &WeekQuery) -> Result<WeekWindow, GatewayError> {
        self.stats.fetches += 1;
        if self.rng.hit_rate_percent(self.fault.fetch_failure_percent) {
            self.stats.failed_fetches += 1;
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        let mut window = self.snapshot_window();
        if let Some(filter) = &query.assignee_filter {
            // Items scheduled on hidden assignees are dropped, not moved to the pool.
            window.assignees.retain(|assignee| filter.contains(&assignee.id));
            window
                .scheduled
                .retain(|entry| filter.contains(&entry.assignee_id));
        }
        Ok(window)
    }

    fn assign_move(&mut self, request: &AssignRequest) -> Result<(), GatewayError> {
        let (result, takes_effect) = self.decide();
        if takes_effect {
            self.apply_effect(request);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use munify_core::model::Assignee;

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date")
    }

    fn window() -> WeekWindow {
        WeekWindow {
            assignees: vec![Assignee::new(7, "Marta")],
            absences: vec![],
            scheduled: vec![],
            unassigned: vec![WorkItem::new(42, "Bache")],
        }
    }

    fn query() -> WeekQuery {
        WeekQuery {
            range_start: march(4),
            range_end: march(8),
            assignee_filter: None,
        }
    }

    #[test]
    fn calm_gateway_applies_assignments() {
        let mut gateway =
            SimulatedGateway::new(window(), FaultConfig::calm(), DeterministicRng::new(1));
        let request = AssignRequest {
            work_item: 42,
            assignee_id: 7,
            date: march(4),
        };
        assert_eq!(gateway.assign_move(&request), Ok(()));
        assert_eq!(
            gateway.truth().get(&42),
            Some(&ScheduleSlot::scheduled(7, march(4)))
        );

        let fetched = gateway.fetch_week(&query()).expect("calm fetch");
        assert_eq!(fetched.scheduled.len(), 1);
        assert!(fetched.unassigned.is_empty());
    }

    #[test]
    fn rejecting_gateway_leaves_truth_alone() {
        let fault = FaultConfig {
            reject_rate_percent: 100,
            ..FaultConfig::calm()
        };
        let mut gateway = SimulatedGateway::new(window(), fault, DeterministicRng::new(1));
        let request = AssignRequest {
            work_item: 42,
            assignee_id: 7,
            date: march(4),
        };
        assert!(matches!(
            gateway.assign_move(&request),
            Err(GatewayError::Rejected { status: 409, .. })
        ));
        assert_eq!(gateway.truth().get(&42), Some(&ScheduleSlot::Unassigned));
        assert_eq!(gateway.stats().rejected, 1);
    }

    #[test]
    fn deferred_effect_lands_on_delivery() {
        let fault = FaultConfig {
            deferred_effect_percent: 100,
            max_delay_rounds: 0,
            ..FaultConfig::calm()
        };
        let mut gateway = SimulatedGateway::new(window(), fault, DeterministicRng::new(4));
        let mut controller = munify_core::ReconciliationController::new(
            munify_core::config::ProjectConfig::default(),
            munify_core::week::WeekRange::containing(march(4), false),
        );
        controller.load_week(&gateway.snapshot_window());
        let munify_core::DropOutcome::Dispatched(pending) = controller.drag_end(
            &munify_core::DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42"),
        ) else {
            panic!("move should dispatch");
        };

        gateway.dispatch(pending.ticket, pending.request, 0);
        assert_eq!(gateway.truth().get(&42), Some(&ScheduleSlot::Unassigned));

        // A reload before delivery still sees the pre-move state.
        controller.refresh(&mut gateway).expect("calm fetch");
        assert_eq!(controller.store().get(42), Ok(ScheduleSlot::Unassigned));

        for (ticket, result) in gateway.deliver_ready(0) {
            controller.resolve(ticket, result);
        }
        assert_eq!(
            gateway.truth().get(&42),
            Some(&ScheduleSlot::scheduled(7, march(5)))
        );
        assert_eq!(
            controller.store().get(42),
            Ok(ScheduleSlot::scheduled(7, march(5)))
        );
        assert_eq!(gateway.stats().deferred_effects, 1);
    }

    #[test]
    fn visible_truth_hides_filtered_assignees() {
        let mut gateway =
            SimulatedGateway::new(window(), FaultConfig::calm(), DeterministicRng::new(1));
        let request = AssignRequest {
            work_item: 42,
            assignee_id: 7,
            date: march(4),
        };
        gateway.assign_move(&request).expect("calm assign");
        let hidden = WeekQuery {
            assignee_filter: Some(vec![9]),
            ..query()
        };
        assert!(gateway.visible_truth(&hidden).is_empty());
        assert_eq!(gateway.visible_truth(&query()).len(), 1);
    }

    #[test]
    fn replies_wait_for_their_round() {
        let fault = FaultConfig {
            max_delay_rounds: 0,
            ..FaultConfig::calm()
        };
        let mut gateway = SimulatedGateway::new(window(), fault, DeterministicRng::new(9));
        let mut controller = munify_core::ReconciliationController::new(
            munify_core::config::ProjectConfig::default(),
            munify_core::week::WeekRange::containing(march(4), false),
        );
        controller.load_week(&gateway.snapshot_window());
        let munify_core::DropOutcome::Dispatched(pending) = controller.drag_end(
            &munify_core::DragEnd::new("unassigned", "assignee-7-2024-03-05", "reclamo-42"),
        ) else {
            panic!("move should dispatch");
        };

        gateway.dispatch(pending.ticket, pending.request, 5);
        assert!(gateway.deliver_ready(4).is_empty());
        let replies = gateway.deliver_ready(5);
        assert_eq!(replies, vec![(pending.ticket, Ok(()))]);
        assert_eq!(gateway.pending_len(), 0);
    }
}
