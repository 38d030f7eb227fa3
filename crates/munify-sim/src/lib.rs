//! munify-sim library.
//!
//! Deterministic simulation of a planning board talking to a flaky backend.
//! A seeded run generates a week, fires random drags (valid moves, drops into
//! the pool, same-slot drops, garbage ids, stale sources, dates outside the
//! week), delivers backend replies late and out of order, and checks the
//! board's invariants after every step.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod campaign;
pub mod fixture;
pub mod gateway;
pub mod oracle;
pub mod rng;

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use munify_core::config::EffectiveConfig;
use munify_core::controller::{DragEnd, DropOutcome, MoveTicket, ReconciliationController, Resolution};
use munify_core::dnd;
use munify_core::gateway::{PlanningGateway, WeekQuery};
use munify_core::model::{ScheduleSlot, WorkItemId};
use munify_core::GatewayError;

use crate::fixture::FixtureShape;
use crate::gateway::{FaultConfig, GatewayStats, SimulatedGateway};
use crate::oracle::{InvariantViolation, OracleResult, ReconciliationOracle};
use crate::rng::DeterministicRng;

const INITIAL_FETCH_ATTEMPTS: u32 = 16;

/// Ids the UI should never produce but the board must survive anyway.
const GARBAGE_IDS: [&str; 8] = [
    "",
    "assignee-",
    "assignee-x-2024-03-04",
    "assignee-101-2024-3-4",
    "assignee-101-2024-02-30",
    "unassigned ",
    "celda-7",
    "reclamo-",
];

/// Parameters of one simulated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    pub rounds: u64,
    pub max_drags_per_round: u8,
    /// Chance per round of an unprompted reload of the week.
    pub reload_rate_percent: u8,
    pub assignees: usize,
    pub items: usize,
    /// Resolved board configuration the simulated board runs with.
    pub planning: EffectiveConfig,
    /// Any day of the simulated week.
    pub week_of: NaiveDate,
    pub fault: FaultConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            rounds: 40,
            max_drags_per_round: 3,
            reload_rate_percent: 5,
            assignees: 4,
            items: 24,
            planning: EffectiveConfig::default(),
            week_of: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap_or_default(),
            fault: FaultConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns an error if the run could not do anything useful.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            bail!("rounds must be > 0");
        }
        if self.assignees == 0 {
            bail!("assignees must be > 0");
        }
        if self.items == 0 {
            bail!("items must be > 0");
        }
        Ok(())
    }
}

/// Why the board fetched the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchTrigger {
    Initial,
    Rollback,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    Drop {
        draggable: String,
        destination: Option<String>,
        outcome: String,
    },
    Dispatched {
        ticket: String,
        work_item: WorkItemId,
    },
    Resolved {
        ticket: String,
        outcome: String,
    },
    Fetch {
        trigger: FetchTrigger,
        ok: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub round: u64,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub drops: u64,
    pub dispatched: u64,
    pub confirmed: u64,
    pub rolled_back: u64,
    /// Rollbacks that happened while other moves were still in flight.
    pub interleaved_rollbacks: u64,
    pub not_allowed: u64,
    pub ignored: u64,
    pub no_change: u64,
    pub stale_replies: u64,
    pub failed_fetches: u64,
    pub notifications: u64,
    pub max_in_flight: usize,
    pub gateway: GatewayStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub trace: Vec<TraceEvent>,
    pub stats: SimulationStats,
    pub oracle: OracleResult,
    /// A rollback landed while another move was in flight.
    pub interesting_state_reached: bool,
}

impl SimulationResult {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.oracle.passed
    }
}

/// One seeded run of board plus backend.
pub struct Simulator {
    config: SimulationConfig,
    rng: DeterministicRng,
    gateway: SimulatedGateway,
    controller: ReconciliationController,
    /// Tickets the backend has not answered yet, by item.
    outstanding: BTreeMap<WorkItemId, MoveTicket>,
    refetch_due: Option<WeekQuery>,
    round: u64,
    trace: Vec<TraceEvent>,
    stats: SimulationStats,
    oracle: OracleResult,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = DeterministicRng::new(config.seed);
        let controller = ReconciliationController::from_config(&config.planning, config.week_of);
        let week = controller.week();
        let shape = FixtureShape {
            assignees: config.assignees,
            items: config.items,
        };
        let window = fixture::generate_week(shape, &week, &mut rng);
        let gateway = SimulatedGateway::new(window, config.fault, rng.fork());

        Ok(Self {
            config,
            rng,
            gateway,
            controller,
            outstanding: BTreeMap::new(),
            refetch_due: None,
            round: 0,
            trace: Vec::new(),
            stats: SimulationStats::default(),
            oracle: OracleResult::pass(),
        })
    }

    /// Run every round, drain the backend, then check convergence.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial week could never be fetched.
    pub fn run(&mut self) -> Result<SimulationResult> {
        info!(seed = self.config.seed, rounds = self.config.rounds, "simulation started");
        self.initial_load()?;

        for round in 0..self.config.rounds {
            self.round = round;
            self.deliver(round);
            self.retry_refetch();

            let drags = self
                .rng
                .next_bounded(u64::from(self.config.max_drags_per_round) + 1);
            for _ in 0..drags {
                self.drop_once();
            }

            if self.rng.hit_rate_percent(self.config.reload_rate_percent) {
                let query = self.controller.week_query();
                self.fetch(FetchTrigger::Reload, &query);
            }
            self.check_coverage();
            self.collect_notifications();
        }

        self.drain();

        let oracle = std::mem::take(&mut self.oracle)
            .merge(ReconciliationOracle::check_quiescent(
                self.controller.in_flight_count(),
                self.gateway.pending_len(),
            ))
            .merge(ReconciliationOracle::check_convergence(
                &self.controller.store().snapshot(),
                &self.gateway.visible_truth(&self.controller.week_query()),
            ));
        self.stats.gateway = self.gateway.stats();

        info!(
            seed = self.config.seed,
            passed = oracle.passed,
            dispatched = self.stats.dispatched,
            rolled_back = self.stats.rolled_back,
            "simulation finished"
        );

        Ok(SimulationResult {
            seed: self.config.seed,
            trace: std::mem::take(&mut self.trace),
            stats: self.stats,
            oracle,
            interesting_state_reached: self.stats.interleaved_rollbacks > 0,
        })
    }

    fn initial_load(&mut self) -> Result<()> {
        let query = self.controller.week_query();
        for _ in 0..INITIAL_FETCH_ATTEMPTS {
            if self.fetch(FetchTrigger::Initial, &query) {
                return Ok(());
            }
        }
        bail!("initial week fetch failed {INITIAL_FETCH_ATTEMPTS} times")
    }

    /// Quiet the backend, deliver every reply and settle pending re-fetches.
    fn drain(&mut self) {
        self.gateway.set_fault_config(FaultConfig::calm());
        self.round = self.config.rounds;
        self.deliver(u64::MAX);
        self.retry_refetch();
        self.check_coverage();
        self.collect_notifications();
    }

    fn record(&mut self, kind: TraceEventKind) {
        trace!(round = self.round, ?kind, "sim event");
        self.trace.push(TraceEvent {
            round: self.round,
            kind,
        });
    }

    fn deliver(&mut self, round: u64) {
        for (ticket, result) in self.gateway.deliver_ready(round) {
            self.resolve(ticket, result);
        }
    }

    fn resolve(&mut self, ticket: MoveTicket, result: Result<(), GatewayError>) {
        let others_in_flight = self.controller.in_flight_count().saturating_sub(1);
        let outcome = match self.controller.resolve(ticket, result) {
            Resolution::Confirmed { work_item } => {
                self.outstanding.remove(&work_item);
                self.stats.confirmed += 1;
                "confirmed"
            }
            Resolution::RolledBack {
                work_item, refetch, ..
            } => {
                self.outstanding.remove(&work_item);
                self.stats.rolled_back += 1;
                if others_in_flight > 0 {
                    self.stats.interleaved_rollbacks += 1;
                }
                self.refetch_due = Some(refetch);
                "rolled_back"
            }
            Resolution::Stale => {
                self.stats.stale_replies += 1;
                "stale"
            }
        };
        self.record(TraceEventKind::Resolved {
            ticket: ticket.to_string(),
            outcome: outcome.to_string(),
        });
        self.retry_refetch();
    }

    fn retry_refetch(&mut self) {
        if let Some(query) = self.refetch_due.clone() {
            if self.fetch(FetchTrigger::Rollback, &query) {
                self.refetch_due = None;
            }
        }
    }

    fn fetch(&mut self, trigger: FetchTrigger, query: &WeekQuery) -> bool {
        let ok = match self.gateway.fetch_week(query) {
            Ok(window) => {
                self.controller.load_week(&window);
                true
            }
            Err(err) => {
                debug!(error = %err, ?trigger, "week fetch failed");
                self.stats.failed_fetches += 1;
                false
            }
        };
        self.record(TraceEventKind::Fetch { trigger, ok });
        ok
    }

    fn drop_once(&mut self) {
        let event = self.random_drop();
        let before = self.controller.store().snapshot();
        let outcome = self.controller.drag_end(&event);
        self.stats.drops += 1;

        let label = match outcome {
            DropOutcome::Dispatched(pending) => {
                let work_item = pending.request.work_item;
                if self.outstanding.insert(work_item, pending.ticket).is_some() {
                    self.oracle.record(InvariantViolation::DoubleDispatch {
                        round: self.round,
                        work_item,
                    });
                }
                self.gateway
                    .dispatch(pending.ticket, pending.request, self.round);
                self.stats.dispatched += 1;
                self.stats.max_in_flight = self
                    .stats
                    .max_in_flight
                    .max(self.controller.in_flight_count());
                self.record(TraceEventKind::Dispatched {
                    ticket: pending.ticket.to_string(),
                    work_item,
                });
                "dispatched".to_string()
            }
            other => {
                let label = match &other {
                    DropOutcome::Ignored(reason) => {
                        self.stats.ignored += 1;
                        format!("ignored:{reason:?}")
                    }
                    DropOutcome::NoChange => {
                        self.stats.no_change += 1;
                        "no_change".to_string()
                    }
                    DropOutcome::NotAllowed(_) => {
                        self.stats.not_allowed += 1;
                        "not_allowed".to_string()
                    }
                    DropOutcome::Dispatched(_) => "dispatched".to_string(),
                };
                let after = self.controller.store().snapshot();
                let check = ReconciliationOracle::check_untouched(
                    self.round,
                    &event.draggable,
                    &before,
                    &after,
                );
                self.oracle = std::mem::take(&mut self.oracle).merge(check);
                label
            }
        };

        self.record(TraceEventKind::Drop {
            draggable: event.draggable,
            destination: event.destination,
            outcome: label,
        });
    }

    /// A drag the way a user (or a buggy renderer) might produce it.
    fn random_drop(&mut self) -> DragEnd {
        let week = self.controller.week();
        let days = week.days();
        let assignees: Vec<_> = self.controller.catalog().assignees().to_vec();
        let ids: Vec<WorkItemId> = self.controller.store().iter().map(|(id, _)| id).collect();

        let work_item = self.rng.pick(&ids).copied().unwrap_or_default();
        let current = self
            .controller
            .store()
            .get(work_item)
            .unwrap_or(ScheduleSlot::Unassigned);

        let draggable = if self.rng.hit_rate_percent(5) {
            self.garbage_id()
        } else {
            dnd::draggable_dom_id(self.config.planning.project.board.item_kind, work_item)
        };
        let source = if self.rng.hit_rate_percent(10) {
            fixture::pick_cell(&assignees, &days, &mut self.rng).map_or_else(
                || dnd::UNASSIGNED_ID.to_string(),
                |(assignee, date)| dnd::slot_dom_id(&ScheduleSlot::scheduled(assignee, date)),
            )
        } else {
            dnd::slot_dom_id(&current)
        };

        let destination = match self.rng.next_bounded(100) {
            0..=59 => fixture::pick_cell(&assignees, &days, &mut self.rng)
                .map(|(assignee, date)| dnd::slot_dom_id(&ScheduleSlot::scheduled(assignee, date))),
            60..=69 => Some(dnd::UNASSIGNED_ID.to_string()),
            70..=77 => Some(source.clone()),
            78..=85 => Some(self.garbage_id()),
            86..=90 => {
                let offset = i64::try_from(self.rng.next_bounded(7)).unwrap_or(0) + 1;
                let date = if self.rng.hit_rate_percent(50) {
                    week.start() - Duration::days(offset)
                } else {
                    week.end() + Duration::days(offset)
                };
                let assignee = self.rng.pick(&assignees).map_or(0, |staff| staff.id);
                Some(dnd::slot_dom_id(&ScheduleSlot::scheduled(assignee, date)))
            }
            91..=95 => Some(dnd::slot_dom_id(&ScheduleSlot::scheduled(
                self.rng.next_bounded(100),
                week.start(),
            ))),
            _ => None,
        };

        DragEnd {
            source,
            destination,
            draggable,
        }
    }

    fn garbage_id(&mut self) -> String {
        self.rng
            .pick(&GARBAGE_IDS)
            .copied()
            .unwrap_or_default()
            .to_string()
    }

    fn check_coverage(&mut self) {
        let violations = self.controller.projection().coverage_violations();
        let check = ReconciliationOracle::check_coverage(self.round, &violations);
        self.oracle = std::mem::take(&mut self.oracle).merge(check);
    }

    fn collect_notifications(&mut self) {
        let count = self.controller.drain_notifications().len();
        self.stats.notifications += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_board_is_rejected() {
        let config = SimulationConfig {
            items: 0,
            ..SimulationConfig::default()
        };
        assert!(Simulator::new(config).is_err());
    }

    #[test]
    fn calm_run_never_rolls_back() {
        let config = SimulationConfig {
            seed: 3,
            fault: FaultConfig::calm(),
            reload_rate_percent: 0,
            ..SimulationConfig::default()
        };
        let result = Simulator::new(config)
            .expect("valid config")
            .run()
            .expect("run completes");
        assert!(result.passed(), "{:?}", result.oracle.violations);
        assert_eq!(result.stats.rolled_back, 0);
        assert_eq!(result.stats.confirmed, result.stats.dispatched);
        assert!(!result.interesting_state_reached);
    }

    #[test]
    fn filtered_board_converges() {
        let mut planning = EffectiveConfig::default();
        planning.project.board.include_weekends = true;
        planning.user.assignee_filter = vec![100, 102];
        let config = SimulationConfig {
            seed: 21,
            reload_rate_percent: 10,
            planning,
            ..SimulationConfig::default()
        };
        let mut simulator = Simulator::new(config).expect("valid config");
        assert_eq!(simulator.controller.week().days().len(), 7);

        let result = simulator.run().expect("run completes");
        assert!(result.passed(), "{:?}", result.oracle.violations);
        let visible: Vec<_> = simulator
            .controller
            .catalog()
            .assignees()
            .iter()
            .map(|assignee| assignee.id)
            .collect();
        assert_eq!(visible, vec![100, 102]);
    }

    #[test]
    fn reloads_racing_deferred_writes_converge() {
        let config = SimulationConfig {
            seed: 5,
            reload_rate_percent: 40,
            fault: FaultConfig {
                deferred_effect_percent: 100,
                max_delay_rounds: 4,
                ..FaultConfig::calm()
            },
            ..SimulationConfig::default()
        };
        let result = Simulator::new(config)
            .expect("valid config")
            .run()
            .expect("run completes");
        assert!(result.passed(), "{:?}", result.oracle.violations);
        assert_eq!(result.stats.rolled_back, 0);
        assert_eq!(result.stats.gateway.deferred_effects, result.stats.dispatched);
    }

    #[test]
    fn unreachable_backend_fails_the_run() {
        let config = SimulationConfig {
            fault: FaultConfig {
                fetch_failure_percent: 100,
                ..FaultConfig::calm()
            },
            ..SimulationConfig::default()
        };
        let mut simulator = Simulator::new(config).expect("valid config");
        assert!(simulator.run().is_err());
    }
}
