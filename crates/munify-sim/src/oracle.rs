use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use munify_core::model::{ScheduleSlot, WorkItemId};
use munify_core::projection::CoverageViolation;
use munify_core::store::StoreSnapshot;

// ── Core result types ─────────────────────────────────────────────────────────

/// Outcome of one or more invariant checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn fail(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }

    pub fn record(&mut self, violation: InvariantViolation) {
        self.passed = false;
        self.violations.push(violation);
    }
}

impl Default for OracleResult {
    fn default() -> Self {
        Self::pass()
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvariantViolation {
    /// An item lost its placement, or a placement has no item.
    Coverage {
        round: u64,
        missing: Vec<WorkItemId>,
        orphans: Vec<WorkItemId>,
    },
    /// A second move was dispatched for an item whose first move was unresolved.
    DoubleDispatch { round: u64, work_item: WorkItemId },
    /// A drop that was not dispatched still changed the store.
    MutationWithoutMove { round: u64, draggable: String },
    /// After every reply and re-fetch, the board disagrees with the backend.
    Divergence {
        work_item: WorkItemId,
        local: Option<ScheduleSlot>,
        server: Option<ScheduleSlot>,
    },
    /// Moves or replies were still outstanding when the run ended.
    NotQuiescent { in_flight: usize, undelivered: usize },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coverage {
                round,
                missing,
                orphans,
            } => write!(
                f,
                "Coverage: round {round} (missing={missing:?}, orphans={orphans:?})"
            ),
            Self::DoubleDispatch { round, work_item } => write!(
                f,
                "DoubleDispatch: round {round} dispatched item {work_item} twice"
            ),
            Self::MutationWithoutMove { round, draggable } => write!(
                f,
                "MutationWithoutMove: round {round} drop of {draggable} changed the board"
            ),
            Self::Divergence {
                work_item,
                local,
                server,
            } => write!(
                f,
                "Divergence: item {work_item} is {} locally but {} on the server",
                describe(local.as_ref()),
                describe(server.as_ref())
            ),
            Self::NotQuiescent {
                in_flight,
                undelivered,
            } => write!(
                f,
                "NotQuiescent: {in_flight} moves in flight, {undelivered} replies undelivered"
            ),
        }
    }
}

fn describe(slot: Option<&ScheduleSlot>) -> String {
    slot.map_or_else(|| "absent".to_string(), ToString::to_string)
}

// ── Oracle ────────────────────────────────────────────────────────────────────

/// Invariant checks for a simulated planning board.
///
/// # Invariants checked
///
/// 1. **Coverage** (`check_coverage`): every item in exactly one bucket.
/// 2. **No silent mutation** (`check_untouched`): ignored, no-op and rejected
///    drops leave the store as it was.
/// 3. **Convergence** (`check_convergence`): once quiet, the board equals the
///    backend truth.
/// 4. **Quiescence** (`check_quiescent`): nothing left in flight.
pub struct ReconciliationOracle;

impl ReconciliationOracle {
    #[must_use]
    pub fn check_coverage(round: u64, violations: &[CoverageViolation]) -> OracleResult {
        if violations.is_empty() {
            return OracleResult::pass();
        }
        let mut missing = Vec::new();
        let mut orphans = Vec::new();
        for violation in violations {
            match violation {
                CoverageViolation::Missing(id) => missing.push(*id),
                CoverageViolation::Orphan(id) => orphans.push(*id),
            }
        }
        OracleResult::fail(vec![InvariantViolation::Coverage {
            round,
            missing,
            orphans,
        }])
    }

    #[must_use]
    pub fn check_untouched(
        round: u64,
        draggable: &str,
        before: &StoreSnapshot,
        after: &StoreSnapshot,
    ) -> OracleResult {
        if before == after {
            OracleResult::pass()
        } else {
            OracleResult::fail(vec![InvariantViolation::MutationWithoutMove {
                round,
                draggable: draggable.to_string(),
            }])
        }
    }

    /// Compare local placements against server truth, item by item.
    #[must_use]
    pub fn check_convergence(
        local: &StoreSnapshot,
        server: &BTreeMap<WorkItemId, ScheduleSlot>,
    ) -> OracleResult {
        let mut ids: Vec<WorkItemId> = local.placements().keys().copied().collect();
        ids.extend(server.keys().copied());
        ids.sort_unstable();
        ids.dedup();

        let violations = ids
            .into_iter()
            .filter_map(|work_item| {
                let local = local.slot_of(work_item);
                let server = server.get(&work_item).copied();
                (local != server).then_some(InvariantViolation::Divergence {
                    work_item,
                    local,
                    server,
                })
            })
            .collect();
        OracleResult::fail(violations)
    }

    #[must_use]
    pub fn check_quiescent(in_flight: usize, undelivered: usize) -> OracleResult {
        if in_flight == 0 && undelivered == 0 {
            OracleResult::pass()
        } else {
            OracleResult::fail(vec![InvariantViolation::NotQuiescent {
                in_flight,
                undelivered,
            }])
        }
    }
}
