//! Campaign runner for deterministic simulation campaigns.
//!
//! Executes many seeds with the same parameters, collecting pass/fail results
//! and identifying the first failing seed for replay.

use std::ops::Range;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gateway::FaultConfig;
use crate::{SimulationConfig, SimulationResult, Simulator};

/// Campaign-level configuration: which seeds to run and with what parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Range of seeds to execute, e.g., `0..100`.
    pub seed_range: Range<u64>,
    /// Parameters shared by every seed; the seed field is overwritten.
    pub simulation: SimulationConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            seed_range: 0..100,
            simulation: SimulationConfig::default(),
        }
    }
}

impl CampaignConfig {
    #[must_use]
    pub fn sim_config_for_seed(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            ..self.simulation.clone()
        }
    }

    #[must_use]
    pub const fn with_fault(mut self, fault: FaultConfig) -> Self {
        self.simulation.fault = fault;
        self
    }

    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.seed_range.is_empty() {
            bail!("seed_range must not be empty");
        }
        self.simulation.validate()
    }
}

/// Failure details for a single seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub seed: u64,
    pub violations: Vec<String>,
}

/// Aggregate report produced by a campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub seeds_run: usize,
    pub seeds_passed: usize,
    /// First seed that failed (for prioritized replay).
    pub first_failure: Option<u64>,
    pub failures: Vec<SeedFailure>,
    /// Seeds where a rollback landed while other moves were in flight.
    pub interesting_states_reached: usize,
    pub moves_dispatched: u64,
    pub moves_rolled_back: u64,
}

impl CampaignReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run a full campaign across all seeds in the config.
///
/// # Errors
///
/// Returns an error if config validation fails or a simulation could not run.
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.validate()?;

    let mut report = CampaignReport {
        seeds_run: 0,
        seeds_passed: 0,
        first_failure: None,
        failures: Vec::new(),
        interesting_states_reached: 0,
        moves_dispatched: 0,
        moves_rolled_back: 0,
    };

    for seed in config.seed_range.clone() {
        let result = run_single_seed(seed, config)?;
        report.seeds_run += 1;
        report.moves_dispatched += result.stats.dispatched;
        report.moves_rolled_back += result.stats.rolled_back;
        if result.interesting_state_reached {
            report.interesting_states_reached += 1;
        }

        if result.passed() {
            report.seeds_passed += 1;
        } else {
            warn!(seed, violations = result.oracle.violations.len(), "seed failed");
            report.first_failure.get_or_insert(seed);
            report.failures.push(SeedFailure {
                seed,
                violations: result
                    .oracle
                    .violations
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            });
        }
    }

    info!(
        seeds_run = report.seeds_run,
        seeds_passed = report.seeds_passed,
        "campaign finished"
    );
    Ok(report)
}

/// Run one seed with the campaign's parameters.
///
/// # Errors
///
/// Returns an error if the simulation itself could not run.
pub fn run_single_seed(seed: u64, config: &CampaignConfig) -> Result<SimulationResult> {
    let mut simulator = Simulator::new(config.sim_config_for_seed(seed))?;
    simulator.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_config_default_is_valid() {
        assert!(CampaignConfig::default().validate().is_ok());
    }

    #[test]
    fn campaign_config_empty_seed_range_rejected() {
        let config = CampaignConfig {
            seed_range: 5..5,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sim_config_for_seed_uses_correct_seed() {
        let config = CampaignConfig::default();
        let sim = config.sim_config_for_seed(42);
        assert_eq!(sim.seed, 42);
        assert_eq!(sim.rounds, config.simulation.rounds);
    }

    #[test]
    fn same_seed_replays_identically() {
        let config = CampaignConfig::default();
        let first = run_single_seed(7, &config).expect("sim should not error");
        let second = run_single_seed(7, &config).expect("sim should not error");
        assert_eq!(first, second);
    }

    #[test]
    fn run_campaign_all_seeds_pass() {
        let config = CampaignConfig {
            seed_range: 0..20,
            ..CampaignConfig::default()
        };
        let report = run_campaign(&config).expect("campaign should run");
        assert_eq!(report.seeds_run, 20);
        assert!(report.all_passed(), "failures: {:?}", report.failures);
        assert_eq!(report.first_failure, None);
        assert!(report.moves_dispatched > 0);
    }
}
