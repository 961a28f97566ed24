//! Campaign runner for deterministic gesture campaigns.
//!
//! Executes many seeds across configurable parameters, collecting pass/fail
//! results and identifying the first failing seed for replay.

use std::ops::Range;

use anyhow::{Result, bail};
use autoflow_core::config::{DragConfig, LayoutConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::oracle::{GestureOracle, InvariantViolation, OracleResult};
use crate::{SimulationConfig, SimulationResult, Simulator};

/// Campaign-level configuration controlling how many seeds to run and
/// what simulation parameters to use for each seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Range of seeds to execute, e.g., `0..100`.
    pub seed_range: Range<u64>,
    pub containers: usize,
    pub items: usize,
    /// Gestures per seed.
    pub gestures: usize,
    pub max_moves: usize,
    pub column_drag_percent: u8,
    pub cancel_percent: u8,
    pub outside_drop_percent: u8,
    pub stray_pointer_percent: u8,
    pub stale_percent: u8,
    /// Jitter threshold handed to every controller.
    pub min_move_distance: f64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let sim = SimulationConfig::default();
        Self {
            seed_range: 0..100,
            containers: sim.containers,
            items: sim.items,
            gestures: sim.gestures,
            max_moves: sim.max_moves,
            column_drag_percent: sim.column_drag_percent,
            cancel_percent: sim.cancel_percent,
            outside_drop_percent: sim.outside_drop_percent,
            stray_pointer_percent: sim.stray_pointer_percent,
            stale_percent: sim.stale_percent,
            min_move_distance: sim.drag.min_move_distance,
        }
    }
}

impl CampaignConfig {
    /// Build a [`SimulationConfig`] for a specific seed.
    #[must_use]
    pub fn sim_config_for_seed(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            containers: self.containers,
            items: self.items,
            gestures: self.gestures,
            max_moves: self.max_moves,
            column_drag_percent: self.column_drag_percent,
            cancel_percent: self.cancel_percent,
            outside_drop_percent: self.outside_drop_percent,
            stray_pointer_percent: self.stray_pointer_percent,
            stale_percent: self.stale_percent,
            drag: DragConfig {
                min_move_distance: self.min_move_distance,
                ..DragConfig::default()
            },
            layout: LayoutConfig::default(),
        }
    }

    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.seed_range.is_empty() {
            bail!("seed_range must not be empty");
        }
        self.sim_config_for_seed(self.seed_range.start).validate()
    }
}

/// Failure details for a single seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub seed: u64,
    /// Invariant violations found, formatted for humans.
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
    /// Seeds that hit a mid-drag external edit or a column move.
    pub interesting_states_reached: usize,
    /// Commits across every seed.
    pub total_commits: u64,
}

impl CampaignReport {
    /// True if every seed passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Detailed trace produced by replaying a single seed.
#[derive(Debug, Clone)]
pub struct DetailedTrace {
    pub result: SimulationResult,
    pub oracle: OracleResult,
}

/// Run a full campaign across all seeds in the config.
///
/// # Errors
///
/// Returns an error if config validation fails or a simulation encounters
/// an internal error.
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.validate()?;

    let mut seeds_run = 0_usize;
    let mut seeds_passed = 0_usize;
    let mut first_failure: Option<u64> = None;
    let mut failures = Vec::new();
    let mut interesting_states_reached = 0_usize;
    let mut total_commits = 0_u64;

    for seed in config.seed_range.clone() {
        seeds_run += 1;
        let trace = simulate(seed, config)?;
        if trace.result.interesting_state_reached {
            interesting_states_reached += 1;
        }
        total_commits += trace.result.commits;

        if trace.oracle.passed {
            seeds_passed += 1;
        } else {
            warn!(seed, violations = trace.oracle.violations.len(), "seed failed");
            first_failure.get_or_insert(seed);
            failures.push(SeedFailure {
                seed,
                violations: trace.oracle.violations.iter().map(format_violation).collect(),
            });
        }
    }

    Ok(CampaignReport {
        seeds_run,
        seeds_passed,
        first_failure,
        failures,
        interesting_states_reached,
        total_commits,
    })
}

/// Run a single seed and return Ok(()) on pass, Err(violations) on failure.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the simulation itself encounters an internal
/// error (invalid config, etc). The inner `Result` distinguishes pass from
/// invariant violations.
pub fn run_single_seed(
    seed: u64,
    config: &CampaignConfig,
) -> Result<std::result::Result<(), Vec<InvariantViolation>>> {
    let trace = simulate(seed, config)?;
    if trace.oracle.passed {
        Ok(Ok(()))
    } else {
        Ok(Err(trace.oracle.violations))
    }
}

/// Replay a single seed with full trace details for debugging.
///
/// # Errors
///
/// Returns an error when config validation or simulation fails.
pub fn replay_seed(seed: u64, config: &CampaignConfig) -> Result<DetailedTrace> {
    config.validate()?;
    simulate(seed, config)
}

fn simulate(seed: u64, config: &CampaignConfig) -> Result<DetailedTrace> {
    let mut simulator = Simulator::new(config.sim_config_for_seed(seed))?;
    let result = simulator.run()?;
    let oracle =
        GestureOracle::check_all(&result.gestures, &result.initial_board, &result.final_board);
    Ok(DetailedTrace { result, oracle })
}

/// Format an invariant violation into a human-readable string.
#[must_use]
pub fn format_violation(v: &InvariantViolation) -> String {
    match v {
        InvariantViolation::MultisetChanged {
            gesture,
            missing,
            extra,
        } => format!("MultisetChanged: gesture {gesture} (missing={missing:?}, extra={extra:?})"),
        InvariantViolation::ColumnSetChanged {
            gesture,
            before,
            after,
        } => format!("ColumnSetChanged: gesture {gesture} (before={before:?}, after={after:?})"),
        InvariantViolation::IndexOutOfBounds {
            gesture,
            container,
            index,
            len,
        } => {
            let scope = container.as_deref().unwrap_or("<board>");
            format!("IndexOutOfBounds: gesture {gesture} index {index} in {scope} (len={len})")
        }
        InvariantViolation::SecondSessionStarted { gesture, effect } => {
            format!("SecondSessionStarted: gesture {gesture} stray pointer-down gave {effect}")
        }
        InvariantViolation::SessionLeaked { gesture } => {
            format!("SessionLeaked: gesture {gesture} left the controller dragging")
        }
        InvariantViolation::CancelMutated { gesture, commits } => {
            format!("CancelMutated: gesture {gesture} changed the board (commits={commits})")
        }
        InvariantViolation::ReferenceMismatch {
            gesture,
            expected,
            actual,
        } => format!(
            "ReferenceMismatch: gesture {gesture} (expected={expected:?}, actual={actual:?})"
        ),
        InvariantViolation::CommitCountMismatch {
            gesture,
            commits,
            committed,
            changed,
        } => format!(
            "CommitCountMismatch: gesture {gesture} \
             (listener_calls={commits}, committed={committed}, board_changed={changed})"
        ),
        InvariantViolation::GlobalMultiset { missing, extra } => {
            format!("GlobalMultiset: run lost {missing:?} and gained {extra:?}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_config_default_is_valid() {
        let config = CampaignConfig::default();
        assert!(config.validate().is_ok());
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
    fn campaign_config_zero_gestures_rejected() {
        let config = CampaignConfig {
            gestures: 0,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn campaign_config_negative_jitter_rejected() {
        let config = CampaignConfig {
            min_move_distance: -1.0,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sim_config_for_seed_uses_correct_seed() {
        let config = CampaignConfig::default();
        let sim = config.sim_config_for_seed(42);
        assert_eq!(sim.seed, 42);
        assert_eq!(sim.containers, config.containers);
        assert_eq!(sim.gestures, config.gestures);
    }

    #[test]
    fn run_single_seed_passes() {
        let result = run_single_seed(0, &CampaignConfig::default()).expect("sim should not error");
        assert!(result.is_ok(), "seed 0 should pass: {result:?}");
    }

    #[test]
    fn run_campaign_100_seeds_pass() {
        let report = run_campaign(&CampaignConfig::default()).expect("campaign should not error");
        assert_eq!(report.seeds_run, 100);
        assert!(
            report.all_passed(),
            "campaign failed: {} failures, first at seed {:?}: {:?}",
            report.failures.len(),
            report.first_failure,
            report.failures.first(),
        );
        assert!(report.total_commits > 0);
    }

    #[test]
    fn hostile_campaign_still_passes() {
        // Every gesture gets stray input, and most see an external edit.
        let config = CampaignConfig {
            seed_range: 0..30,
            containers: 3,
            items: 5,
            stray_pointer_percent: 100,
            stale_percent: 80,
            column_drag_percent: 40,
            min_move_distance: 12.0,
            ..CampaignConfig::default()
        };
        let report = run_campaign(&config).expect("campaign should not error");
        assert!(report.all_passed(), "{:?}", report.failures.first());
        assert!(report.interesting_states_reached > 0);
    }

    #[test]
    fn empty_columns_and_single_column_boards_pass() {
        for (containers, items) in [(1, 0), (1, 6), (5, 0), (6, 2)] {
            let config = CampaignConfig {
                seed_range: 0..10,
                containers,
                items,
                ..CampaignConfig::default()
            };
            let report = run_campaign(&config).expect("campaign should not error");
            assert!(
                report.all_passed(),
                "{containers}x{items}: {:?}",
                report.failures.first()
            );
        }
    }

    #[test]
    fn replay_is_deterministic() {
        let config = CampaignConfig::default();
        let trace1 = replay_seed(7, &config).expect("replay 1");
        let trace2 = replay_seed(7, &config).expect("replay 2");
        assert_eq!(trace1.result, trace2.result);
        assert_eq!(trace1.oracle, trace2.oracle);
        assert!(!trace1.result.trace.is_empty());
    }

    #[test]
    fn campaign_report_serializes_to_json() {
        let report = CampaignReport {
            seeds_run: 10,
            seeds_passed: 9,
            first_failure: Some(7),
            failures: vec![SeedFailure {
                seed: 7,
                violations: vec!["SessionLeaked: gesture 3 left the controller dragging".into()],
            }],
            interesting_states_reached: 5,
            total_commits: 40,
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"seeds_run\":10"));
        assert!(json.contains("\"first_failure\":7"));
    }

    #[test]
    fn format_violation_produces_readable_strings() {
        let v = InvariantViolation::IndexOutOfBounds {
            gesture: 4,
            container: Some("c1".into()),
            index: 9,
            len: 3,
        };
        let s = format_violation(&v);
        assert!(s.contains("IndexOutOfBounds"));
        assert!(s.contains("index 9 in c1"));
    }
}
