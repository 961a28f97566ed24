//! `af sim`: deterministic drag-gesture simulation campaigns.
//!
//! `af sim run`: execute a campaign across many seeds.
//! `af sim replay`: replay a single seed with detailed trace output.

use std::process;

use anyhow::Result;
use autoflow_sim::campaign::{self, CampaignConfig};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cmd::move_cmd::describe;
use crate::output::{OutputMode, pretty_kv, pretty_section};

/// Top-level arguments for `af sim`.
#[derive(Args, Debug)]
pub struct SimArgs {
    #[command(subcommand)]
    pub command: SimCommand,
}

/// Simulation subcommands.
#[derive(Subcommand, Debug)]
pub enum SimCommand {
    /// Run a campaign across multiple seeds.
    #[command(
        about = "Run a simulation campaign across multiple seeds",
        long_about = "Drive randomized drag gestures (drops, cancels, stray pointers, mid-drag\n\
                      column removals) against generated boards and check every gesture\n\
                      against the reorder oracle. Reports pass/fail per seed and the first\n\
                      failure for replay.",
        after_help = "EXAMPLES:\n    # Run 100 seeds with defaults\n    af sim run --seeds 100\n\n\
                      # Bigger boards, more hostile input\n    af sim run --seeds 200 --containers 6 --items 30 --chaos 0.9\n\n\
                      # Machine-readable output\n    af sim run --seeds 100 --json"
    )]
    Run(SimRunArgs),

    /// Replay a single seed with full trace.
    #[command(
        about = "Replay a single seed with detailed trace output",
        long_about = "Replay a specific seed to get its commits, oracle result, and\n\
                      violation details. Use after a campaign failure to debug.",
        after_help = "EXAMPLES:\n    # Replay seed 42\n    af sim replay --seed 42\n\n\
                      # Replay with the parameters of a failing campaign\n    af sim replay --seed 42 --containers 6 --items 30 --chaos 0.9\n\n\
                      # Machine-readable output\n    af sim replay --seed 42 --json"
    )]
    Replay(SimReplayArgs),
}

/// Board and gesture parameters shared by `run` and `replay`.
#[derive(Args, Debug, Clone)]
pub struct SimParams {
    /// Columns on the generated board.
    #[arg(long, default_value = "4")]
    pub containers: usize,

    /// Cards on the generated board.
    #[arg(long, default_value = "12")]
    pub items: usize,

    /// Gestures per seed.
    #[arg(long, default_value = "32")]
    pub gestures: usize,

    /// Maximum pointer-move samples per gesture.
    #[arg(long, default_value = "6")]
    pub max_moves: usize,

    /// Percent of gestures that pick up a column header.
    #[arg(long, default_value = "15")]
    pub column_drag_percent: u8,

    /// Overall hostility (scales cancels, outside drops, stray pointers,
    /// and mid-drag column removals). Value between 0.0 and 1.0.
    #[arg(long, default_value = "0.5")]
    pub chaos: f64,

    /// Jitter threshold (px) for the simulated controllers.
    #[arg(long, default_value = "0")]
    pub min_move_distance: f64,
}

/// Arguments for `af sim run`.
#[derive(Args, Debug)]
pub struct SimRunArgs {
    /// Number of seeds to run.
    #[arg(long, default_value = "100")]
    pub seeds: u64,

    /// Starting seed value.
    #[arg(long, default_value = "0")]
    pub seed_start: u64,

    #[command(flatten)]
    pub params: SimParams,
}

/// Arguments for `af sim replay`.
#[derive(Args, Debug)]
pub struct SimReplayArgs {
    /// Seed to replay.
    #[arg(long)]
    pub seed: u64,

    #[command(flatten)]
    pub params: SimParams,
}

/// JSON output for `af sim run`.
#[derive(Debug, Serialize)]
struct RunOutput {
    seeds_run: usize,
    seeds_passed: usize,
    seeds_failed: usize,
    first_failure: Option<u64>,
    interesting_states_reached: usize,
    total_commits: u64,
    all_passed: bool,
    failures: Vec<FailureOutput>,
}

#[derive(Debug, Serialize)]
struct FailureOutput {
    seed: u64,
    violations: Vec<String>,
}

/// JSON output for `af sim replay`.
#[derive(Debug, Serialize)]
struct ReplayOutput {
    seed: u64,
    gestures: usize,
    trace_events: usize,
    commits: u64,
    moves: Vec<String>,
    interesting_state_reached: bool,
    oracle_passed: bool,
    violations: Vec<String>,
    trace_fingerprint: u64,
}

fn build_campaign_config(seed_start: u64, seeds: u64, params: &SimParams) -> CampaignConfig {
    CampaignConfig {
        seed_range: seed_start..seed_start.saturating_add(seeds),
        containers: params.containers,
        items: params.items,
        gestures: params.gestures,
        max_moves: params.max_moves,
        column_drag_percent: params.column_drag_percent.min(100),
        cancel_percent: scale_chaos(params.chaos, 30),
        outside_drop_percent: scale_chaos(params.chaos, 20),
        stray_pointer_percent: scale_chaos(params.chaos, 40),
        stale_percent: scale_chaos(params.chaos, 20),
        min_move_distance: params.min_move_distance,
    }
}

/// Scale the overall chaos level (0.0–1.0) by a weight to get a percent (0–100).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_chaos(chaos: f64, weight_pct: u8) -> u8 {
    let raw = chaos * f64::from(weight_pct);
    raw.clamp(0.0, 100.0) as u8
}

/// Execute `af sim run`.
pub fn run_sim_run(args: &SimRunArgs, output: OutputMode) -> Result<()> {
    let config = build_campaign_config(args.seed_start, args.seeds, &args.params);
    let report = campaign::run_campaign(&config)?;
    let params = &args.params;

    let out = RunOutput {
        seeds_run: report.seeds_run,
        seeds_passed: report.seeds_passed,
        seeds_failed: report.failures.len(),
        first_failure: report.first_failure,
        interesting_states_reached: report.interesting_states_reached,
        total_commits: report.total_commits,
        all_passed: report.all_passed(),
        failures: report
            .failures
            .iter()
            .map(|f| FailureOutput {
                seed: f.seed,
                violations: f.violations.clone(),
            })
            .collect(),
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!(
                "campaign seeds_run={} containers={} items={} gestures={} chaos_pct={:.0}",
                out.seeds_run,
                params.containers,
                params.items,
                params.gestures,
                params.chaos * 100.0
            );
            println!(
                "results passed={} failed={} interesting_states={} commits={} all_passed={}",
                out.seeds_passed,
                out.seeds_failed,
                out.interesting_states_reached,
                out.total_commits,
                out.all_passed
            );
            if !out.all_passed {
                for failure in out.failures.iter().take(5) {
                    println!(
                        "failure seed={} violations={}",
                        failure.seed,
                        failure.violations.len()
                    );
                }
                if out.failures.len() > 5 {
                    println!("failures_truncated count={}", out.failures.len() - 5);
                }
                println!(
                    "hint replay_seed={} containers={} items={}",
                    out.first_failure.unwrap_or(0),
                    params.containers,
                    params.items
                );
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, "Drag Simulation Campaign")?;
            pretty_kv(&mut w, "Seeds", out.seeds_run.to_string())?;
            pretty_kv(
                &mut w,
                "Board",
                format!("{} columns, {} cards", params.containers, params.items),
            )?;
            pretty_kv(&mut w, "Gestures", params.gestures.to_string())?;
            pretty_kv(&mut w, "Chaos", format!("{:.0}%", params.chaos * 100.0))?;
            pretty_kv(
                &mut w,
                "Results",
                format!(
                    "{} passed / {} failed ({} interesting states, {} commits)",
                    out.seeds_passed,
                    out.seeds_failed,
                    out.interesting_states_reached,
                    out.total_commits
                ),
            )?;

            if out.all_passed {
                pretty_kv(&mut w, "Status", "all seeds passed")?;
            } else {
                pretty_kv(
                    &mut w,
                    "Status",
                    format!(
                        "{} failures (first at seed {})",
                        out.seeds_failed,
                        out.first_failure.unwrap_or(0)
                    ),
                )?;
                println!();
                pretty_section(&mut w, "Failure Samples")?;
                for failure in out.failures.iter().take(5) {
                    println!(
                        "seed {:<8} violations={}",
                        failure.seed,
                        failure.violations.len()
                    );
                    for violation in &failure.violations {
                        println!("  - {violation}");
                    }
                }
                if out.failures.len() > 5 {
                    println!("... and {} more failures", out.failures.len() - 5);
                }
                println!();
                pretty_kv(
                    &mut w,
                    "Replay",
                    format!(
                        "af sim replay --seed {} --containers {} --items {} --chaos {}",
                        out.first_failure.unwrap_or(0),
                        params.containers,
                        params.items,
                        params.chaos
                    ),
                )?;
            }
        }
    }

    // Exit code 1 on any failure for CI integration
    if !report.all_passed() {
        process::exit(1);
    }

    Ok(())
}

/// Execute `af sim replay`.
pub fn run_sim_replay(args: &SimReplayArgs, output: OutputMode) -> Result<()> {
    let config = build_campaign_config(args.seed, 1, &args.params);
    let trace = campaign::replay_seed(args.seed, &config)?;

    let out = ReplayOutput {
        seed: args.seed,
        gestures: trace.result.gestures.len(),
        trace_events: trace.result.trace.len(),
        commits: trace.result.commits,
        moves: trace.result.moves().into_iter().map(describe).collect(),
        interesting_state_reached: trace.result.interesting_state_reached,
        oracle_passed: trace.oracle.passed,
        violations: trace
            .oracle
            .violations
            .iter()
            .map(campaign::format_violation)
            .collect(),
        trace_fingerprint: trace.result.trace_fingerprint(),
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!(
                "replay seed={} containers={} items={} gestures={}",
                out.seed, args.params.containers, args.params.items, out.gestures
            );
            println!(
                "result oracle_passed={} commits={} trace_events={} interesting_state_reached={} trace_fingerprint={:016x}",
                out.oracle_passed,
                out.commits,
                out.trace_events,
                out.interesting_state_reached,
                out.trace_fingerprint
            );
            for violation in &out.violations {
                println!("violation={violation}");
            }
            for mv in &out.moves {
                println!("move {mv}");
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, &format!("Replay Seed {}", out.seed))?;
            pretty_kv(
                &mut w,
                "Board",
                format!(
                    "{} columns, {} cards",
                    args.params.containers, args.params.items
                ),
            )?;
            pretty_kv(&mut w, "Gestures", out.gestures.to_string())?;
            pretty_kv(&mut w, "Trace events", out.trace_events.to_string())?;
            pretty_kv(&mut w, "Commits", out.commits.to_string())?;
            pretty_kv(
                &mut w,
                "Interesting",
                out.interesting_state_reached.to_string(),
            )?;
            pretty_kv(
                &mut w,
                "Fingerprint",
                format!("{:016x}", out.trace_fingerprint),
            )?;
            pretty_kv(&mut w, "Oracle", out.oracle_passed.to_string())?;

            if !out.oracle_passed {
                println!();
                pretty_section(&mut w, "Invariant Violations")?;
                for violation in &out.violations {
                    println!("- {violation}");
                }
            }

            println!();
            pretty_section(&mut w, "Committed Moves")?;
            if out.moves.is_empty() {
                println!("(none)");
            }
            for mv in &out.moves {
                println!("{mv}");
            }
        }
    }

    if !trace.oracle.passed {
        process::exit(1);
    }

    Ok(())
}

/// Dispatch `af sim` subcommands.
pub fn run_sim(args: &SimArgs, output: OutputMode) -> Result<()> {
    match &args.command {
        SimCommand::Run(run_args) => run_sim_run(run_args, output),
        SimCommand::Replay(replay_args) => run_sim_replay(replay_args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chaos: f64) -> SimParams {
        SimParams {
            containers: 4,
            items: 12,
            gestures: 32,
            max_moves: 6,
            column_drag_percent: 15,
            chaos,
            min_move_distance: 0.0,
        }
    }

    #[test]
    fn default_chaos_matches_simulator_defaults() {
        let config = build_campaign_config(0, 100, &params(0.5));
        let defaults = CampaignConfig::default();
        assert_eq!(config, defaults);
    }

    #[test]
    fn chaos_is_clamped() {
        assert_eq!(scale_chaos(-1.0, 40), 0);
        assert_eq!(scale_chaos(1.0, 40), 40);
        assert_eq!(scale_chaos(1000.0, 40), 100);
    }

    #[test]
    fn seed_range_does_not_overflow() {
        let config = build_campaign_config(u64::MAX - 1, 10, &params(0.0));
        assert_eq!(config.seed_range, (u64::MAX - 1)..u64::MAX);
        assert_eq!(config.cancel_percent, 0);
        assert_eq!(config.stale_percent, 0);
    }
}
