#![forbid(unsafe_code)]

use anyhow::Result;
use autoflow_sim::oracle::GestureOracle;
use autoflow_sim::{SimulationConfig, Simulator};

fn main() -> Result<()> {
    let mut simulator = Simulator::new(SimulationConfig::default())?;
    let result = simulator.run()?;
    let oracle =
        GestureOracle::check_all(&result.gestures, &result.initial_board, &result.final_board);

    println!(
        "simulation complete: trace_events={} commits={} oracle_passed={} interesting={} fingerprint={:016x}",
        result.trace.len(),
        result.commits,
        oracle.passed,
        result.interesting_state_reached,
        result.trace_fingerprint()
    );

    Ok(())
}
