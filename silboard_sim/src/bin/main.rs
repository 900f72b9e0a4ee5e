// silboard_sim/src/bin/main.rs

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use silboard_sim::cli::Cli;
use silboard_sim::simulation::config::ScenarioConfig;
use silboard_sim::simulation::error::SimError;
use silboard_sim::simulation::runner::SimulationRunner;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Applies command-line overrides on top of the scenario file.
fn resolve_config(cli: &Cli) -> Result<ScenarioConfig, SimError> {
    let mut config = ScenarioConfig::load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(duration) = cli.duration {
        config.simulation.duration_seconds = duration;
    }
    if let Some(vehicle) = &cli.vehicle {
        config.vehicle.kind = vehicle.clone();
    }
    if let Some(root) = &cli.memory_root {
        config.simulation.memory_root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), SimError> {
    let config = resolve_config(cli)?;
    if cli.dump_config {
        println!("{}", config.to_resolved_toml_string()?);
        return Ok(());
    }

    let mut runner = SimulationRunner::from_config(&config)?;
    runner.run_for(config.simulation.duration_seconds);

    let stats = runner.firmware().stats();
    info!(
        boot = stats.boot_count,
        imu = stats.imu_samples,
        mag = stats.mag_reads,
        baro = stats.baro_reads,
        airspeed = stats.airspeed_reads,
        sonar = stats.sonar_reads,
        rc_lost = stats.rc_lost,
        "Run complete after {} ticks",
        runner.ticks()
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
