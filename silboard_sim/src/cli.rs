// silboard_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// silboard: runs flight firmware against a simulated flight-controller board.
///
/// Values given here override the ones in the scenario file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/hover.toml")]
    pub scenario: PathBuf,

    /// Seed for the sensor noise generator. Omit for a non-reproducible run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulated duration in seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Airframe type: `multirotor` or `fixedwing`.
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Directory under which the board's non-volatile memory is kept.
    #[arg(long)]
    pub memory_root: Option<PathBuf>,

    /// Print the fully resolved scenario and board sensor options as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub dump_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_scenario_untouched() {
        let cli = Cli::parse_from(["silboard"]);
        assert_eq!(cli.scenario, PathBuf::from("assets/scenarios/hover.toml"));
        assert!(cli.seed.is_none());
        assert!(cli.duration.is_none());
        assert!(!cli.dump_config);
    }

    #[test]
    fn overrides_are_parsed() {
        let cli = Cli::parse_from([
            "silboard",
            "--scenario",
            "plane.toml",
            "--seed",
            "7",
            "--duration",
            "2.5",
            "--vehicle",
            "fixedwing",
            "--memory-root",
            "/tmp/mem",
        ]);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.duration, Some(2.5));
        assert_eq!(cli.vehicle.as_deref(), Some("fixedwing"));
        assert_eq!(cli.memory_root, Some(PathBuf::from("/tmp/mem")));
    }
}
