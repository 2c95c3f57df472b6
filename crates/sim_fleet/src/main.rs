use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use sim_core::backend::http::HttpTransitBackend;
use sim_core::config::{SimulationConfig, TOKENS_ENV_VAR};
use sim_core::fleet::FleetSupervisor;
use sim_core::telemetry::DriverReport;

#[derive(Parser)]
#[command(
    name = "sim_fleet",
    about = "Drive simulated school buses against the transit backend",
    long_about = "Polls each driver's schedule, replays the selected trip point by point\n\
                  and reports locations, stop visits and students until Ctrl-C."
)]
struct Cli {
    /// JSON config file; every field is optional
    #[arg(long, env = "SIM_CONFIG")]
    config: Option<PathBuf>,
    /// Backend base URL, overrides the config file
    #[arg(long)]
    base_url: Option<String>,
    /// Driver token; repeat or comma-separate for several drivers
    #[arg(long = "token", env = TOKENS_ENV_VAR, value_delimiter = ',')]
    tokens: Vec<String>,
    /// Seed for reproducible delays and student ids
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(cli: &Cli) -> anyhow::Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    config.add_tokens(&cli.tokens);
    if let Some(seed) = cli.seed {
        config.timing.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("could not listen for Ctrl-C ({err}); running until killed");
        std::future::pending::<()>().await;
    }
}

fn print_summary(reports: &[DriverReport]) {
    println!(
        "{:<28} {:>6} {:>6} {:>8} {:>7} {:>7}",
        "driver", "polls", "trips", "aborted", "errors", "failed"
    );
    for report in reports {
        println!(
            "{:<28} {:>6} {:>6} {:>8} {:>7} {:>7}",
            report.driver,
            report.polls,
            report.trips_completed,
            report.trips_aborted,
            report.cycle_errors,
            report.failed_calls()
        );
        for trip in &report.completed {
            println!(
                "    trip {} ({}): {} stops, {} picked up, {} dropped off{}",
                trip.trip_id,
                trip.route_name,
                trip.stops_visited.len(),
                trip.students_picked_up,
                trip.students_dropped_off,
                if trip.ended_ok { "" } else { ", end not acknowledged" }
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli).context("invalid configuration")?;

    info!(
        "backend {} with {} drivers (timeout {}s)",
        config.base_url,
        config.tokens.len(),
        config.request_timeout_secs
    );
    let fleet = FleetSupervisor::new(config.timing.clone())?;
    let timeout = config.request_timeout();
    let reports = fleet
        .run(
            &config.tokens,
            |token: &str| HttpTransitBackend::with_timeout(&config.base_url, token, timeout),
            shutdown_signal(),
        )
        .await?;

    print_summary(&reports);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tokens_come_from_repeated_and_comma_separated_flags() {
        let cli = Cli::try_parse_from([
            "sim_fleet",
            "--token",
            "tok-a, tok-b",
            "--token",
            "tok-c",
            "--seed",
            "7",
        ])
        .expect("cli");
        let config = load_config(&cli).expect("config");
        assert_eq!(config.tokens, vec!["tok-a", "tok-b", "tok-c"]);
        assert_eq!(config.timing.seed, Some(7));
    }

    #[test]
    fn tokens_fall_back_to_environment() {
        std::env::set_var(TOKENS_ENV_VAR, "env-a,env-b");
        let cli = Cli::try_parse_from(["sim_fleet"]).expect("cli");
        std::env::remove_var(TOKENS_ENV_VAR);

        let config = load_config(&cli).expect("config");
        assert_eq!(config.tokens, vec!["env-a", "env-b"]);
        assert_eq!(config.base_url, "http://localhost:3000");
    }
}
