//! FlightSurety oracle bridge
//!
//! Stands up the FlightSurety engines in-process, registers a population of
//! simulated oracles, then drives a demo flight through insurance purchase,
//! status request, oracle consensus and passenger withdrawal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use surety_core::types::{AccountId, Amount, FlightStatus};
use surety_core::{FlightSurety, RailError, SettlementRail};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bridge;
mod config;

use bridge::{BridgeStats, OracleBridge};
use config::BridgeConfig;

/// FlightSurety oracle bridge CLI
#[derive(Parser)]
#[command(name = "surety-bridge")]
#[command(about = "FlightSurety oracle bridge simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SURETY_CONFIG")]
    config: Option<String>,

    /// Number of simulated oracles
    #[arg(short, long)]
    oracles: Option<usize>,

    /// Seed for oracle indexes and answers
    #[arg(long)]
    seed: Option<u64>,

    /// Status code every oracle reports (0, 10, 20, 30, 40, 50)
    #[arg(long)]
    status: Option<u8>,

    /// Log level
    #[arg(long, env = "SURETY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SURETY_LOG_JSON")]
    json: bool,
}

/// Transfers are only logged; the simulator has no external accounts.
struct LoggingRail;

impl SettlementRail for LoggingRail {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), RailError> {
        info!(passenger = %to, amount = %amount, "Transfer settled");
        Ok(())
    }
}

#[derive(Serialize)]
struct PassengerSummary {
    passenger: String,
    premium: Amount,
    credit: Amount,
    withdrawn: Amount,
}

#[derive(Serialize)]
struct DemoSummary {
    flight: String,
    status: FlightStatus,
    status_code: u8,
    passengers: Vec<PassengerSummary>,
    bridge: BridgeStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = BridgeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    // Override with CLI args
    if let Some(count) = cli.oracles {
        config.oracles.count = count;
    }
    if cli.seed.is_some() {
        config.oracles.seed = cli.seed;
    }
    if cli.status.is_some() {
        config.oracles.fixed_status = cli.status;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let summary = run_demo(&config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_demo(config: &BridgeConfig) -> anyhow::Result<DemoSummary> {
    let fixed_status = config
        .oracles
        .fixed_status
        .map(FlightStatus::try_from)
        .transpose()?;
    let mut rng = match config.oracles.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let administrator = AccountId::new("administrator");
    let founder = AccountId::new("founder-airline");
    let engine_rng = StdRng::seed_from_u64(rng.gen());
    // Oracle registrations are queued before the bridge starts reading.
    let mut surety_config = config.economics.to_surety_config();
    surety_config.event_capacity = surety_config
        .event_capacity
        .max(config.oracles.count + config.demo.passengers + 16);
    let (surety, stream) = FlightSurety::with_rng(
        surety_config,
        administrator,
        founder.clone(),
        engine_rng,
    )?;
    let surety = Arc::new(surety);

    let bridge = OracleBridge::register(
        surety.clone(),
        config.oracles.count,
        fixed_status,
        &mut rng,
    )?;

    let flight = surety.insurance().register_flight(
        &founder,
        &config.demo.flight,
        config.demo.departure,
        &founder,
    )?;
    let premium = Amount::new(u128::from(config.demo.premium));
    let passengers: Vec<AccountId> = (1..=config.demo.passengers)
        .map(|n| AccountId::new(format!("passenger-{n}")))
        .collect();
    for passenger in &passengers {
        surety
            .insurance()
            .buy_insurance(&flight, passenger, premium)?;
    }

    let requester = passengers.first().unwrap_or(&founder);
    let request = surety.oracles().fetch_flight_status(&flight, requester)?;
    info!(request = %request, "Waiting for oracle consensus");

    let idle = Duration::from_millis(config.oracles.idle_timeout_ms);
    let stats = bridge.run(stream, idle).await;

    let status = surety
        .insurance()
        .flight(&flight)?
        .map(|record| record.status)
        .unwrap_or_default();
    if stats.resolved.is_empty() {
        warn!(flight = %flight, "No status reached consensus; request left open");
    }

    let mut summaries = Vec::with_capacity(passengers.len());
    for passenger in passengers {
        let credit = surety.insurance().credit_balance(&passenger)?;
        let withdrawn = if credit.is_zero() {
            Amount::ZERO
        } else {
            surety.insurance().withdraw_credits(&passenger, &LoggingRail)?
        };
        summaries.push(PassengerSummary {
            passenger: passenger.to_string(),
            premium,
            credit,
            withdrawn,
        });
    }

    Ok(DemoSummary {
        flight: flight.to_string(),
        status,
        status_code: status.code(),
        passengers: summaries,
        bridge: stats,
    })
}
