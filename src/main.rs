use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hestia::logging::init_logging;
use hestia::{
    ChargerCommand, ChargerId, ChargerService, ChargerSpec, CommandReply, Config,
    JsonFileRepository,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hestia")]
#[command(about = "Manage home EV charger sessions", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "HESTIA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the session store path from the configuration
    #[arg(long)]
    store: Option<PathBuf>,

    /// Print replies as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a charger and print its id
    Register {
        /// Vehicle battery capacity in kWh
        #[arg(long)]
        capacity: f64,
        /// Energy currently in the battery in kWh
        #[arg(long, default_value_t = 0.0)]
        charge: f64,
        /// Charger hardware output ceiling in kW
        #[arg(long)]
        max_output: f64,
        /// Household supply limit in kW (defaults to the configured value)
        #[arg(long)]
        supply_limit: Option<f64>,
        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },
    /// Plug the vehicle in
    Connect { id: String },
    /// Unplug the vehicle
    Disconnect { id: String },
    /// Start charging at a rate in kW
    Start {
        id: String,
        #[arg(long)]
        rate: f64,
    },
    /// Stop charging after the given number of minutes
    Stop {
        id: String,
        #[arg(long)]
        minutes: f64,
    },
    /// Reset the cumulative consumption counter
    Reset { id: String },
    /// Estimate minutes until the battery is full
    Estimate { id: String },
    /// Record the battery level reported by the vehicle
    SetCharge {
        id: String,
        #[arg(long)]
        kwh: f64,
    },
    /// Show a charger record
    Show { id: String },
    /// List registered chargers
    List,
    /// Delete a charger record
    Remove { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(store) = &cli.store {
        config.storage.path = store.to_string_lossy().to_string();
    }
    config.validate()?;
    init_logging(&config.logging)?;

    let repository = JsonFileRepository::open(&config.storage.path)
        .with_context(|| format!("Failed to open session store {}", config.storage.path))?;
    debug!(path = %repository.path().display(), "Session store opened");
    let mut service = ChargerService::new(repository, config.charger.clone());

    let command = match cli.command {
        Command::Register {
            capacity,
            charge,
            max_output,
            supply_limit,
            id,
        } => {
            let spec = ChargerSpec {
                supply_limit_kw: supply_limit,
                ..ChargerSpec::new(capacity, charge, max_output)
            };
            let id = match id {
                Some(id) => {
                    let id = ChargerId::new(id);
                    service.register_with_id(&id, spec)?;
                    id
                }
                None => service.register(spec)?,
            };
            println!("{id}");
            return Ok(());
        }
        Command::Show { id } => {
            let session = service.get(&ChargerId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&session)?);
            return Ok(());
        }
        Command::List => {
            for id in service.list()? {
                println!("{id}");
            }
            return Ok(());
        }
        Command::Remove { id } => {
            service.remove(&ChargerId::new(id))?;
            return Ok(());
        }
        Command::SetCharge { id, kwh } => {
            let session = service.update_battery_charge(&ChargerId::new(id), kwh)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            return Ok(());
        }
        Command::Connect { id } => (id, ChargerCommand::Connect),
        Command::Disconnect { id } => (id, ChargerCommand::Disconnect),
        Command::Start { id, rate } => (id, ChargerCommand::StartCharging { rate_kw: rate }),
        Command::Stop { id, minutes } => (
            id,
            ChargerCommand::StopCharging {
                elapsed_minutes: minutes,
            },
        ),
        Command::Reset { id } => (id, ChargerCommand::ResetConsumption),
        Command::Estimate { id } => (id, ChargerCommand::EstimateChargeTime),
    };

    let (id, command) = command;
    let reply = service.execute(&ChargerId::new(id), command)?;
    print_reply(&reply, cli.json)
}

fn print_reply(reply: &CommandReply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reply)?);
    } else {
        println!("{}", reply.message);
    }
    Ok(())
}
