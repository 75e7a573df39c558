//! Charger service
//!
//! Front door for callers that address chargers by id: each command loads the
//! record from the repository, runs the matching [`ChargingSession`] operation
//! and writes the record back when it changed.

use crate::config::ChargerConfig;
use crate::error::{HestiaError, Result};
use crate::logging::get_logger;
use crate::outcome::{ChargeEstimate, SessionOutcome};
use crate::repository::{ChargerId, SessionRepository};
use crate::session::{ChargerSpec, ChargingSession};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations accepted by [`ChargerService::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ChargerCommand {
    Connect,
    Disconnect,
    StartCharging { rate_kw: f64 },
    StopCharging { elapsed_minutes: f64 },
    ResetConsumption,
    EstimateChargeTime,
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResult {
    Outcome(SessionOutcome),
    Estimate(ChargeEstimate),
}

impl CommandResult {
    /// Whether the stored record was modified
    pub const fn changed_state(&self) -> bool {
        match self {
            Self::Outcome(outcome) => outcome.is_applied(),
            Self::Estimate(_) => false,
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outcome(outcome) => write!(f, "{outcome}"),
            Self::Estimate(estimate) => write!(f, "{estimate}"),
        }
    }
}

/// Reply to a command: the result, its status line and the record afterwards
#[derive(Debug, Clone, Serialize)]
pub struct CommandReply {
    pub charger_id: ChargerId,
    pub message: String,
    pub result: CommandResult,
    pub charger: ChargingSession,
}

/// Charger service over an injected repository
pub struct ChargerService<R> {
    repository: R,
    config: ChargerConfig,
    logger: crate::logging::StructuredLogger,
}

impl<R: SessionRepository> ChargerService<R> {
    /// Create a new service
    pub fn new(repository: R, config: ChargerConfig) -> Self {
        Self {
            repository,
            config,
            logger: get_logger("service"),
        }
    }

    /// Register a charger under a fresh id
    pub fn register(&mut self, spec: ChargerSpec) -> Result<ChargerId> {
        let id = ChargerId::generate();
        self.register_with_id(&id, spec)?;
        Ok(id)
    }

    /// Register a charger under a caller-chosen id
    pub fn register_with_id(&mut self, id: &ChargerId, spec: ChargerSpec) -> Result<()> {
        if self.repository.contains(id)? {
            return Err(HestiaError::storage(format!("Charger {id} already exists")));
        }

        let mut session =
            ChargingSession::new(spec)?.with_history_limit(self.config.history_limit);
        session.set_default_supply_limit(self.config.supply_limit_kw);
        self.repository.put(id, &session)?;

        self.logger.for_charger(id.as_str()).info(&format!(
            "Registered charger: capacity {} kWh, max output {} kW, limit {} kW",
            session.battery_capacity_kwh(),
            session.max_power_output_kw(),
            session.effective_limit_kw()
        ));
        Ok(())
    }

    /// Fetch a charger record
    pub fn get(&self, id: &ChargerId) -> Result<ChargingSession> {
        self.repository
            .get(id)?
            .ok_or_else(|| HestiaError::not_found(id.as_str()))
    }

    /// Delete a charger record
    pub fn remove(&mut self, id: &ChargerId) -> Result<()> {
        if !self.repository.remove(id)? {
            return Err(HestiaError::not_found(id.as_str()));
        }
        self.logger.for_charger(id.as_str()).info("Removed charger");
        Ok(())
    }

    /// Ids of all registered chargers
    pub fn list(&self) -> Result<Vec<ChargerId>> {
        self.repository.ids()
    }

    /// Record a battery level reported by the vehicle
    pub fn update_battery_charge(
        &mut self,
        id: &ChargerId,
        charge_kwh: f64,
    ) -> Result<ChargingSession> {
        let mut session = self.get(id)?;
        session.update_battery_charge(charge_kwh)?;
        self.repository.put(id, &session)?;
        self.logger
            .for_charger(id.as_str())
            .debug(&format!("Battery charge updated to {charge_kwh} kWh"));
        Ok(session)
    }

    /// Run one command against a stored charger
    pub fn execute(&mut self, id: &ChargerId, command: ChargerCommand) -> Result<CommandReply> {
        let logger = self.logger.for_charger(id.as_str());
        logger.trace(&format!("Executing {command:?}"));

        let mut session = self.get(id)?;
        let result = match command {
            ChargerCommand::Connect => CommandResult::Outcome(session.connect()),
            ChargerCommand::Disconnect => CommandResult::Outcome(session.disconnect()),
            ChargerCommand::StartCharging { rate_kw } => {
                CommandResult::Outcome(session.start_charging(rate_kw))
            }
            ChargerCommand::StopCharging { elapsed_minutes } => {
                CommandResult::Outcome(session.stop_charging(elapsed_minutes))
            }
            ChargerCommand::ResetConsumption => {
                CommandResult::Outcome(session.reset_power_consumption())
            }
            ChargerCommand::EstimateChargeTime => {
                CommandResult::Estimate(session.estimate_remaining_charge_minutes())
            }
        };

        if result.changed_state()
            && let Err(e) = self.repository.put(id, &session)
        {
            logger.error(&format!("Failed to persist {command:?}: {e}"));
            return Err(e);
        }

        let message = result.to_string();
        match &result {
            CommandResult::Outcome(outcome) if outcome.is_rejected() => {
                logger.warn(&format!("{command:?} rejected: {message}"));
            }
            _ => logger.info(&message),
        }

        Ok(CommandReply {
            charger_id: id.clone(),
            message,
            result,
            charger: session,
        })
    }
}
