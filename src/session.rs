//! Charging session state machine
//!
//! A [`ChargingSession`] is the record of one home charger and the vehicle
//! plugged into it. It tracks the connection and charging flags, the current
//! charging rate and the cumulative energy delivered, and it is mutated only
//! through the operations below. Persistence is handled elsewhere; see
//! [`crate::repository`].

use crate::error::{HestiaError, Result};
use crate::outcome::{AlreadyInState, ChargeEstimate, Rejection, SessionEvent, SessionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Default number of completed intervals kept per charger
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Parameters for creating a charger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerSpec {
    /// Usable battery capacity of the vehicle (kWh)
    pub battery_capacity_kwh: f64,

    /// Energy currently stored in the battery (kWh)
    pub battery_charge_kwh: f64,

    /// Hardware output ceiling of the charger (kW)
    pub max_power_output_kw: f64,

    /// Initial charging rate (kW)
    #[serde(default)]
    pub power_consumption_kw: f64,

    /// Initial cumulative consumption (kWh)
    #[serde(default)]
    pub total_power_consumption_kwh: f64,

    /// Ceiling imposed by the household supply circuit (kW)
    #[serde(default)]
    pub supply_limit_kw: Option<f64>,
}

impl ChargerSpec {
    /// Spec with zero initial consumption and no supply limit
    pub const fn new(
        battery_capacity_kwh: f64,
        battery_charge_kwh: f64,
        max_power_output_kw: f64,
    ) -> Self {
        Self {
            battery_capacity_kwh,
            battery_charge_kwh,
            max_power_output_kw,
            power_consumption_kw: 0.0,
            total_power_consumption_kwh: 0.0,
            supply_limit_kw: None,
        }
    }
}

/// Derived charger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargerState {
    /// No vehicle plugged in
    Disconnected,

    /// Vehicle plugged in, not charging
    Idle,

    /// Vehicle plugged in and charging
    Charging,
}

/// A finished charging interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    /// Unique interval ID
    pub id: Uuid,

    /// When charging started
    pub started_at: DateTime<Utc>,

    /// When charging stopped
    pub stopped_at: DateTime<Utc>,

    /// Charging rate during the interval (kW)
    pub rate_kw: f64,

    /// Reported duration of the interval
    pub elapsed_minutes: f64,

    /// Energy delivered during the interval (kWh)
    pub delivered_kwh: f64,
}

/// Charger record and state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingSession {
    battery_capacity_kwh: f64,
    battery_charge_kwh: f64,
    max_power_output_kw: f64,
    power_consumption_kw: f64,
    total_power_consumption_kwh: f64,
    is_connected_to_car: bool,
    is_charging: bool,

    #[serde(default)]
    supply_limit_kw: Option<f64>,

    #[serde(default)]
    charging_started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    history: Vec<CompletedSession>,

    #[serde(default = "default_history_limit")]
    history_limit: usize,
}

impl ChargingSession {
    /// Create a disconnected charger record
    pub fn new(spec: ChargerSpec) -> Result<Self> {
        let session = Self {
            battery_capacity_kwh: spec.battery_capacity_kwh,
            battery_charge_kwh: spec.battery_charge_kwh,
            max_power_output_kw: spec.max_power_output_kw,
            power_consumption_kw: spec.power_consumption_kw,
            total_power_consumption_kwh: spec.total_power_consumption_kwh,
            is_connected_to_car: false,
            is_charging: false,
            supply_limit_kw: spec.supply_limit_kw,
            charging_started_at: None,
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        };
        session.validate()?;
        Ok(session)
    }

    /// Set how many completed intervals are retained
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Check the record invariants, e.g. after loading it from storage
    pub fn validate(&self) -> Result<()> {
        if !(self.battery_capacity_kwh.is_finite() && self.battery_capacity_kwh > 0.0) {
            return Err(HestiaError::validation(
                "battery_capacity_kwh",
                "Must be positive",
            ));
        }
        if !(self.battery_charge_kwh.is_finite()
            && (0.0..=self.battery_capacity_kwh).contains(&self.battery_charge_kwh))
        {
            return Err(HestiaError::validation(
                "battery_charge_kwh",
                "Must be between 0 and battery capacity",
            ));
        }
        if !(self.max_power_output_kw.is_finite() && self.max_power_output_kw > 0.0) {
            return Err(HestiaError::validation(
                "max_power_output_kw",
                "Must be positive",
            ));
        }
        if !(self.power_consumption_kw.is_finite()
            && (0.0..=self.max_power_output_kw).contains(&self.power_consumption_kw))
        {
            return Err(HestiaError::validation(
                "power_consumption_kw",
                "Must be between 0 and maximum power output",
            ));
        }
        if !(self.total_power_consumption_kwh.is_finite()
            && self.total_power_consumption_kwh >= 0.0)
        {
            return Err(HestiaError::validation(
                "total_power_consumption_kwh",
                "Must not be negative",
            ));
        }
        if let Some(limit) = self.supply_limit_kw
            && !(limit.is_finite() && limit > 0.0)
        {
            return Err(HestiaError::validation(
                "supply_limit_kw",
                "Must be positive",
            ));
        }
        if self.is_charging && !self.is_connected_to_car {
            return Err(HestiaError::validation(
                "is_charging",
                "Cannot charge without a connected car",
            ));
        }
        Ok(())
    }

    /// Plug the vehicle in
    pub fn connect(&mut self) -> SessionOutcome {
        if self.is_connected_to_car {
            return SessionOutcome::Unchanged(AlreadyInState::AlreadyConnected);
        }
        self.is_connected_to_car = true;
        SessionOutcome::Applied(SessionEvent::Connected)
    }

    /// Unplug the vehicle, interrupting any running interval
    ///
    /// The elapsed time of an interrupted interval is unknown, so no energy is
    /// credited for it.
    pub fn disconnect(&mut self) -> SessionOutcome {
        if !self.is_connected_to_car {
            return SessionOutcome::Unchanged(AlreadyInState::AlreadyDisconnected);
        }
        let charging_interrupted = self.is_charging;
        if charging_interrupted {
            debug!(
                rate_kw = self.power_consumption_kw,
                "Disconnect interrupted a charging interval"
            );
        }
        self.is_connected_to_car = false;
        self.is_charging = false;
        self.power_consumption_kw = 0.0;
        self.charging_started_at = None;
        SessionOutcome::Applied(SessionEvent::Disconnected {
            charging_interrupted,
        })
    }

    /// Start (or re-rate) charging at `power_rate` kW
    pub fn start_charging(&mut self, power_rate: f64) -> SessionOutcome {
        if !self.is_connected_to_car {
            return SessionOutcome::Rejected(Rejection::NotConnected);
        }
        if !(power_rate.is_finite() && power_rate > 0.0) {
            return SessionOutcome::Rejected(Rejection::InvalidPowerRate {
                requested_kw: power_rate,
            });
        }
        let limit_kw = self.effective_limit_kw();
        if power_rate > limit_kw {
            return SessionOutcome::Rejected(Rejection::ExceedsMaxOutput {
                requested_kw: power_rate,
                limit_kw,
            });
        }

        if !self.is_charging {
            self.charging_started_at = Some(Utc::now());
        }
        self.is_charging = true;
        self.power_consumption_kw = power_rate;
        SessionOutcome::Applied(SessionEvent::ChargingStarted {
            rate_kw: power_rate,
        })
    }

    /// Stop charging after `elapsed_minutes` at the current rate
    pub fn stop_charging(&mut self, elapsed_minutes: f64) -> SessionOutcome {
        if !self.is_charging {
            return SessionOutcome::Unchanged(AlreadyInState::NoActiveSession);
        }
        if !(elapsed_minutes.is_finite() && elapsed_minutes >= 0.0) {
            return SessionOutcome::Rejected(Rejection::InvalidDuration {
                minutes: elapsed_minutes,
            });
        }

        let rate_kw = self.power_consumption_kw;
        let delivered_kwh = rate_kw * (elapsed_minutes / 60.0);
        let total_kwh = self.total_power_consumption_kwh + delivered_kwh;
        if !(delivered_kwh.is_finite() && total_kwh.is_finite()) {
            return SessionOutcome::Rejected(Rejection::InvalidDuration {
                minutes: elapsed_minutes,
            });
        }
        self.total_power_consumption_kwh = total_kwh;
        self.is_charging = false;
        self.power_consumption_kw = 0.0;

        let stopped_at = Utc::now();
        self.history.push(CompletedSession {
            id: Uuid::new_v4(),
            started_at: self.charging_started_at.take().unwrap_or(stopped_at),
            stopped_at,
            rate_kw,
            elapsed_minutes,
            delivered_kwh,
        });
        self.trim_history();

        SessionOutcome::Applied(SessionEvent::ChargingStopped {
            delivered_kwh,
            total_kwh: self.total_power_consumption_kwh,
        })
    }

    /// Clear the cumulative consumption counter
    pub fn reset_power_consumption(&mut self) -> SessionOutcome {
        let previous_kwh = self.total_power_consumption_kwh;
        self.total_power_consumption_kwh = 0.0;
        SessionOutcome::Applied(SessionEvent::ConsumptionReset { previous_kwh })
    }

    /// Minutes until the battery is full at the current charging rate
    pub fn estimate_remaining_charge_minutes(&self) -> ChargeEstimate {
        if self.battery_charge_kwh >= self.battery_capacity_kwh {
            return ChargeEstimate::FullyCharged;
        }
        if self.power_consumption_kw <= 0.0 {
            return ChargeEstimate::NotCharging;
        }
        let remaining_kwh = self.battery_capacity_kwh - self.battery_charge_kwh;
        ChargeEstimate::Minutes {
            minutes: remaining_kwh / self.power_consumption_kw * 60.0,
        }
    }

    /// Record a new battery level reported by the vehicle
    pub fn update_battery_charge(&mut self, charge_kwh: f64) -> Result<()> {
        if !(charge_kwh.is_finite() && (0.0..=self.battery_capacity_kwh).contains(&charge_kwh)) {
            return Err(HestiaError::validation(
                "battery_charge_kwh",
                format!(
                    "{charge_kwh} is outside 0..={} kWh",
                    self.battery_capacity_kwh
                ),
            ));
        }
        self.battery_charge_kwh = charge_kwh;
        Ok(())
    }

    /// Apply a supply limit to a record that has none
    pub(crate) fn set_default_supply_limit(&mut self, limit_kw: f64) {
        if self.supply_limit_kw.is_none() && limit_kw.is_finite() && limit_kw > 0.0 {
            self.supply_limit_kw = Some(limit_kw);
        }
    }

    /// Highest rate `start_charging` will accept
    pub fn effective_limit_kw(&self) -> f64 {
        self.supply_limit_kw
            .map_or(self.max_power_output_kw, |limit| {
                limit.min(self.max_power_output_kw)
            })
    }

    pub const fn state(&self) -> ChargerState {
        match (self.is_connected_to_car, self.is_charging) {
            (false, _) => ChargerState::Disconnected,
            (true, false) => ChargerState::Idle,
            (true, true) => ChargerState::Charging,
        }
    }

    pub const fn battery_capacity_kwh(&self) -> f64 {
        self.battery_capacity_kwh
    }

    pub const fn battery_charge_kwh(&self) -> f64 {
        self.battery_charge_kwh
    }

    pub const fn max_power_output_kw(&self) -> f64 {
        self.max_power_output_kw
    }

    pub const fn power_consumption_kw(&self) -> f64 {
        self.power_consumption_kw
    }

    pub const fn total_power_consumption_kwh(&self) -> f64 {
        self.total_power_consumption_kwh
    }

    pub const fn is_connected_to_car(&self) -> bool {
        self.is_connected_to_car
    }

    pub const fn is_charging(&self) -> bool {
        self.is_charging
    }

    pub const fn supply_limit_kw(&self) -> Option<f64> {
        self.supply_limit_kw
    }

    pub const fn charging_started_at(&self) -> Option<DateTime<Utc>> {
        self.charging_started_at
    }

    /// Completed intervals, oldest first
    pub fn history(&self) -> &[CompletedSession] {
        &self.history
    }

    /// Most recent completed interval
    pub fn last_session(&self) -> Option<&CompletedSession> {
        self.history.last()
    }

    fn trim_history(&mut self) {
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }
}
