//! Tagged results of charger operations
//!
//! Every [`crate::session::ChargingSession`] operation succeeds at the call
//! level. What happened is described by a [`SessionOutcome`]: the transition was
//! applied, the charger was already in the requested state, or the request was
//! rejected. `Display` renders the legacy status line for each variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A state change that was carried out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Vehicle plugged in
    Connected,

    /// Vehicle unplugged; `charging_interrupted` is set when a charging
    /// interval was still running
    Disconnected { charging_interrupted: bool },

    /// Charging interval started at the given rate
    ChargingStarted { rate_kw: f64 },

    /// Charging interval ended
    ChargingStopped {
        /// Energy delivered during this interval only
        delivered_kwh: f64,
        /// Cumulative consumption after crediting this interval
        total_kwh: f64,
    },

    /// Cumulative consumption cleared
    ConsumptionReset { previous_kwh: f64 },
}

/// The charger was already in the requested state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlreadyInState {
    AlreadyConnected,
    AlreadyDisconnected,
    NoActiveSession,
}

/// A request that was refused without touching the record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// Charging requested without a vehicle plugged in
    NotConnected,

    /// Requested rate is above what the charger may deliver
    ExceedsMaxOutput { requested_kw: f64, limit_kw: f64 },

    /// Rate is zero, negative or not a number
    InvalidPowerRate { requested_kw: f64 },

    /// Elapsed time is negative, not a number, or too large to credit
    InvalidDuration { minutes: f64 },
}

/// Result of a state-changing charger operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SessionOutcome {
    Applied(SessionEvent),
    Unchanged(AlreadyInState),
    Rejected(Rejection),
}

impl SessionOutcome {
    /// Whether the record was modified
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Whether the request was refused
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Human readable status line
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Estimated time until the battery is full
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargeEstimate {
    /// Minutes remaining at the current charging rate
    Minutes { minutes: f64 },

    /// Stored energy already at or above capacity
    FullyCharged,

    /// No charging rate to extrapolate from
    NotCharging,
}

impl ChargeEstimate {
    /// Remaining minutes, if an estimate could be made
    pub const fn minutes(&self) -> Option<f64> {
        match self {
            Self::Minutes { minutes } => Some(*minutes),
            _ => None,
        }
    }

    /// Human readable status line
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Car is now connected."),
            Self::Disconnected { .. } => f.write_str("Car is now disconnected."),
            Self::ChargingStarted { rate_kw } => write!(f, "Charging started at {rate_kw} kW."),
            Self::ChargingStopped { delivered_kwh, .. } => write!(
                f,
                "Charging stopped. Total power consumed: {delivered_kwh:.2} kWh."
            ),
            Self::ConsumptionReset { .. } => {
                f.write_str("Total power consumption has been reset.")
            }
        }
    }
}

impl fmt::Display for AlreadyInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyConnected => "Car is already connected.",
            Self::AlreadyDisconnected => "Car is already disconnected.",
            Self::NoActiveSession => "No active charging session to stop.",
        })
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConnected => "Car is not connected.",
            Self::ExceedsMaxOutput { .. } => "Power rate exceeds maximum output capacity.",
            Self::InvalidPowerRate { .. } => "Power rate must be a positive number of kW.",
            Self::InvalidDuration { .. } => {
                "Charging duration must be a non-negative number of minutes."
            }
        })
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(event) => write!(f, "{event}"),
            Self::Unchanged(state) => write!(f, "{state}"),
            Self::Rejected(reason) => write!(f, "{reason}"),
        }
    }
}

impl fmt::Display for ChargeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes { minutes } => {
                write!(f, "Estimated charging time: {minutes:.2} minutes.")
            }
            Self::FullyCharged => f.write_str("Battery is already fully charged."),
            Self::NotCharging => f.write_str("No active charging rate to estimate from."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_message_drops_trailing_zero() {
        let outcome = SessionOutcome::Applied(SessionEvent::ChargingStarted { rate_kw: 10.0 });
        assert_eq!(outcome.message(), "Charging started at 10 kW.");

        let outcome = SessionOutcome::Applied(SessionEvent::ChargingStarted { rate_kw: 7.4 });
        assert_eq!(outcome.message(), "Charging started at 7.4 kW.");
    }

    #[test]
    fn test_stopped_message_uses_two_decimals() {
        let outcome = SessionOutcome::Applied(SessionEvent::ChargingStopped {
            delivered_kwh: 2.5,
            total_kwh: 40.0,
        });
        assert_eq!(
            outcome.message(),
            "Charging stopped. Total power consumed: 2.50 kWh."
        );
    }

    #[test]
    fn test_outcome_predicates() {
        let applied = SessionOutcome::Applied(SessionEvent::Connected);
        let unchanged = SessionOutcome::Unchanged(AlreadyInState::AlreadyConnected);
        let rejected = SessionOutcome::Rejected(Rejection::NotConnected);

        assert!(applied.is_applied());
        assert!(!unchanged.is_applied());
        assert!(!unchanged.is_rejected());
        assert!(rejected.is_rejected());
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = SessionOutcome::Rejected(Rejection::ExceedsMaxOutput {
            requested_kw: 25.0,
            limit_kw: 22.0,
        });
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "rejected");
        assert_eq!(value["detail"]["kind"], "exceeds_max_output");
        assert_eq!(value["detail"]["limit_kw"], 22.0);

        let unchanged = serde_json::to_value(SessionOutcome::Unchanged(
            AlreadyInState::NoActiveSession,
        ))
        .unwrap();
        assert_eq!(unchanged["detail"], "no_active_session");
    }

    #[test]
    fn test_estimate_messages() {
        assert_eq!(
            ChargeEstimate::Minutes { minutes: 102.0 }.message(),
            "Estimated charging time: 102.00 minutes."
        );
        assert_eq!(
            ChargeEstimate::FullyCharged.message(),
            "Battery is already fully charged."
        );
        assert_eq!(ChargeEstimate::NotCharging.minutes(), None);
    }
}
