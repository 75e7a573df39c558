//! # Hestia - home EV charger session backend
//!
//! Models a home electric-vehicle charger as an explicitly owned record with a
//! small state machine: plug in, charge at a requested rate, stop and account
//! for the delivered energy, estimate the time to a full battery.
//!
//! ## Architecture
//!
//! - `session`: the charger record and its state transitions
//! - `outcome`: tagged results of those transitions
//! - `repository`: storage trait with in-memory and JSON file stores
//! - `service`: id-addressed commands over a repository
//! - `config`: YAML configuration with validation
//! - `logging`: structured logging and tracing
//! - `error`: infrastructure error type

pub mod config;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod repository;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{HestiaError, Result};
pub use outcome::{ChargeEstimate, SessionOutcome};
pub use repository::{ChargerId, JsonFileRepository, MemoryRepository, SessionRepository};
pub use service::{ChargerCommand, ChargerService, CommandReply};
pub use session::{ChargerSpec, ChargerState, ChargingSession};
