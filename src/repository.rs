//! Persistence for charger records
//!
//! The state machine never touches storage itself. Callers load a record
//! through a [`SessionRepository`], apply an operation, and hand the record
//! back. Two stores are provided: an in-memory map and a JSON document on disk.

use crate::error::{HestiaError, Result};
use crate::logging::{LogContext, get_logger_with_context};
use crate::session::ChargingSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of a charger record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargerId(String);

impl ChargerId {
    /// Wrap an existing identifier
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChargerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChargerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Storage for charger records keyed by [`ChargerId`]
pub trait SessionRepository {
    /// Fetch a record, `None` if no record is stored under `id`
    fn get(&self, id: &ChargerId) -> Result<Option<ChargingSession>>;

    /// Insert or replace a record
    fn put(&mut self, id: &ChargerId, session: &ChargingSession) -> Result<()>;

    /// Delete a record, returning whether one existed
    fn remove(&mut self, id: &ChargerId) -> Result<bool>;

    /// All stored ids in ascending order
    fn ids(&self) -> Result<Vec<ChargerId>>;

    /// Whether a record exists under `id`
    fn contains(&self, id: &ChargerId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }
}

/// Volatile store, mainly for tests and one-shot tooling
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    records: HashMap<ChargerId, ChargingSession>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for MemoryRepository {
    fn get(&self, id: &ChargerId) -> Result<Option<ChargingSession>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, id: &ChargerId, session: &ChargingSession) -> Result<()> {
        self.records.insert(id.clone(), session.clone());
        Ok(())
    }

    fn remove(&mut self, id: &ChargerId) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }

    fn ids(&self) -> Result<Vec<ChargerId>> {
        let mut ids: Vec<ChargerId> = self.records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    chargers: BTreeMap<ChargerId, ChargingSession>,
}

/// Store persisted as a single pretty-printed JSON file
///
/// The whole document is read on open and rewritten after every mutation.
pub struct JsonFileRepository {
    path: PathBuf,
    document: StoreDocument,
    logger: crate::logging::StructuredLogger,
}

impl JsonFileRepository {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let logger = get_logger_with_context(
            LogContext::new("repository").with_field("path", path.display().to_string()),
        );

        let document = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let document: StoreDocument = if contents.trim().is_empty() {
                StoreDocument::default()
            } else {
                serde_json::from_str(&contents)?
            };
            for (id, session) in &document.chargers {
                session.validate().map_err(|e| {
                    HestiaError::storage(format!("Invalid record {id} in {}: {e}", path.display()))
                })?;
            }
            logger.info(&format!(
                "Loaded {} charger record(s)",
                document.chargers.len()
            ));
            document
        } else {
            logger.info("No session store found, starting empty");
            StoreDocument::default()
        };

        Ok(Self {
            path,
            document,
            logger,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.document)?;
        std::fs::write(&self.path, contents)?;
        self.logger.trace("Saved session store to disk");
        Ok(())
    }
}

impl SessionRepository for JsonFileRepository {
    fn get(&self, id: &ChargerId) -> Result<Option<ChargingSession>> {
        Ok(self.document.chargers.get(id).cloned())
    }

    fn put(&mut self, id: &ChargerId, session: &ChargingSession) -> Result<()> {
        session.validate()?;
        let previous = self.document.chargers.insert(id.clone(), session.clone());
        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.document.chargers.insert(id.clone(), previous),
                None => self.document.chargers.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, id: &ChargerId) -> Result<bool> {
        let Some(previous) = self.document.chargers.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.flush() {
            self.document.chargers.insert(id.clone(), previous);
            return Err(e);
        }
        Ok(true)
    }

    fn ids(&self) -> Result<Vec<ChargerId>> {
        Ok(self.document.chargers.keys().cloned().collect())
    }
}
