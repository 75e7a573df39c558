use super::*;
use crate::session::DEFAULT_HISTORY_LIMIT;

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            supply_limit_kw: 22.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "hestia_sessions.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charger: ChargerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
