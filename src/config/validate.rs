// src/config/validate.rs

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{CronwrapError, Result};

impl TryFrom<RawConfigFile> for Config {
    type Error = CronwrapError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_command(cfg)?;
    validate_threshold(cfg)?;
    validate_env(cfg)?;
    Ok(())
}

fn validate_command(cfg: &RawConfigFile) -> Result<()> {
    if cfg.command.trim().is_empty() {
        return Err(CronwrapError::ConfigError(
            "`command` must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_threshold(cfg: &RawConfigFile) -> Result<()> {
    if cfg.max_log_bytes == 0 {
        return Err(CronwrapError::ConfigError(
            "`max_log_bytes` must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.env.keys() {
        if name.trim().is_empty() {
            return Err(CronwrapError::ConfigError(
                "[env] contains an empty variable name".to_string(),
            ));
        }
        if name.contains('=') {
            return Err(CronwrapError::ConfigError(format!(
                "[env] variable name '{}' must not contain '='",
                name
            )));
        }
    }
    Ok(())
}
