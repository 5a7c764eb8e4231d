use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_DIR: &str = ".greendish";
const CONFIG_FILE: &str = "config.env";

/// Loads `./.env` first, then `~/.greendish/config.env` for anything still unset.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let default_config = config_dir().join(CONFIG_FILE);
    let _ = dotenv::from_path(default_config);
}

pub fn load_env_from_paths(local_env: &Path, default_config: &Path) {
    let _ = dotenv::from_path(local_env);
    let _ = dotenv::from_path(default_config);
}

pub fn config_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(CONFIG_DIR),
        Err(_) => PathBuf::from(CONFIG_DIR),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Reads a required variable.
pub fn require(var: &'static str) -> Result<String, EnvError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(EnvError::Missing(var))
}

/// Reads and parses an optional variable, falling back to `default` when unset.
pub fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, EnvError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| EnvError::Invalid { var, value: raw }),
        _ => Ok(default),
    }
}

/// Accepts `1/0`, `true/false`, `yes/no` (case-insensitive).
pub fn flag(var: &'static str, default: bool) -> Result<bool, EnvError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(EnvError::Invalid { var, value: raw }),
        },
        _ => Ok(default),
    }
}
