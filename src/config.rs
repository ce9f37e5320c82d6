use std::{env, path::PathBuf};
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://store.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_MEDIA_ROOT: &str = "./uploads";
const DEFAULT_FILE_SIZE_LIMIT: usize = 5 * 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is not a valid number: {value}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub secret: String,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub media_root: PathBuf,
    pub file_size_limit: usize,
    pub db_max_connections: u32,
}

impl Config {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_addr: var_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            secret: env::var("SECRET").map_err(|_| ConfigError::Missing("SECRET"))?,
            admin_username: var_or("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            media_root: PathBuf::from(var_or("MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
            file_size_limit: parse_var("FILE_SIZE_LIMIT", DEFAULT_FILE_SIZE_LIMIT)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
        })
    }

    /// Only the database is needed by the command line tools.
    pub fn database_url_from_env() -> String {
        dotenvy::dotenv().ok();
        var_or("DATABASE_URL", DEFAULT_DATABASE_URL)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}
