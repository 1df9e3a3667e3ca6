//! Runtime settings read from the environment (after `.env`, if present).

use crate::error::ConfigError;
use std::str::FromStr;

/// Which `Store` implementation the server runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::UnknownStore(s.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Enrollment cap checked on course create and update.
    pub max_students_per_course: usize,
    pub body_limit_bytes: usize,
    pub store: StoreKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/students".into(),
            bind_addr: "0.0.0.0:3000".into(),
            db_max_connections: 5,
            max_students_per_course: 20,
            body_limit_bytes: 64 * 1024,
            store: StoreKind::Postgres,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        if let Some(v) = lookup("DATABASE_URL") {
            settings.database_url = v;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            settings.bind_addr = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            settings.db_max_connections = parse_number("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("MAX_STUDENTS_PER_COURSE") {
            settings.max_students_per_course = parse_number("MAX_STUDENTS_PER_COURSE", &v)?;
        }
        if let Some(v) = lookup("BODY_LIMIT_BYTES") {
            settings.body_limit_bytes = parse_number("BODY_LIMIT_BYTES", &v)?;
        }
        if let Some(v) = lookup("STORE") {
            settings.store = v.parse()?;
        }
        Ok(settings)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
