use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// The database location comes from `DATABASE_URL`, or is composed from
/// `DATABASE_HOST`/`DATABASE_PORT`/`DATABASE_NAME`/`DATABASE_USERNAME`/`DATABASE_PASSWORD`.
/// With neither present the service falls back to the in-memory store.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    /// Diagnostic only. Lists every external id in 404 bodies.
    pub not_found_lists_known_ids: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            database_url: database_url(&get)?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_flag(&get, "RUN_MIGRATIONS", true)?,
            not_found_lists_known_ids: parse_flag(&get, "NOT_FOUND_LISTS_KNOWN_IDS", false)?,
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn database_url<F>(get: &F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        return Ok(Some(url));
    }
    let Some(host) = get("DATABASE_HOST") else {
        return Ok(None);
    };
    let require = |key: &str| {
        get(key).with_context(|| {
            format!("DATABASE_HOST is set but required variable '{key}' is not")
        })
    };
    let port = get("DATABASE_PORT").unwrap_or_else(|| "5432".to_string());
    Ok(Some(format!(
        "postgres://{}:{}@{host}:{port}/{}",
        require("DATABASE_USERNAME")?,
        require("DATABASE_PASSWORD")?,
        require("DATABASE_NAME")?,
    )))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag<F>(get: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("{key} must be a boolean, got '{other}'"),
    }
}
