//! Configuration validation.
//!
//! Validates every section before any data source is opened, and resolves
//! the typed settings the CLI needs.

use crate::domain::balance::Reconstruction;
use crate::domain::error::WealthlogError;
use crate::domain::trade::TradeType;
use crate::ports::config_port::ConfigPort;

pub const MAX_DECIMALS: i64 = 10;
pub const MAX_POOL_SIZE: i64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Sqlite,
    Csv,
    Postgres,
    Http,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Sqlite => "sqlite",
            SourceKind::Csv => "csv",
            SourceKind::Postgres => "postgres",
            SourceKind::Http => "http",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Table,
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("expected table or csv, got {other:?}")),
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> WealthlogError {
    WealthlogError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, WealthlogError> {
    config
        .get_trimmed(section, key)
        .ok_or_else(|| WealthlogError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), WealthlogError> {
    validate_source_config(config)?;
    resolve_reconstruction(config)?;
    resolve_trade_type_override(config)?;
    resolve_report_format(config)?;
    resolve_decimals(config)?;
    Ok(())
}

/// Checks `[source] kind` and the keys that kind needs.
pub fn validate_source_config(config: &dyn ConfigPort) -> Result<SourceKind, WealthlogError> {
    let kind = resolve_source_kind(config)?;
    match kind {
        SourceKind::Sqlite => {
            require(config, "sqlite", "path")?;
            resolve_pool_size(config)?;
        }
        SourceKind::Csv => {
            require(config, "csv", "dir")?;
        }
        SourceKind::Postgres => {
            require(config, "postgres", "connection_string")?;
        }
        SourceKind::Http => {
            let base_url = require(config, "api", "base_url")?;
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(invalid(
                    "api",
                    "base_url",
                    "base_url must start with http:// or https://",
                ));
            }
            resolve_timeout_secs(config)?;
        }
    }
    Ok(kind)
}

/// `[sqlite] pool_size`, default 4.
pub fn resolve_pool_size(config: &dyn ConfigPort) -> Result<u32, WealthlogError> {
    let pool_size = config.get_int("sqlite", "pool_size", 4)?;
    if !(1..=MAX_POOL_SIZE).contains(&pool_size) {
        return Err(invalid(
            "sqlite",
            "pool_size",
            format!("pool_size must be between 1 and {MAX_POOL_SIZE}"),
        ));
    }
    u32::try_from(pool_size).map_err(|e| invalid("sqlite", "pool_size", e.to_string()))
}

/// `[api] timeout_secs`, default 30.
pub fn resolve_timeout_secs(config: &dyn ConfigPort) -> Result<u64, WealthlogError> {
    let timeout = config.get_int("api", "timeout_secs", 30)?;
    u64::try_from(timeout)
        .ok()
        .filter(|secs| *secs >= 1)
        .ok_or_else(|| invalid("api", "timeout_secs", "timeout_secs must be positive"))
}

pub fn resolve_source_kind(config: &dyn ConfigPort) -> Result<SourceKind, WealthlogError> {
    let kind = require(config, "source", "kind")?;
    match kind.to_ascii_lowercase().as_str() {
        "sqlite" => Ok(SourceKind::Sqlite),
        "csv" => Ok(SourceKind::Csv),
        "postgres" => Ok(SourceKind::Postgres),
        "http" => Ok(SourceKind::Http),
        other => Err(invalid(
            "source",
            "kind",
            format!("expected sqlite, csv, postgres or http, got {other:?}"),
        )),
    }
}

pub fn resolve_reconstruction(config: &dyn ConfigPort) -> Result<Reconstruction, WealthlogError> {
    match config.get_trimmed("ledger", "reconstruction") {
        Some(value) => value
            .parse()
            .map_err(|reason: String| invalid("ledger", "reconstruction", reason)),
        None => Ok(Reconstruction::default()),
    }
}

pub fn resolve_trade_type_override(
    config: &dyn ConfigPort,
) -> Result<Option<TradeType>, WealthlogError> {
    match config.get_trimmed("ledger", "trade_type") {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| invalid("ledger", "trade_type", "expected FX, STOCKS or CRYPTO")),
        None => Ok(None),
    }
}

pub fn resolve_report_format(config: &dyn ConfigPort) -> Result<ReportFormat, WealthlogError> {
    match config.get_trimmed("report", "format") {
        Some(value) => value
            .parse()
            .map_err(|reason: String| invalid("report", "format", reason)),
        None => Ok(ReportFormat::default()),
    }
}

pub fn resolve_decimals(config: &dyn ConfigPort) -> Result<u32, WealthlogError> {
    let decimals = config.get_int("report", "decimals", 2)?;
    if !(0..=MAX_DECIMALS).contains(&decimals) {
        return Err(invalid(
            "report",
            "decimals",
            format!("decimals must be between 0 and {MAX_DECIMALS}"),
        ));
    }
    u32::try_from(decimals).map_err(|e| invalid("report", "decimals", e.to_string()))
}
