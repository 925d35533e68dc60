use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use salesreport_core::ReportSettings;

pub const BIND_VAR: &str = "SALESREPORT_BIND";
pub const MAX_UPLOAD_MB_VAR: &str = "SALESREPORT_MAX_UPLOAD_MB";
pub const MAX_SESSIONS_VAR: &str = "SALESREPORT_MAX_SESSIONS";
pub const PREVIEW_ROWS_VAR: &str = "SALESREPORT_PREVIEW_ROWS";
pub const TOP_PRODUCTS_VAR: &str = "SALESREPORT_TOP_PRODUCTS";

/// Runtime configuration for the server and the batch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub max_sessions: usize,
    pub settings: ReportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
            max_upload_bytes: 25 * 1024 * 1024,
            max_sessions: 64,
            settings: ReportSettings::default(),
        }
    }
}

impl AppConfig {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let bind = parse_var(&lookup, BIND_VAR)?.unwrap_or(defaults.bind);
        let max_upload_bytes = match parse_var::<usize>(&lookup, MAX_UPLOAD_MB_VAR)? {
            Some(0) => bail!("{MAX_UPLOAD_MB_VAR} must be at least 1"),
            Some(mb) => mb
                .checked_mul(1024 * 1024)
                .with_context(|| format!("{MAX_UPLOAD_MB_VAR} is too large"))?,
            None => defaults.max_upload_bytes,
        };
        let max_sessions = match parse_var::<usize>(&lookup, MAX_SESSIONS_VAR)? {
            Some(0) => bail!("{MAX_SESSIONS_VAR} must be at least 1"),
            Some(n) => n,
            None => defaults.max_sessions,
        };
        let settings = ReportSettings {
            preview_rows: parse_var(&lookup, PREVIEW_ROWS_VAR)?
                .unwrap_or(defaults.settings.preview_rows),
            top_products: parse_var(&lookup, TOP_PRODUCTS_VAR)?
                .unwrap_or(defaults.settings.top_products),
        };

        Ok(Self {
            bind,
            max_upload_bytes,
            max_sessions,
            settings,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}
