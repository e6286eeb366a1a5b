use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on request bodies accepted by the estimate endpoints.
    pub max_body_bytes: usize,
    /// Documents that would run past this many pages are refused.
    pub pdf_max_pages: usize,
    pub issuer: IssuerConfig,
}

/// Who the estimate comes from. Printed in the header block of every PDF.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub name: String,
    /// Address / contact lines printed below the issuer name.
    pub details: Vec<String>,
    pub currency_symbol: String,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            name: "Estimates".to_string(),
            details: Vec::new(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = IssuerConfig::default();

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_body_bytes: parse_env("MAX_BODY_BYTES", 1024 * 1024)?,
            pdf_max_pages: parse_env("PDF_MAX_PAGES", 50)?,
            issuer: IssuerConfig {
                name: std::env::var("ESTIMATE_ISSUER_NAME").unwrap_or(defaults.name),
                details: std::env::var("ESTIMATE_ISSUER_DETAILS")
                    .map(|raw| split_detail_lines(&raw))
                    .unwrap_or(defaults.details),
                currency_symbol: std::env::var("ESTIMATE_CURRENCY_SYMBOL")
                    .unwrap_or(defaults.currency_symbol),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            max_body_bytes: 1024 * 1024,
            pdf_max_pages: 50,
            issuer: IssuerConfig::default(),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Accepts both real newlines and the literal `\n` escape, since most
/// `.env` loaders keep the latter verbatim.
fn split_detail_lines(raw: &str) -> Vec<String> {
    raw.replace("\\n", "\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
