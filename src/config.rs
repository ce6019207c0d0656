use anyhow::Context;
use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::domain::money::{round_currency, DEFAULT_CURRENCY};
use crate::validation::{validate_currency, validate_positive_amount};

pub const DEFAULT_APPLICATION_FEE: &str = "5000.00";
const DEV_SIGNING_SECRET: &str = "franchise-hub-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cors_allowed_origins: CorsOrigins,
    pub log_format: LogFormat,
    pub payments: PaymentSettings,
}

/// Settings consumed by the application and payment services.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettings {
    pub default_application_fee: BigDecimal,
    pub default_currency: String,
    pub gateway_signing_secret: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            default_application_fee: round_currency(&BigDecimal::from(5000)),
            default_currency: DEFAULT_CURRENCY.to_string(),
            gateway_signing_secret: DEV_SIGNING_SECRET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` directly; logging is set up before the full config loads.
    pub fn from_env() -> Self {
        parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default())
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let default_application_fee = parse_application_fee(
            &env::var("DEFAULT_APPLICATION_FEE")
                .unwrap_or_else(|_| DEFAULT_APPLICATION_FEE.to_string()),
        )?;

        let default_currency =
            env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
        validate_currency(&default_currency).context("DEFAULT_CURRENCY")?;

        let gateway_signing_secret = match env::var("GATEWAY_SIGNING_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("GATEWAY_SIGNING_SECRET not set, using development secret");
                DEV_SIGNING_SECRET.to_string()
            }
        };

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            cors_allowed_origins: parse_cors_origins(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            )?,
            log_format: LogFormat::from_env(),
            payments: PaymentSettings {
                default_application_fee,
                default_currency,
                gateway_signing_secret,
            },
        })
    }
}

/// The fee is charged as-is when a draft carries none, so it must be payable.
fn parse_application_fee(raw: &str) -> anyhow::Result<BigDecimal> {
    let fee = BigDecimal::from_str(raw.trim())
        .context("DEFAULT_APPLICATION_FEE must be a decimal amount")?;
    let fee = round_currency(&fee);
    validate_positive_amount(&fee).context("DEFAULT_APPLICATION_FEE")?;
    Ok(fee)
}

fn parse_cors_origins(raw: &str) -> anyhow::Result<CorsOrigins> {
    let value = raw.trim();
    if value == "*" {
        return Ok(CorsOrigins::Any);
    }

    let origins = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        anyhow::bail!("CORS_ALLOWED_ORIGINS must be '*' or a comma-separated list of origins");
    }

    Ok(CorsOrigins::List(origins))
}

fn parse_log_format(raw: &str) -> LogFormat {
    if raw.trim().eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_wildcard() {
        assert_eq!(parse_cors_origins("*").unwrap(), CorsOrigins::Any);
        assert_eq!(parse_cors_origins(" * ").unwrap(), CorsOrigins::Any);
    }

    #[test]
    fn test_cors_list() {
        let parsed = parse_cors_origins("https://a.example, https://b.example,").unwrap();
        assert_eq!(
            parsed,
            CorsOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn test_cors_rejects_empty_list() {
        assert!(parse_cors_origins(" , ").is_err());
    }

    #[test]
    fn test_log_format() {
        assert_eq!(parse_log_format("json"), LogFormat::Json);
        assert_eq!(parse_log_format("JSON"), LogFormat::Json);
        assert_eq!(parse_log_format(""), LogFormat::Text);
        assert_eq!(parse_log_format("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_application_fee_must_be_payable() {
        assert_eq!(
            parse_application_fee(" 2500 ").unwrap(),
            BigDecimal::from_str("2500.00").unwrap()
        );
        assert!(parse_application_fee("0").is_err());
        assert!(parse_application_fee("0.001").is_err());
        assert!(parse_application_fee("-10").is_err());
        assert!(parse_application_fee("ten").is_err());
    }

    #[test]
    fn test_default_payment_settings() {
        let settings = PaymentSettings::default();
        assert_eq!(settings.default_currency, "INR");
        assert_eq!(
            settings.default_application_fee,
            BigDecimal::from_str("5000.00").unwrap()
        );
    }
}
