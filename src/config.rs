use anyhow::Context;
use serde::Deserialize;

/// One year. Longer lifetimes are refused at startup.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "exchangeapp".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "exchangeapp-users".into()),
            ttl_minutes: parse_ttl(
                "JWT_TTL_MINUTES",
                std::env::var("JWT_TTL_MINUTES").ok(),
                60,
            )?,
            refresh_ttl_minutes: parse_ttl(
                "JWT_REFRESH_TTL_MINUTES",
                std::env::var("JWT_REFRESH_TTL_MINUTES").ok(),
                60 * 24 * 14,
            )?,
        };
        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}

fn parse_ttl(name: &str, raw: Option<String>, default: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{name} must be a whole number of minutes"))?;
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{name} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}"
    );
    Ok(minutes)
}
