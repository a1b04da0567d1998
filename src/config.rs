use std::str::FromStr;

use anyhow::Context;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

/// Which persistence backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            Err(_) => 8080,
        };
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(v) => parse_hmac_algorithm(&v)?,
            Err(_) => Algorithm::HS256,
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            algorithm,
            ttl_minutes: match std::env::var("JWT_TTL_MINUTES") {
                Ok(v) => parse_ttl_minutes(&v)?,
                Err(_) => 20,
            },
        };

        Ok(Self {
            host,
            port,
            store_backend,
            database_url,
            max_connections,
            jwt,
        })
    }
}

/// Upper bound on token lifetime: one year.
const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_MINUTES {raw:?} is not a number"))?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) || minutes.checked_mul(60).is_none() {
        anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

/// Tokens are signed with a shared secret, so only the HMAC family is accepted.
fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("invalid JWT_ALGORITHM {raw:?}: {e}"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn token_lifetime_must_be_positive_and_bounded() {
        assert_eq!(parse_ttl_minutes(" 45 ").unwrap(), 45);
        assert!(parse_ttl_minutes("0").is_err());
        assert!(parse_ttl_minutes("-5").is_err());
        assert!(parse_ttl_minutes("9223372036854775807").is_err());
        assert!(parse_ttl_minutes("soon").is_err());
    }

    #[test]
    fn accepts_only_hmac_algorithms() {
        assert_eq!(parse_hmac_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_hmac_algorithm("RS256").is_err());
        assert!(parse_hmac_algorithm("nope").is_err());
    }
}
