use std::env;

use anyhow::Context;

use crate::money::Percentage;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Fixed sales tax shown on checkout quotes.
    pub tax_rate: Percentage,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let tax_rate = match env::var("CHECKOUT_TAX_RATE") {
            Ok(raw) => raw
                .parse::<Percentage>()
                .with_context(|| format!("CHECKOUT_TAX_RATE `{raw}` is invalid"))?,
            Err(_) => default_tax_rate(),
        };
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours,
            tax_rate,
        })
    }
}

pub fn default_tax_rate() -> Percentage {
    Percentage::from_basis_points(800).unwrap_or(Percentage::ZERO)
}
