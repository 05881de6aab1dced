use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use crate::catalog::Catalog;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for the DHIS2 instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub catalog: Catalog,
}

impl Config {
    pub fn from_env(catalog: Catalog) -> anyhow::Result<Self> {
        Self::from_lookup(catalog, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        catalog: Catalog,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let base_url = lookup("DHIS2_BASE_URL")
            .context("DHIS2_BASE_URL must be set to the DHIS2 instance root, e.g. https://play.dhis2.org/40")?;
        let username = lookup("DHIS2_USERNAME").context("DHIS2_USERNAME must be set")?;
        let password = lookup("DHIS2_PASSWORD").context("DHIS2_PASSWORD must be set")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            timeout: Duration::from_millis(timeout_ms(lookup("DHIS2_TIMEOUT_MS"))),
            catalog,
        })
    }
}

fn timeout_ms(raw: Option<String>) -> u64 {
    let Some(raw) = raw else {
        info!("DHIS2_TIMEOUT_MS not set, using default: {DEFAULT_TIMEOUT_MS}");
        return DEFAULT_TIMEOUT_MS;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid DHIS2_TIMEOUT_MS value {raw:?}: {e}, using default");
        DEFAULT_TIMEOUT_MS
    })
}
