use anyhow::Context;
use chrono::Weekday;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_WEEK_START: Weekday = Weekday::Mon;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub week_start: Weekday,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set to a Postgres instance")?;

        let max_connections = match lookup("HEALTHTRACK_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("HEALTHTRACK_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let week_start = match lookup("HEALTHTRACK_WEEK_START") {
            Some(raw) => parse_weekday(&raw)?,
            None => DEFAULT_WEEK_START,
        };

        Ok(Self {
            database_url,
            max_connections,
            week_start,
        })
    }
}

pub fn parse_weekday(raw: &str) -> anyhow::Result<Weekday> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("unrecognized weekday '{raw}'"))
}
