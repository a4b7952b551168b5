use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Fixed-date public holidays (month, day). Movable feasts are not modeled;
/// the calendar only needs a stable answer for a given pair of dates.
pub const DEFAULT_HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),
    (3, 3),
    (5, 1),
    (5, 6),
    (5, 24),
    (9, 6),
    (9, 22),
    (12, 24),
    (12, 25),
    (12, 26),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub environment: String,
    /// Annual ceilings per leave type, in whole days.
    pub paid_days_off: i64,
    pub unpaid_days_off: i64,
    pub sick_days_off: i64,
    /// Pickup directory where outgoing mail files are dropped.
    pub mails_directory: PathBuf,
    /// Bootstrap administrator account, created at startup if missing.
    pub admin_name: String,
    pub admin_email: String,
    /// Public holidays as (month, day) pairs.
    pub holidays: Vec<(u32, u32)>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:workforce.db".to_string(),
            environment: "development".to_string(),
            paid_days_off: 20,
            unpaid_days_off: 40,
            sick_days_off: 90,
            mails_directory: PathBuf::from("./mails"),
            admin_name: "admin".to_string(),
            admin_email: "admin@demo.com".to_string(),
            holidays: DEFAULT_HOLIDAYS.to_vec(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            paid_days_off: env_i64("PAID_DAYS_OFF", defaults.paid_days_off),
            unpaid_days_off: env_i64("UNPAID_DAYS_OFF", defaults.unpaid_days_off),
            sick_days_off: env_i64("SICK_DAYS_OFF", defaults.sick_days_off),
            mails_directory: env::var("MAILS_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.mails_directory),
            admin_name: env::var("ADMIN_NAME").unwrap_or(defaults.admin_name),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            holidays: env::var("HOLIDAYS")
                .ok()
                .map(|raw| parse_holidays(&raw))
                .unwrap_or(defaults.holidays),
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses "MM-DD,MM-DD,..." into (month, day) pairs, skipping malformed entries.
fn parse_holidays(raw: &str) -> Vec<(u32, u32)> {
    raw.split(',')
        .filter_map(|entry| {
            let (month, day) = entry.trim().split_once('-')?;
            Some((month.parse().ok()?, day.parse().ok()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_holidays_accepts_month_day_pairs() {
        assert_eq!(parse_holidays("1-1,12-24"), vec![(1, 1), (12, 24)]);
    }

    #[test]
    fn parse_holidays_skips_garbage() {
        assert_eq!(parse_holidays("1-1,oops,13"), vec![(1, 1)]);
    }
}
