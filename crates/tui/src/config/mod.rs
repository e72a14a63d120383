use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    session::DEFAULT_SESSION_PATH,
};

const DEFAULT_CONFIG_PATH: &str = "config/tally.toml";
/// Only used by debug builds; release builds require an explicit URL.
pub const DEV_API_URL: &str = "http://localhost:8000";

/// Raw layered settings before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Settings {
    api_url: Option<String>,
    email: String,
    session_file: String,
    timezone: String,
    log_file: String,
    log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            email: String::new(),
            session_file: DEFAULT_SESSION_PATH.to_string(),
            timezone: "UTC".to_string(),
            log_file: "config/tally.log".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub email: String,
    pub session_file: String,
    pub timezone: Tz,
    pub log_file: String,
    pub log_level: String,
}

impl AppConfig {
    /// Today's date in the configured timezone; the default period derives
    /// from it.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[derive(Debug, Parser)]
#[command(name = "tally", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the API base URL (e.g. http://localhost:8000).
    #[arg(long)]
    api_url: Option<String>,
    /// Prefill the login email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Where the session token is persisted.
    #[arg(long)]
    session_file: Option<String>,
    /// Timezone used to pick the current month (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    /// Log file path; the terminal itself is reserved for the UI.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TALLY"));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(api_url) = args.api_url {
        settings.api_url = Some(api_url);
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(session_file) = args.session_file {
        settings.session_file = session_file;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }

    finalize(settings, cfg!(debug_assertions))
}

fn finalize(settings: Settings, dev_build: bool) -> Result<AppConfig> {
    let api_url = resolve_api_url(settings.api_url, dev_build)?;
    let timezone = settings
        .timezone
        .parse::<Tz>()
        .map_err(|_| AppError::Setting(format!("unknown timezone \"{}\"", settings.timezone)))?;

    Ok(AppConfig {
        api_url,
        email: settings.email,
        session_file: settings.session_file,
        timezone,
        log_file: settings.log_file,
        log_level: settings.log_level,
    })
}

/// Development builds fall back to a local API; release builds fail fast.
pub fn resolve_api_url(configured: Option<String>, dev_build: bool) -> Result<String> {
    match configured.map(|url| url.trim().to_string()) {
        Some(url) if !url.is_empty() => Ok(url),
        _ if dev_build => Ok(DEV_API_URL.to_string()),
        _ => Err(AppError::Setting(
            "api_url is not set: pass --api-url, set TALLY_API_URL or add it to the config file"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins_in_every_build() {
        let url = Some(" https://api.example.com ".to_string());
        assert_eq!(
            resolve_api_url(url.clone(), false).unwrap(),
            "https://api.example.com"
        );
        assert_eq!(resolve_api_url(url, true).unwrap(), "https://api.example.com");
    }

    #[test]
    fn dev_build_defaults_to_local_api() {
        assert_eq!(resolve_api_url(None, true).unwrap(), DEV_API_URL);
        assert_eq!(resolve_api_url(Some("  ".to_string()), true).unwrap(), DEV_API_URL);
    }

    #[test]
    fn release_build_fails_fast_without_url() {
        assert!(matches!(resolve_api_url(None, false), Err(AppError::Setting(_))));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let settings = Settings {
            timezone: "Mars/Olympus".to_string(),
            ..Settings::default()
        };
        assert!(matches!(finalize(settings, true), Err(AppError::Setting(_))));
    }

    #[test]
    fn defaults_are_usable_in_dev() {
        let config = finalize(Settings::default(), true).unwrap();
        assert_eq!(config.api_url, DEV_API_URL);
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.session_file, DEFAULT_SESSION_PATH);
    }
}
