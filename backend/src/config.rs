//! Runtime configuration read from `CERTSMITH_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CERTSMITH_HOST` | `127.0.0.1` |
//! | `CERTSMITH_PORT` | `8080` |
//! | `CERTSMITH_OUTPUT_DIR` | `./output` |
//! | `CERTSMITH_FONTS_DIR` | `./fonts` |
//! | `CERTSMITH_SMTP_HOST` | `smtp.gmail.com` |
//! | `CERTSMITH_SMTP_PORT` | `465` |
//! | `CERTSMITH_SMTP_TIMEOUT_SECS` | `30` |
//! | `CERTSMITH_SEND_DELAY_MS` | `1000` |
//! | `CERTSMITH_VALIDATION_URL` | `https://your-validation-url.com/validate` |
//! | `CERTSMITH_JSON_LIMIT_BYTES` | `10485760` |
//!
//! Values that fail to parse are logged and replaced by their default.

use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::delivery::SmtpSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of the per-session work directories.
    pub output_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub smtp: SmtpSettings,
    /// Pause between two successive send attempts.
    pub send_delay: Duration,
    pub validation_base_url: String,
    pub json_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            output_dir: PathBuf::from("./output"),
            fonts_dir: PathBuf::from("./fonts"),
            smtp: SmtpSettings::default(),
            send_delay: Duration::from_millis(1000),
            validation_base_url: "https://your-validation-url.com/validate".to_string(),
            json_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            host: env::var("CERTSMITH_HOST").unwrap_or(defaults.host),
            port: parse_var("CERTSMITH_PORT", defaults.port),
            output_dir: env::var("CERTSMITH_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            fonts_dir: env::var("CERTSMITH_FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fonts_dir),
            smtp: SmtpSettings {
                host: env::var("CERTSMITH_SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: parse_var("CERTSMITH_SMTP_PORT", defaults.smtp.port),
                timeout: Duration::from_secs(parse_var(
                    "CERTSMITH_SMTP_TIMEOUT_SECS",
                    defaults.smtp.timeout.as_secs(),
                )),
            },
            send_delay: Duration::from_millis(parse_var(
                "CERTSMITH_SEND_DELAY_MS",
                defaults.send_delay.as_millis() as u64,
            )),
            validation_base_url: env::var("CERTSMITH_VALIDATION_URL")
                .unwrap_or(defaults.validation_base_url),
            json_limit_bytes: parse_var("CERTSMITH_JSON_LIMIT_BYTES", defaults.json_limit_bytes),
        }
    }

    pub fn bind_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
        default
    })
}
