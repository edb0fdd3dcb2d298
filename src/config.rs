use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::models::{CarStatus, Id, Language};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1/";

/// Parko - fleet management from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Versioned API root
    #[arg(short = 'u', long, env = "PARKO_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Path to the SQLite file holding the session tokens
    #[arg(short = 'd', long, env = "PARKO_TOKEN_DB")]
    pub token_db: Option<String>,

    /// Keep tokens in memory only (nothing survives the process)
    #[arg(long, env = "PARKO_EPHEMERAL", default_value = "false")]
    pub ephemeral: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and store the session tokens
    Login {
        /// Username (prompted when omitted)
        #[arg(short = 'U', long, env = "PARKO_USERNAME")]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short = 'P', long, env = "PARKO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log out and forget the stored tokens
    Logout,
    /// Show the current user and what they may do
    Whoami,
    /// Refresh the stored token pair
    Refresh,
    /// Change the interface language of the current user
    SetLanguage {
        /// ru, en or ky
        language: Language,
    },
    /// List cars, or show one car
    Cars(CarsArgs),
    /// List monthly fuel logs
    Fuel(FuelArgs),
    /// List insurance policies
    Insurances(RecordArgs),
    /// List technical inspections
    Inspections(RecordArgs),
    /// List company users
    Users {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Maintenance cost report
    Report(ReportArgs),
}

impl Command {
    /// Commands that need a restored session before they run
    pub fn requires_session(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Logout)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CarsArgs {
    /// Show a single car
    #[arg(long)]
    pub id: Option<Id>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<CarStatus>,
    #[arg(long)]
    pub brand: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FuelArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub car: Option<Id>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub month: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub car: Option<Id>,
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub car: Option<Id>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenStorage {
    Sqlite(PathBuf),
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub token_storage: TokenStorage,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let token_storage = if args.ephemeral {
            TokenStorage::Memory
        } else {
            let path = match args.token_db {
                Some(ref path) => expand_tilde(path),
                None => default_token_db().context(
                    "Cannot determine a data directory (use -d or set PARKO_TOKEN_DB)",
                )?,
            };
            TokenStorage::Sqlite(path)
        };

        Ok(Config {
            api_base_url: args.api_url.clone(),
            token_storage,
            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            http_request_timeout: args.http_timeout,
            log_level: args.log_level.clone(),
            log_format: parse_log_format(&args.log_format),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .with_context(|| format!("PARKO_API_URL is not a valid URL: {}", self.api_base_url))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("PARKO_API_URL must use http or https: {}", self.api_base_url);
        }

        if self.http_request_timeout == 0 || self.http_connect_timeout == 0 {
            anyhow::bail!("HTTP timeouts must be greater than zero");
        }

        Ok(())
    }
}

/// Default token database location under the user's data directory
fn default_token_db() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("parko").join("tokens.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse log format from string
fn parse_log_format(s: &str) -> LogFormat {
    match s.to_lowercase().as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
