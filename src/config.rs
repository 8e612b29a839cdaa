use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// DuckDB database path, or `:memory:`
    #[serde(default)]
    pub url: String,
    pub pool_size: u32,
    /// Create the users/products/orders tables at startup if missing
    pub bootstrap_schema: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub cors_max_age_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl AppConfig {
    /// Loads configuration from files, `SQL_CHAT__*` variables and the
    /// `DATABASE_URL` / `GOOGLE_API_KEY` pair.
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        Self::from_sources(
            args,
            std::env::var("DATABASE_URL").ok(),
            std::env::var("GOOGLE_API_KEY").ok(),
        )
    }

    pub fn from_sources(
        args: &CliArgs,
        database_url: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8000)?
            .set_default(
                "web.cors_origins",
                vec![
                    "http://localhost",
                    "http://localhost:8000",
                    "http://127.0.0.1:8000",
                    "null",
                ],
            )?
            .set_default("web.cors_max_age_secs", 600)?
            .set_default("database.pool_size", 4)?
            .set_default("database.bootstrap_schema", false)?
            .set_default("llm.model", "gemini-2.0-flash")?
            .set_default("llm.api_url", DEFAULT_GEMINI_URL)?
            .set_default("llm.timeout_secs", 60)?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = [
                "config.toml",
                "config/config.toml",
                "/etc/sql-chat/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        let config_builder = config_builder
            .add_source(
                Environment::with_prefix("SQL_CHAT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("database.url", database_url)?
            .set_override_option("llm.api_key", api_key)?;

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "DATABASE_URL must be set (database.url)".to_string(),
            ));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "GOOGLE_API_KEY must be set (llm.api_key)".to_string(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Message(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
