use anyhow::Context;
use clap::Parser;
use r2d2::Pool;
use std::sync::Arc;
use tracing::{error, info};

mod agent;
mod config;
mod db;
mod llm;
mod util;
mod web;

use crate::agent::SqlAgent;
use crate::config::{AppConfig, CliArgs};
use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::executor::DuckDbExecutor;
use crate::db::schema::bootstrap_schema;
use crate::llm::providers::gemini::GeminiProvider;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up DATABASE_URL / GOOGLE_API_KEY from a local .env if present
    dotenv::dotenv().ok();

    init_tracing();

    let args = CliArgs::parse();

    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Opening DuckDB database at {}", config.database.url);
    let db_manager = DuckDBConnectionManager::open(&config.database.url)
        .with_context(|| format!("could not open database {}", config.database.url))?;
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(db_manager)
        .context("could not build the connection pool")?;

    if config.database.bootstrap_schema {
        let conn = pool.get()?;
        bootstrap_schema(&conn).context("could not create the bootstrap schema")?;
    }

    info!("Initializing Gemini client with model: {}", config.llm.model);
    let llm = GeminiProvider::new(&config.llm)?;

    let agent = SqlAgent::new(Arc::new(llm), Arc::new(DuckDbExecutor::new(pool)));
    let app_state = Arc::new(AppState::new(config.clone(), agent));

    info!("Starting SQL Chat server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
