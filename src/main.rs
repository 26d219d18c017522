use std::{process::ExitCode, sync::Arc};

use config::Config;
use log::{error, info};
use model::{AppState, Database};

mod actions;
mod auth;
mod config;
mod error;
mod feed;
mod logger;
mod model;
mod routes;
mod templates;
mod timestamps;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logger::init(config.log_level) {
        eprintln!("Failed to initialize logger: {}", err);
        return ExitCode::FAILURE;
    }

    info!("Starting warble server at {}", config.addr);

    let database = match Database::open(&config.database) {
        Ok(database) => database,
        Err(err) => {
            error!("Failed to open database {}: {}", config.database.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let templates = match templates::load(&config.templates) {
        Ok(templates) => templates,
        Err(err) => {
            error!("Failed to parse templates {}: {}", config.templates, err);
            return ExitCode::FAILURE;
        }
    };

    let addr = config.addr;
    let state = Arc::new(AppState::new(database, templates, config));
    let app = routes::router(state);

    if let Err(err) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        error!("Server error: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
