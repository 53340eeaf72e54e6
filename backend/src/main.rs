mod config;
mod credentials;
mod error;
mod services;
mod storage;

use crate::config::{AppConfig, AppState};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::fs;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;
    fs::create_dir_all(&config.upload_dir)?;

    if config.credentials.inline_json.is_none() && !config.credentials.file.exists() {
        warn!(
            "No Google credentials configured, reports will be saved to {}",
            config.fallback_csv.display()
        );
    }

    let (host, port) = config.bind_addr();
    let upload_dir = config.upload_dir.clone();
    let public_dir = config.public_dir.clone();
    let state = AppState::new(config).map_err(io::Error::other)?;

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .service(services::submit::configure_routes())
            .service(services::files::uploads_service(&upload_dir))
            .service(services::files::public_service(&public_dir))
    })
    .bind((host, port))?
    .run()
    .await
}
