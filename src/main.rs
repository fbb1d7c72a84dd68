mod config;
mod error;
mod hash;
mod models;
mod registry;
mod resource;
mod secret;
mod validate;

use actix_web::{middleware, web, App, HttpServer};
use config::Config;
use log::{error, info};
use registry::{AccountRegistry, InMemoryAccounts};
use std::sync::Arc;

/// API Guide (keep updated!)
/// - /register
///     - POST { username, email, type, password }: register user
/// - /login
///     - POST { username, password }: log user in

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "account_registry=info,actix_web=info");
    }
    env_logger::init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let registry = web::Data::new(AccountRegistry::new(
        Arc::new(InMemoryAccounts::new()),
        config.pepper,
    ));
    let json_limit = config.json_limit;

    info!(
        "Starting HTTP server on {} with {} worker(s)...",
        config.bind_address, config.workers
    );
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(middleware::Logger::default())
            .app_data(
                web::JsonConfig::default()
                    .limit(json_limit)
                    .error_handler(error::json_error),
            )
            .configure(resource::routes)
    })
    .workers(config.workers)
    .bind(config.bind_address.as_str())?
    .run()
    .await
}
