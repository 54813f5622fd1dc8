use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};

mod api;
mod config;
mod db;
mod docs;
mod error;
mod lifecycle;
mod model;
mod routes;
mod store;
mod utils;

use config::{Config, StoreBackend};
use db::init_db;
use lifecycle::{SystemClock, UserService, VacationService};
use store::{MemoryStore, MySqlStore, RequestRepository, UserDirectory};
use utils::email_filter::EmailFilter;
use utils::user_cache::UserCache;

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

const USER_CACHE_CAPACITY: u64 = 50_000;
const WARMUP_BATCH: usize = 500;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = config.store_backend.as_ref(), "Server starting...");

    let (requests, users): (Arc<dyn RequestRepository>, Arc<dyn UserDirectory>) =
        match config.store_backend {
            StoreBackend::Mysql => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let store = Arc::new(MySqlStore::new(init_db(url, &config).await?));
                let requests: Arc<dyn RequestRepository> = store.clone();
                let users: Arc<dyn UserDirectory> = store;
                (requests, users)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store; data is lost on shutdown");
                let store = Arc::new(MemoryStore::new());
                let requests: Arc<dyn RequestRepository> = store.clone();
                let users: Arc<dyn UserDirectory> = store;
                (requests, users)
            }
        };

    if config.seed_demo_data {
        store::seed::seed_demo_data(requests.as_ref(), users.as_ref())
            .await
            .context("Failed to seed demo data")?;
    }

    let user_cache = UserCache::new(USER_CACHE_CAPACITY, config.user_cache_ttl);
    let email_filter = Arc::new(EmailFilter::new(config.email_filter_capacity));

    {
        let users = users.clone();
        let email_filter = email_filter.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = email_filter.warmup(users.as_ref(), WARMUP_BATCH).await {
                error!(error = ?e, "Failed to warm up email filter");
            }
        });
    }
    {
        let users = users.clone();
        let user_cache = user_cache.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = user_cache.warmup(users.as_ref()).await {
                error!(error = %e, "Failed to warm up user cache");
            }
        });
    }

    let vacation_service = Data::new(VacationService::new(
        requests,
        users.clone(),
        user_cache.clone(),
        Arc::new(SystemClock),
    ));
    let user_service = Data::new(UserService::new(users, user_cache, email_filter));
    let limiter = routes::build_limiter(config.rate_per_min)?;

    let openapi = ApiDoc::under_prefix(&config.api_prefix);
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        let limiter = limiter.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(config.clone())
            .app_data(vacation_service.clone())
            .app_data(user_service.clone())
            .configure(|cfg| routes::configure(cfg, &config, limiter))
            .default_service(web::to(routes::not_found))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
