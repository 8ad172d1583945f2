use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod payroll;
mod repo;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::payroll::service::PayrollService;
use crate::repo::AttendanceRepository;
use crate::repo::mysql::MySqlRepository;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        standard_hours = %config.policy.standard_hours,
        ot_multiplier = %config.policy.ot_multiplier,
        deduction_rate = %config.policy.deduction_rate,
        "Server starting..."
    );

    let pool = init_db(&config.database_url, config.run_migrations).await?;
    let repo = Arc::new(MySqlRepository::new(pool));

    let payroll_service = Data::new(PayrollService::new(
        repo.clone(),
        config.policy,
        Duration::from_secs(config.period_lock_idle_secs),
    ));
    let attendance_store: Data<dyn AttendanceRepository> =
        Data::from(repo as Arc<dyn AttendanceRepository>);
    let limiter = routes::limiter_config(config.rate_protected_per_min)?;

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(payroll_service.clone())
            .app_data(attendance_store.clone())
            .service(health)
            // Protected routes with auth + rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
