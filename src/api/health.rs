use actix_web::{HttpResponse, Responder, get, web};
use chrono::Utc;
use serde_json::json;

use crate::config::Config;

#[get("/health")]
pub async fn health(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Vacation Management API is running",
        "timestamp": Utc::now().to_rfc3339(),
        "store": config.store_backend.as_ref(),
    }))
}

#[get("/")]
pub async fn index(config: web::Data<Config>) -> impl Responder {
    let prefix = &config.api_prefix;
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to Vacation Management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": format!("{prefix}/users"),
            "vacationRequests": format!("{prefix}/vacation-requests"),
            "health": "/health",
            "docs": "/swagger-ui/",
        }
    }))
}
