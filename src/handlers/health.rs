use actix_web::{web, HttpRequest, HttpResponse};

use crate::config::Config;
use crate::models::HealthResponse;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Catch-all for unknown routes
pub async fn not_found(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    let details = format!("{} {}", req.method(), req.path());
    crate::server::framework_error(
        actix_web::http::StatusCode::NOT_FOUND,
        "Route not found",
        &details,
        config.development,
    )
}
