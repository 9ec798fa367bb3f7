use crate::errors::EngineError;
use crate::metrics;
use crate::models::{ApplyBankedRequest, CreatePoolRequest, ShipYear, SHIP_YEAR_REQUIRED};
use actix_web::{web, HttpResponse};
use fueleu_core::ComplianceService;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

type Service = web::Data<Arc<ComplianceService>>;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": crate::SERVICE_NAME,
        "version": crate::VERSION
    }))
}

/// List all routes
pub async fn get_routes(service: Service) -> Result<HttpResponse, EngineError> {
    let routes = service.get_routes().await?;
    Ok(HttpResponse::Ok().json(routes))
}

/// Get a single route by its route id
pub async fn get_route(
    service: Service,
    route_id: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let route = service.get_route(&route_id).await?;
    Ok(HttpResponse::Ok().json(route))
}

/// Make a route the sole baseline
pub async fn set_baseline(
    service: Service,
    route_id: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let route = service.set_baseline(&route_id).await?;
    metrics::BASELINE_CHANGES.inc();
    Ok(HttpResponse::Ok().json(route))
}

/// Compare every route against the baseline
pub async fn get_comparison(service: Service) -> Result<HttpResponse, EngineError> {
    let comparisons = service.compare_routes().await?;
    Ok(HttpResponse::Ok().json(comparisons))
}

/// Compliance balance for a ship-year
pub async fn get_compliance_balance(
    service: Service,
    query: web::Query<ShipYear>,
) -> Result<HttpResponse, EngineError> {
    let (ship_id, year) = query.into_inner().into_parts()?;
    let balance = service.get_compliance_balance(&ship_id, year).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Compliance balance net of banked surplus
pub async fn get_adjusted_cb(
    service: Service,
    query: web::Query<ShipYear>,
) -> Result<HttpResponse, EngineError> {
    let (ship_id, year) = query.into_inner().into_parts()?;
    let adjusted = service.get_adjusted_cb(&ship_id, year).await?;
    Ok(HttpResponse::Ok().json(adjusted))
}

/// Bank the full surplus of a ship-year
pub async fn bank_surplus(
    service: Service,
    request: web::Json<ShipYear>,
) -> Result<HttpResponse, EngineError> {
    let (ship_id, year) = request.into_inner().into_parts()?;
    let entry = service.bank_surplus(&ship_id, year).await?;
    metrics::SURPLUS_BANKED.inc();
    Ok(HttpResponse::Ok().json(entry))
}

/// Apply part of the banked surplus
pub async fn apply_banked(
    service: Service,
    request: web::Json<ApplyBankedRequest>,
) -> Result<HttpResponse, EngineError> {
    let (ship_id, year, amount) = request.into_inner().into_parts()?;
    service.apply_banked(&ship_id, year, amount).await?;
    metrics::BANKED_APPLIED.inc();
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Create a pool from the ships' current adjusted balances
pub async fn create_pool(
    service: Service,
    request: web::Json<CreatePoolRequest>,
) -> Result<HttpResponse, EngineError> {
    let (year, ship_ids) = request.into_inner().into_parts()?;
    let pool = service.create_pool(year, &ship_ids).await?;
    metrics::POOLS_CREATED.inc();
    Ok(HttpResponse::Ok().json(pool))
}

/// Fetch a pool by id
pub async fn get_pool(
    service: Service,
    pool_id: web::Path<Uuid>,
) -> Result<HttpResponse, EngineError> {
    let pool = service.get_pool(*pool_id).await?;
    Ok(HttpResponse::Ok().json(pool))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> HttpResponse {
    match metrics::metrics_handler() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Failed to gather metrics",
            "details": e.to_string()
        })),
    }
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|_, _| EngineError::Validation("invalid JSON payload").into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|_, _| EngineError::Validation(SHIP_YEAR_REQUIRED).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_, _| EngineError::Validation("invalid path parameter").into()),
    )
    .service(
        web::scope("/routes")
            .route("", web::get().to(get_routes))
            .route("/comparison", web::get().to(get_comparison))
            .route("/{route_id}", web::get().to(get_route))
            .route("/{route_id}/baseline", web::post().to(set_baseline)),
    )
    .service(
        web::scope("/compliance")
            .route("/cb", web::get().to(get_compliance_balance))
            .route("/adjusted-cb", web::get().to(get_adjusted_cb)),
    )
    .service(
        web::scope("/banking")
            .route("/bank", web::post().to(bank_surplus))
            .route("/apply", web::post().to(apply_banked)),
    )
    .service(
        web::scope("/pools")
            .route("", web::post().to(create_pool))
            .route("/{id}", web::get().to(get_pool)),
    )
    .route("/metrics", web::get().to(metrics_endpoint))
    .route("/health", web::get().to(health_check));
}
