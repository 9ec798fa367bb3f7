// HTTP API tests against the in-memory backend

use actix_web::{http::StatusCode, test, web, App};
use fueleu_core::{ComplianceBalance, ComplianceService, ComplianceStore, IntensityParams, MemoryStore};
use fueleu_engine::handlers;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;

fn service_data(store: Arc<MemoryStore>) -> web::Data<Arc<ComplianceService>> {
    web::Data::new(Arc::new(ComplianceService::new(
        store,
        IntensityParams::default(),
    )))
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(service_data($store))
                .configure(handlers::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_list_routes() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::get().uri("/routes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let routes = body.as_array().unwrap();
    assert_eq!(routes.len(), 5);
    assert_eq!(routes[0]["routeId"], "R001");
    assert_eq!(routes[0]["isBaseline"], true);
    assert_eq!(routes[1]["ghgIntensity"], 88.0);
}

#[actix_web::test]
async fn test_comparison_and_baseline_switch() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::get().uri("/routes/comparison").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["routeId"] != "R001"));
    assert!(rows.iter().all(|row| row["baselineGhgIntensity"] == 91.0));

    let req = test::TestRequest::post().uri("/routes/R002/baseline").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["routeId"], "R002");
    assert_eq!(body["isBaseline"], true);

    let req = test::TestRequest::get().uri("/routes").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let baselines: Vec<&Value> = body
        .as_array()
        .unwrap()
        .iter()
        .filter(|route| route["isBaseline"] == true)
        .collect();
    assert_eq!(baselines.len(), 1);
    assert_eq!(baselines[0]["routeId"], "R002");
}

#[actix_web::test]
async fn test_comparison_without_baseline_is_500() {
    let routes = fueleu_core::memory::seed_routes().into_iter().map(|mut route| {
        route.is_baseline = false;
        route
    });
    let app = app!(Arc::new(MemoryStore::with_routes(routes)));

    let req = test::TestRequest::get().uri("/routes/comparison").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No baseline route found");
}

#[actix_web::test]
async fn test_unknown_route_baseline_is_500() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::post().uri("/routes/R999/baseline").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Route not found: R999");
}

#[actix_web::test]
async fn test_compliance_cb_requires_query() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    for uri in [
        "/compliance/cb",
        "/compliance/cb?shipId=R002",
        "/compliance/adjusted-cb?year=2024",
        "/compliance/cb?shipId=R002&year=abc",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "shipId and year are required");
    }
}

#[actix_web::test]
async fn test_compliance_cb_from_route() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::get()
        .uri("/compliance/cb?shipId=R002&year=2024")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["shipId"], "R002");
    assert_eq!(body["year"], 2024);
    assert_eq!(body["cbGco2Eq"], 263082240.0);
}

#[actix_web::test]
async fn test_adjusted_cb_defaults_to_zero() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::get()
        .uri("/compliance/adjusted-cb?shipId=R404&year=2024")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"shipId": "R404", "year": 2024, "adjustedCb": 0.0}));
}

#[actix_web::test]
async fn test_bank_and_apply_flow() {
    let store = Arc::new(MemoryStore::seeded());
    store
        .save_compliance(&ComplianceBalance::new("R002", 2024, dec!(50)))
        .await
        .unwrap();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/banking/bank")
        .set_json(json!({"shipId": "R002", "year": 2024}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["amountGco2Eq"], 50.0);

    let req = test::TestRequest::post()
        .uri("/banking/apply")
        .set_json(json!({"shipId": "R002", "year": 2024, "amount": 30}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"success": true}));

    let req = test::TestRequest::post()
        .uri("/banking/apply")
        .set_json(json!({"shipId": "R002", "year": 2024, "amount": 30}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "Insufficient banked amount. Available: 20, Requested: 30"
    );
    assert_eq!(body["type"], "insufficient_banked");

    let req = test::TestRequest::get()
        .uri("/compliance/adjusted-cb?shipId=R002&year=2024")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["adjustedCb"], 30.0);
}

#[actix_web::test]
async fn test_bank_deficit_is_500() {
    let store = Arc::new(MemoryStore::seeded());
    store
        .save_compliance(&ComplianceBalance::new("R001", 2024, dec!(-10)))
        .await
        .unwrap();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/banking/bank")
        .set_json(json!({"shipId": "R001", "year": 2024}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No surplus to bank: compliance balance is -10");
}

#[actix_web::test]
async fn test_banking_validation() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let cases = [
        ("/banking/bank", json!({"shipId": "R002"}), "shipId and year are required"),
        ("/banking/bank", json!({"year": 2024}), "shipId and year are required"),
        (
            "/banking/apply",
            json!({"shipId": "R002", "year": 2024}),
            "shipId, year, and amount are required",
        ),
        (
            "/banking/apply",
            json!({"shipId": "R002", "year": 2024, "amount": 0}),
            "shipId, year, and amount are required",
        ),
        ("/pools", json!({"year": 2024}), "year and shipIds array are required"),
        ("/pools", json!({"shipIds": ["R001"]}), "year and shipIds array are required"),
    ];

    for (uri, payload, message) in cases {
        let req = test::TestRequest::post().uri(uri).set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{} {}", uri, payload);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], message);
        assert_eq!(body["code"], 400);
    }
}

#[actix_web::test]
async fn test_malformed_json_is_400() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::post()
        .uri("/pools")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_create_and_fetch_pool() {
    let store = Arc::new(MemoryStore::seeded());
    store
        .save_compliance(&ComplianceBalance::new("R002", 2024, dec!(300)))
        .await
        .unwrap();
    store
        .save_compliance(&ComplianceBalance::new("R003", 2024, dec!(-120)))
        .await
        .unwrap();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/pools")
        .set_json(json!({"year": 2024, "shipIds": ["R002", "R003"]}))
        .to_request();
    let pool: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(pool["year"], 2024);
    assert_eq!(
        pool["members"],
        json!([
            {"shipId": "R002", "cbBefore": 300.0, "cbAfter": 300.0},
            {"shipId": "R003", "cbBefore": -120.0, "cbAfter": -120.0}
        ])
    );

    let id = pool["id"].as_str().unwrap();
    let req = test::TestRequest::get().uri(&format!("/pools/{}", id)).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, pool);
}

#[actix_web::test]
async fn test_health_and_metrics() {
    let app = app!(Arc::new(MemoryStore::seeded()));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "fueleu-engine");

    let req = test::TestRequest::post().uri("/routes/R003/baseline").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("baseline_changes_total"));
}

#[actix_web::test]
async fn test_year_as_numeric_string() {
    let store = Arc::new(MemoryStore::seeded());
    store
        .save_compliance(&ComplianceBalance::new("R002", 2024, dec!(50)))
        .await
        .unwrap();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/banking/bank")
        .set_json(json!({"shipId": "R002", "year": "2024"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["year"], 2024);
    assert_eq!(body["amountGco2Eq"], 50.0);

    let req = test::TestRequest::post()
        .uri("/banking/apply")
        .set_json(json!({"shipId": "R002", "year": "2024", "amount": 20}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/banking/bank")
        .set_json(json!({"shipId": "R002", "year": "twenty"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "shipId and year are required");
}
