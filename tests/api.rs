use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::{json, Value};
use std::sync::Arc;

use solvy::config::Config;
use solvy::server::AppServices;
use solvy::services::retry::RetryConfig;
use solvy::services::seed::STAR_PENTAGON_ID;
use solvy::services::{InMemoryProblemRepository, SolutionDrafter};

const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

async fn services() -> AppServices {
    AppServices::with_repository(
        Config::default(),
        Arc::new(InMemoryProblemRepository::new()),
        SolutionDrafter::new(None, RetryConfig::none()),
    )
    .await
    .unwrap()
}

macro_rules! app {
    ($services:expr) => {{
        let services = $services;
        test::init_service(App::new().configure(|cfg| services.configure(cfg))).await
    }};
}

#[actix_web::test]
async fn upload_then_walk_the_matched_problem() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/analysis/upload")
        .set_json(json!({ "imageBase64": IMAGE }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let matched = body["data"]["matchedProblemId"]
        .as_str()
        .expect("analysis should match a seeded problem")
        .to_string();
    let confidence = body["data"]["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));

    let req = test::TestRequest::get()
        .uri(&format!("/api/problems/{}", matched))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], matched.as_str());

    let req = test::TestRequest::post()
        .uri("/api/analysis/guidance")
        .set_json(json!({ "problemId": matched, "currentStep": 1 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["currentStep"], 1);
    assert_eq!(body["data"]["totalSteps"], 4);
}

#[actix_web::test]
async fn each_step_has_its_own_hint() {
    let app = app!(services().await);

    let mut hints = Vec::new();
    for step in 1..=4 {
        let req = test::TestRequest::post()
            .uri("/api/analysis/guidance")
            .set_json(json!({ "problemId": STAR_PENTAGON_ID, "currentStep": step }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["currentStep"], step);
        hints.push(body["data"]["hint"].as_str().unwrap().to_string());
    }
    hints.sort();
    hints.dedup();
    assert_eq!(hints.len(), 4);
}

#[actix_web::test]
async fn step_past_the_end_is_a_client_error() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/analysis/guidance")
        .set_json(json!({ "problemId": STAR_PENTAGON_ID, "currentStep": 5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("5"));
}

#[actix_web::test]
async fn guidance_for_unknown_problem_is_not_found() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/analysis/guidance")
        .set_json(json!({ "problemId": "no-such-problem", "currentStep": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn upload_without_image_is_rejected() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/analysis/upload")
        .set_json(json!({ "problemType": "geometry" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Image data is required"));
}

#[actix_web::test]
async fn unknown_problem_is_not_found() {
    let app = app!(services().await);

    let req = test::TestRequest::get()
        .uri("/api/problems/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Problem not found"));
}

#[actix_web::test]
async fn create_fills_defaults_and_is_listed() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/problems")
        .set_json(json!({ "title": "Angle sum of a triangle" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let created = &body["data"];
    assert_eq!(created["level"], "high-school");
    assert_eq!(created["category"], "general");
    assert_eq!(created["keywords"], json!([]));
    assert_eq!(created["solutionSteps"], json!([]));

    let req = test::TestRequest::get().uri("/api/problems").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[2]["id"], created["id"]);
}

#[actix_web::test]
async fn create_without_title_is_rejected() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/problems")
        .set_json(json!({ "category": "geometry" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn search_matches_category_and_keywords() {
    let app = app!(services().await);

    let req = test::TestRequest::get()
        .uri("/api/problems/search?q=geometry")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], STAR_PENTAGON_ID);

    let req = test::TestRequest::get()
        .uri("/api/problems/search?q=nonexistent-term-xyz")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = app!(services().await);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn malformed_body_uses_framework_error_shape() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/problems")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["statusCode"], 400);
    assert!(body["error"]["message"].is_string());
    assert!(body["error"].get("details").is_none());
}

#[actix_web::test]
async fn development_mode_adds_error_details() {
    let mut services = services().await;
    services.config.development = true;
    let app = app!(services);

    let req = test::TestRequest::get().uri("/api/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["statusCode"], 404);
    assert_eq!(body["error"]["details"], "GET /api/nowhere");
}

#[actix_web::test]
async fn oversized_body_is_rejected() {
    let mut services = services().await;
    services.config.max_body_bytes = 64;
    let app = app!(services);

    let req = test::TestRequest::post()
        .uri("/api/analysis/upload")
        .set_json(json!({ "imageBase64": IMAGE }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn drafting_without_a_generator_is_unavailable() {
    let app = app!(services().await);

    let req = test::TestRequest::post()
        .uri("/api/admin/generate-solution")
        .set_json(json!({ "title": "Star pentagon angles" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}
