//! HTTP tests driving the router with an in-memory catalog snapshot.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use energy_broker::cache::CatalogCache;
use energy_broker::config::Config;
use energy_broker::studies::{EngineParams, StudyService, StudyStore};
use energy_broker::tariffs::models::{
    DecimalRange, EnergyType, Lifecycle, Margin, MarginType, Rate, RateType,
};
use energy_broker::tariffs::TariffCatalog;
use energy_broker::{build_router, AppState};

fn catalog() -> TariffCatalog {
    let mut catalog = TariffCatalog::new();
    catalog
        .insert_rate_type(RateType {
            id: 1,
            name: "2.0TD".to_string(),
            energy_type: EnergyType::Electricity,
            power_range: Some(DecimalRange::new("rate_type", "power", dec!(5), dec!(15)).unwrap()),
            consumption_range: Some(
                DecimalRange::new("rate_type", "consumption", dec!(1000), dec!(5000)).unwrap(),
            ),
            is_active: true,
            lifecycle: Lifecycle::Active,
        })
        .unwrap();
    catalog
        .insert_rate(Rate {
            id: 10,
            name: "Tarifa Estable".to_string(),
            rate_type_id: 1,
            marketer_id: 1,
            energy_prices: vec![
                dec!(0.10),
                dec!(0.12),
                dec!(0.08),
                dec!(0.09),
                dec!(0.11),
                dec!(0.07),
            ],
            power_prices: vec![dec!(0.1); 6],
            fixed_term_price: dec!(5),
            is_full_renewable: false,
            has_net_metering: false,
            is_active: true,
            lifecycle: Lifecycle::Active,
            valid_from: None,
            valid_to: None,
        })
        .unwrap();
    catalog
        .insert_margin(
            Margin::new(
                1,
                None,
                MarginType::Consumption,
                DecimalRange::new("margin", "range", dec!(0), dec!(1000000)).unwrap(),
                dec!(0.01),
                dec!(0.03),
            )
            .unwrap(),
        )
        .unwrap();
    catalog
}

async fn app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/energy_broker_test".to_string()),
        _ => None,
    })
    .unwrap();
    // Never connects: every catalog lookup is served from the cache
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    let cache = CatalogCache::new(Duration::from_secs(300));
    cache.insert(EnergyType::Electricity, catalog()).await;

    build_router(AppState {
        db,
        cache,
        studies: StudyService::new(StudyStore::new(), EngineParams::default()),
        config: Arc::new(config),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn amount(value: &Value) -> Decimal {
    Decimal::from_str(value["amount"].as_str().unwrap()).unwrap()
}

fn study_body() -> Value {
    json!({
        "client_type": "particular",
        "cups": "ES0021000000000001AB",
        "energy_type": "electricity",
        "contracted_power": ["10", "10", "10", "10", "10", "10"],
        "consumption": ["500", "500", "500", "500", "500", "500"],
        "analyzed_days": 365,
        "current_prices": {
            "energy_prices": ["0.2", "0.2", "0.2", "0.2", "0.2", "0.2"],
            "power_prices": ["0.1", "0.1", "0.1", "0.1", "0.1", "0.1"],
            "fixed_term_price": "5"
        }
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_study_lifecycle() {
    let app = app().await;

    let (status, study) = send(&app, Method::POST, "/studies", Some(study_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(study["state"], "DRAFT");
    let id = study["id"].as_str().unwrap().to_string();

    let uri = format!("/studies/{}/suggested-rates", id);
    let (status, generated) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let suggestions = generated["suggested_rates"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["rate_id"], 10);
    assert_eq!(amount(&suggestions[0]["total_cost"]), dec!(2565));
    assert_eq!(amount(&suggestions[0]["saving"]), dec!(285));
    let suggested_rate_id = suggestions[0]["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&app, Method::GET, &format!("{}?marketer_id=2", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed["suggested_rates"].as_array().unwrap().is_empty());

    let finish = format!("/studies/{}/finish", id);
    let body = json!({ "suggested_rate_id": suggested_rate_id });
    let (status, finished) = send(&app, Method::POST, &finish, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["state"], "FINISHED");
    assert_eq!(finished["suggested_rate_id"], suggested_rate_id.as_str());

    let (status, error) = send(&app, Method::POST, &finish, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error_type"], "conflict_error");

    let (status, copy) = send(&app, Method::POST, &format!("/studies/{}/duplicate", id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["state"], "DRAFT");
    assert_eq!(copy["suggested_rates_count"], 0);
}

#[tokio::test]
async fn test_ineligible_study() {
    let app = app().await;
    let mut body = study_body();
    body["annual_consumption"] = json!("9000");

    let (_, study) = send(&app, Method::POST, "/studies", Some(body)).await;
    let uri = format!("/studies/{}/suggested-rates", study["id"].as_str().unwrap());
    let (status, error) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_type"], "ineligible_error");
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let app = app().await;

    let mut body = study_body();
    body["analyzed_days"] = json!(0);
    let (status, error) = send(&app, Method::POST, "/studies", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_type"], "validation_error");

    let uri = format!("/studies/{}", uuid::Uuid::new_v4());
    let (status, error) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error_type"], "not_found_error");
}
