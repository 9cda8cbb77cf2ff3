//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::{AppState, Config};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = api::build_state(&config).await.unwrap();
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn setup() -> Router {
    setup_with_config(Config::default()).await.0
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn with_token(app: &Router, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["eventBus"], "open");
    assert_eq!(json["handlers"], 3);
}

#[tokio::test]
async fn test_health_reports_closed_bus() {
    let (app, state) = setup_with_config(Config::default()).await;
    state.shutdown();

    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["handlers"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    get(&app, "/api/users").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

mod users {
    use super::*;

    #[tokio::test]
    async fn test_list_demo_users() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/users?limit=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["pagination"]["total"], 4);
        assert_eq!(json["pagination"]["limit"], 2);
        assert_eq!(json["pagination"]["hasMore"], true);
    }

    #[tokio::test]
    async fn test_list_filters_by_email() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/users?email=ana.rojas@mef.gob.pe").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 1);
        assert_eq!(json["data"][0]["id"], "user-003");
        assert_eq!(json["data"][0]["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/users",
            json!({ "email": "Rosa.Quispe@mef.gob.pe", "name": "Rosa Quispe" }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["email"], "rosa.quispe@mef.gob.pe");
        assert_eq!(json["data"]["status"], "PENDING");
        assert_eq!(json["data"]["isActive"], false);

        let id = json["data"]["id"].as_str().unwrap().to_string();
        let (status, json) = get(&app, &format!("/api/users/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Rosa Quispe");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/users",
            json!({ "email": "carlos.mendoza@mef.gob.pe", "name": "Otro Carlos" }),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "USER_ALREADY_EXISTS");
        assert_eq!(json["error"], "Conflict");
    }

    #[tokio::test]
    async fn test_invalid_email_is_bad_request() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/users",
            json!({ "email": "not-an-email", "name": "Nadie" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_EMAIL");
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/users/user-999").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_user_name() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "PUT",
            "/api/users/user-004",
            json!({ "name": "Luis A. Fernández" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Luis A. Fernández");
        assert_eq!(json["data"]["email"], "luis.fernandez@mef.gob.pe");
    }

    #[tokio::test]
    async fn test_activate_pending_user_once() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "PATCH",
            "/api/users/user-003/activate",
            json!({ "activatedBy": "admin@mef.gob.pe", "reason": "Documents verified" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ACTIVE");

        let (status, json) = send_json(&app, "PATCH", "/api/users/user-003/activate", json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_USER_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_activate_without_body() {
        let app = setup().await;
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/users/user-003/activate")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["isActive"], true);
    }

    #[tokio::test]
    async fn test_suspend_user() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/users/user-002/suspend",
            json!({ "reason": "Policy violation" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "SUSPENDED");
        assert_eq!(json["data"]["isActive"], false);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = setup().await;
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/users/user-004")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = get(&app, "/api/users/user-004").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, json) = get(&app, "/api/users").await;
        assert_eq!(json["pagination"]["total"], 3);
    }
}

mod products {
    use super::*;

    #[tokio::test]
    async fn test_list_demo_products() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 6);
        assert_eq!(json["pagination"]["hasMore"], false);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = setup().await;

        let (_, json) = get(&app, "/api/products?availableOnly=true").await;
        assert_eq!(json["pagination"]["total"], 5);

        let (_, json) = get(&app, "/api/products?category=SERVICIOS").await;
        assert_eq!(json["pagination"]["total"], 2);

        let (_, json) = get(&app, "/api/products?minPrice=10000&maxPrice=30000").await;
        let ids: Vec<&str> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"prod-001"));
        assert!(ids.contains(&"prod-005"));
        assert!(!ids.contains(&"prod-006"));
    }

    #[tokio::test]
    async fn test_search() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/products/search?q=auditor").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 1);
        assert_eq!(json["data"][0]["id"], "prod-005");

        let (status, json) = get(&app, "/api/products/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_get_product() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/products/prod-001").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Licencia Software Contable");
        assert_eq!(json["data"]["price"]["amount"], 15000.0);
        assert_eq!(json["data"]["price"]["currency"], "PEN");
        assert_eq!(json["data"]["isAvailable"], true);

        let (status, json) = get(&app, "/api/products/prod-999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "PRODUCT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_product() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products",
            json!({
                "name": "Firma Digital",
                "description": "Certificado de firma digital",
                "price": 120.5,
                "currency": "PEN",
                "stock": 40,
                "category": "software"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["stock"], 40);
        assert_eq!(json["data"]["price"]["amount"], 120.5);

        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products",
            json!({ "name": "Bad", "price": 1.0, "currency": "XYZ", "stock": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_MONEY");
    }

    #[tokio::test]
    async fn test_update_product_and_stock() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "PUT",
            "/api/products/prod-003",
            json!({ "name": "Capacitación Avanzada" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Capacitación Avanzada");
        assert_eq!(json["data"]["stock"], 50);

        let (status, json) = send_json(
            &app,
            "PUT",
            "/api/products/prod-006/stock",
            json!({ "stock": 12 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["stock"], 12);
        assert_eq!(json["data"]["isAvailable"], true);
    }

    #[tokio::test]
    async fn test_reserve_stock() {
        let app = setup().await;
        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products/prod-004/reserve",
            json!({ "userId": "user-002", "quantity": 2 }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["productId"], "prod-004");
        assert_eq!(json["data"]["quantity"], 2);
        assert_eq!(json["data"]["status"], "active");
        assert!(json["data"]["id"].as_str().unwrap().starts_with("reservation-"));

        let (_, json) = get(&app, "/api/products/prod-004").await;
        assert_eq!(json["data"]["stock"], 3);
    }

    #[tokio::test]
    async fn test_reserve_rejections() {
        let app = setup().await;

        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products/prod-005/reserve",
            json!({ "userId": "user-001", "quantity": 4 }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "PRODUCT_NOT_AVAILABLE");

        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products/prod-005/reserve",
            json!({ "userId": "user-001", "quantity": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_QUANTITY");

        let (status, json) = send_json(
            &app,
            "POST",
            "/api/products/prod-005/reserve",
            json!({ "userId": "user-999", "quantity": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "USER_NOT_FOUND");

        let (_, json) = get(&app, "/api/products/prod-005").await;
        assert_eq!(json["data"]["stock"], 3);
    }

    #[tokio::test]
    async fn test_delete_product() {
        let app = setup().await;
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/products/prod-002")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = get(&app, "/api/products/prod-002").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod auth {
    use super::*;

    async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        send_json(
            app,
            "POST",
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    #[tokio::test]
    async fn test_login_me_logout() {
        let app = setup().await;
        let (status, json) = login(&app, "admin@mef.gob.pe", "admin123").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["user"]["role"], "admin");
        assert_eq!(json["data"]["expiresIn"], 28800);
        assert_eq!(json["data"]["tokenType"], "Bearer");
        let token = json["data"]["token"].as_str().unwrap().to_string();

        let (status, json) = with_token(&app, "GET", "/api/auth/me", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["email"], "admin@mef.gob.pe");

        let (status, _) = with_token(&app, "POST", "/api/auth/logout", &token).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = with_token(&app, "GET", "/api/auth/me", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let app = setup().await;
        let (status, json) = login(&app, "admin@mef.gob.pe", "wrong").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = setup().await;
        let (status, json) = get(&app, "/api/auth/me").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let app = setup().await;
        let (_, json) = login(&app, "user@mef.gob.pe", "user123").await;
        let token = json["data"]["token"].as_str().unwrap().to_string();

        let (status, json) = with_token(&app, "POST", "/api/auth/refresh", &token).await;
        assert_eq!(status, StatusCode::OK);
        let renewed = json["data"]["token"].as_str().unwrap().to_string();
        assert_ne!(renewed, token);

        let (status, _) = with_token(&app, "GET", "/api/auth/me", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, json) = with_token(&app, "GET", "/api/auth/me", &renewed).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], "user-002");
    }

    #[tokio::test]
    async fn test_activation_uses_signed_in_account() {
        let (app, state) = setup_with_config(Config::default()).await;
        let (_, issued) = state.auth.login("admin@mef.gob.pe", "admin123").unwrap();

        let request = Request::builder()
            .method("PATCH")
            .uri("/api/users/user-003/activate")
            .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ACTIVE");
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_path: Some(dir.path().join("catalog.json")),
            ..Config::default()
        };

        let (app, _) = setup_with_config(config.clone()).await;
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/users",
            json!({ "email": "persisted@mef.gob.pe", "name": "Persisted User" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (app, _) = setup_with_config(config).await;
        let (_, json) = get(&app, "/api/users?email=persisted@mef.gob.pe").await;
        assert_eq!(json["pagination"]["total"], 1);

        let (_, json) = get(&app, "/api/users").await;
        assert_eq!(json["pagination"]["total"], 5);
    }

    #[tokio::test]
    async fn test_seeding_can_be_disabled() {
        let config = Config {
            seed_demo_data: false,
            ..Config::default()
        };
        let (app, _) = setup_with_config(config).await;

        let (_, json) = get(&app, "/api/products").await;
        assert_eq!(json["pagination"]["total"], 0);
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
    }
}
