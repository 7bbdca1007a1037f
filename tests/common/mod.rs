#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use swingbook::adapters::sqlite_adapter::SqliteAdapter;
use swingbook::domain::settings::Settings;

pub fn test_settings() -> Settings {
    Settings {
        database_path: ":memory:".to_string(),
        pool_size: 1,
        listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
        secure_cookies: false,
        session_secret: None,
        session_lifetime: 86_400,
        session_store: None,
        default_capital: 500_000.0,
    }
}

pub fn memory_store() -> Arc<SqliteAdapter> {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Arc::new(store)
}

pub fn trade_json(symbol: &str, buy_price: f64, qty: f64) -> serde_json::Value {
    serde_json::json!({
        "symbol": symbol,
        "buy_price": buy_price,
        "qty": qty,
        "sl": buy_price * 0.95,
        "buy_date": "2024-05-02",
    })
}

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "web")]
mod web {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, Response, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use swingbook::adapters::web::{AppState, build_test_router};
    use tower::ServiceExt;

    pub fn test_state(store: Arc<SqliteAdapter>) -> AppState {
        AppState {
            ledger: store.clone(),
            users: store,
            settings: test_settings(),
        }
    }

    pub fn create_test_app() -> Router {
        build_test_router(test_state(memory_store()))
    }

    pub fn extract_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn build_cookie_header(set_cookies: &[String]) -> String {
        set_cookies
            .iter()
            .map(|sc| sc.split(';').next().unwrap_or("").to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn json_request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    /// Signs up a fresh user and returns the session cookie header.
    pub async fn signup(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signup",
                None,
                &serde_json::json!({ "email": email, "password": "secret123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        build_cookie_header(&extract_cookies(&response))
    }

    /// Sends a request and decodes the JSON reply, asserting on the status.
    pub async fn call(
        app: &Router,
        request: Request<Body>,
        expected: StatusCode,
    ) -> serde_json::Value {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), expected);
        body_json(response).await
    }
}
