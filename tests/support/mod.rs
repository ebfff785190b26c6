#![allow(dead_code)]

use std::str::FromStr;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use finance_tracker_api::backend::{build_router, AppState, Clock};
use finance_tracker_api::config::Config;
use finance_tracker_api::database::db::{connection, migrate};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

pub async fn test_pool() -> Pool<Sqlite> {
    let pool = connection::memory_pool().await.expect("memory pool");
    migrate::run_migrations(&pool).await.expect("migrations");
    pool
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
}

impl TestApp {
    /// App whose clock is frozen at `now` ("YYYY-MM-DD HH:MM:SS").
    pub async fn at(now: &str) -> Self {
        Self::with_config(now, Config::default()).await
    }

    pub async fn with_config(now: &str, config: Config) -> Self {
        let pool = test_pool().await;
        let state = AppState::new(pool.clone(), config).with_clock(Clock::Fixed(at(now)));
        Self {
            router: build_router(state),
            pool,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder.header("x-user-id", id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: i64) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: i64, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: i64, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: i64) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(user), None).await
    }

    pub async fn create_user(&self, name: &str) -> i64 {
        let (status, body) = self
            .request(Method::POST, "/users", None, Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("user id")
    }

    pub async fn create_bill(&self, user: i64, name: &str, amount: &str, due_date: &str) -> i64 {
        let (status, body) = self
            .post(
                "/bills",
                user,
                json!({
                    "name": name,
                    "category": "Bills",
                    "amount": amount,
                    "dueDate": due_date,
                    "theme": "#277C78",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("bill id")
    }

    pub async fn create_transaction(
        &self,
        user: i64,
        name: &str,
        category: &str,
        amount: &str,
        date: &str,
        recurring_id: Option<i64>,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/transactions",
                user,
                json!({
                    "name": name,
                    "category": category,
                    "amount": amount,
                    "date": date,
                    "theme": "#82C9D7",
                    "recurringId": recurring_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("transaction id")
    }
}

/// Money fields are serialized as decimal strings.
pub fn dec(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal")
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal")
}
