#![allow(dead_code)]

use reqwest::{Client, Response, StatusCode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use storefront_api::api::create_api_router;
use storefront_api::entities::setup_schema;

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

pub struct TestApp {
    pub base_url: String,
    pub client: Client,
}

/// A fresh SQLite file with the schema in place.
pub async fn test_db() -> DatabaseConnection {
    let path = std::env::temp_dir().join(format!(
        "storefront-test-{}-{}.db",
        std::process::id(),
        NEXT_DB.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&path);

    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open test database");
    setup_schema(&db).await.expect("Failed to create schema");
    db
}

/// Starts the server on a random port over [`test_db`].
pub async fn spawn_app() -> TestApp {
    let db = test_db().await;
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    let app = create_api_router(Arc::new(db));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server crashed");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        client: Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request")
    }

    pub async fn create_product(&self, name: &str, price: f64, category: &str) -> Value {
        let response = self
            .post(
                "products",
                &json!({ "name": name, "price": price, "category": category }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Value {
        let response = self
            .post(
                "users",
                &json!({ "name": name, "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    pub async fn create_order(&self, user_id: i64, total: f64) -> Value {
        let response = self
            .post(
                "orders",
                &json!({ "userId": user_id, "total": total, "status": "pending" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }
}

pub async fn json_body(response: Response) -> Value {
    response
        .json::<Value>()
        .await
        .expect("Failed to parse response JSON")
}

/// Asserts the status and error code of a failed request.
pub async fn assert_error(response: Response, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status(), status);
    let body = json_body(response).await;
    assert_eq!(body["code"], code, "unexpected body: {body}");
    assert!(body["error"].is_string());
    body
}

pub fn id(value: &Value) -> i64 {
    value["id"].as_i64().expect("record has no id")
}
