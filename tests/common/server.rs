//! Test server lifecycle management
//!
//! This module manages spawning and shutting down the in-process bookstore
//! API that flows run against. Each test gets an isolated server with its
//! own issued tokens and order store.

use super::constants::*;
use super::fixtures::{book_summaries, books};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct BookstoreState {
    /// Access tokens issued via POST /api-clients/
    tokens: HashSet<String>,
    orders: Vec<Value>,
}

type SharedState = Arc<Mutex<BookstoreState>>;

/// Test server instance with isolated state
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private field - keeps the server alive until drop
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Builds the bookstore router with empty state
    /// 2. Binds to a random port (127.0.0.1:0)
    /// 3. Spawns the server in a background task
    /// 4. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Port binding fails
    /// - Server fails to start
    /// - Server doesn't become ready within timeout
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(BookstoreState::default()));

        let app = Router::new()
            .route("/status", get(get_status))
            .route("/api-clients/", post(register_client))
            .route("/books", get(list_books))
            .route("/books/{id}", get(get_book))
            .route("/orders", post(create_order).get(list_orders))
            .route(
                "/orders/{id}",
                get(get_order).patch(update_order).delete(delete_order),
            )
            .with_state(state);

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /status endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/status", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    // Server is ready
                    return;
                }
                _ => {
                    // Server not ready yet, wait and retry
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn get_status() -> Json<Value> {
    Json(json!({"status": "OK"}))
}

async fn register_client(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if body.get("clientName").and_then(Value::as_str).is_none()
        || body.get("clientEmail").and_then(Value::as_str).is_none()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid or missing client name."})),
        )
            .into_response();
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    state.lock().unwrap().tokens.insert(token.clone());

    (StatusCode::CREATED, Json(json!({"accessToken": token}))).into_response()
}

async fn list_books() -> Json<Value> {
    Json(Value::Array(book_summaries()))
}

async fn get_book(Path(id): Path<u64>) -> Response {
    match books().into_iter().find(|book| book["id"] == id) {
        Some(book) => Json(book).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("No book with id {}", id)})),
        )
            .into_response(),
    }
}

async fn create_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let Some(book_id) = body.get("bookId").and_then(Value::as_u64) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid or missing bookId."})),
        )
            .into_response();
    };
    let customer_name = body
        .get("customerName")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let order_id = uuid::Uuid::new_v4().simple().to_string();
    let order = json!({
        "id": order_id.clone(),
        "bookId": book_id,
        "customerName": customer_name,
        "quantity": 1
    });
    state.lock().unwrap().orders.push(order);

    (
        StatusCode::CREATED,
        Json(json!({"created": true, "orderId": order_id})),
    )
        .into_response()
}

async fn list_orders(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let orders = state.lock().unwrap().orders.clone();
    Json(Value::Array(orders)).into_response()
}

async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let order = state
        .lock()
        .unwrap()
        .orders
        .iter()
        .find(|order| order["id"] == id.as_str())
        .cloned();

    match order {
        Some(order) => Json(order).into_response(),
        None => order_not_found(&id),
    }
}

async fn update_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let mut guard = state.lock().unwrap();
    let Some(order) = guard
        .orders
        .iter_mut()
        .find(|order| order["id"] == id.as_str())
    else {
        return order_not_found(&id);
    };

    if let Some(customer_name) = body.get("customerName").and_then(Value::as_str) {
        order["customerName"] = json!(customer_name);
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn delete_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let mut guard = state.lock().unwrap();
    let count_before = guard.orders.len();
    guard.orders.retain(|order| order["id"] != id.as_str());

    if guard.orders.len() == count_before {
        return order_not_found(&id);
    }

    StatusCode::NO_CONTENT.into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn authorized(state: &SharedState, headers: &HeaderMap) -> bool {
    bearer_token(headers).is_some_and(|token| state.lock().unwrap().tokens.contains(&token))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid bearer token."})),
    )
        .into_response()
}

fn order_not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("No order with id {}.", id)})),
    )
        .into_response()
}
