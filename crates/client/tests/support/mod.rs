//! In-process fake of the Nutribase backend.
//!
//! Serves the REST routes the client uses from an in-memory directory on an
//! ephemeral port. Tests seed it, point an `ApiClient` at it, then inspect
//! what the client wrote.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{OriginalUri, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nutribase_client::{ApiClient, ApiConfig};
use nutribase_core::{Email, Role, User};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Default)]
pub struct BackendState {
    pub users: Vec<User>,
    pub preferences: HashMap<String, Value>,
    /// Every accepted preference write, in arrival order.
    pub saves: Vec<(String, Value)>,
    /// Number of upcoming preference writes to answer with a 500.
    pub fail_saves: usize,
    pub save_delay: Duration,
    pub points_updates: usize,
    pub db_updates: usize,
    /// Method and path of every request.
    pub requests: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Backend {
    state: Arc<Mutex<BackendState>>,
}

pub fn user(email: &str, role: Role, approved: bool) -> User {
    User::new(Email::parse(email).unwrap(), role, approved)
}

pub fn email(raw: &str) -> Email {
    Email::parse(raw).unwrap()
}

impl Backend {
    pub fn with_users(users: Vec<User>) -> Self {
        let backend = Self::default();
        backend.state().users = users;
        backend
    }

    /// The usual directory: one user of each role plus a pending user.
    pub fn seeded() -> Self {
        Self::with_users(vec![
            user("owner@example.com", Role::Owner, true),
            user("admin@example.com", Role::Admin, true),
            user("other-admin@example.com", Role::Admin, true),
            user("alice@example.com", Role::User, true),
            user("bob@example.com", Role::User, false),
        ])
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Serve on an ephemeral port and return a client authorized for it.
    pub async fn start(&self) -> ApiClient {
        let mut config = self.config().await;
        config.token = Some(SecretString::from(TOKEN.to_owned()));
        ApiClient::new(&config).unwrap()
    }

    /// Serve on an ephemeral port and return unauthenticated settings.
    pub async fn config(&self) -> ApiConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().nest("/api", self.routes());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let mut config = ApiConfig::new(&format!("http://{addr}/api")).unwrap();
        config.timeout = Duration::from_secs(5);
        config
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/users", get(list_users))
            .route("/users/points", post(update_points))
            .route("/users/{email}", get(get_user).delete(delete_user))
            .route("/users/{email}/approve", post(approve_user))
            .route("/users/{email}/revoke", post(revoke_user))
            .route(
                "/users/{email}/preferences",
                get(get_preferences).put(put_preferences),
            )
            .route("/db/update", post(update_db))
            .layer(middleware::from_fn_with_state(self.clone(), authorize))
            .with_state(self.clone())
    }
}

async fn authorize(
    State(backend): State<Backend>,
    OriginalUri(uri): OriginalUri,
    request: Request,
    next: Next,
) -> Response {
    // nested routers see the path without the `/api` prefix
    backend
        .state()
        .requests
        .push(format!("{} {}", request.method(), uri.path()));
    let expected = format!("Bearer {TOKEN}");
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct ListParams {
    approved: Option<bool>,
}

async fn list_users(
    State(backend): State<Backend>,
    Query(params): Query<ListParams>,
) -> Json<Vec<User>> {
    let state = backend.state();
    let users = state
        .users
        .iter()
        .filter(|u| params.approved.is_none_or(|approved| u.approved == approved))
        .cloned()
        .collect();
    Json(users)
}

async fn get_user(
    State(backend): State<Backend>,
    Path(email): Path<String>,
) -> Result<Json<User>, StatusCode> {
    let state = backend.state();
    state
        .users
        .iter()
        .find(|u| u.email.as_str() == email)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_user(State(backend): State<Backend>, Path(email): Path<String>) -> StatusCode {
    let mut state = backend.state();
    let before = state.users.len();
    state.users.retain(|u| u.email.as_str() != email);
    if state.users.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

fn set_approved(backend: &Backend, email: &str, approved: bool) -> Result<Json<Value>, StatusCode> {
    let mut state = backend.state();
    let user = state
        .users
        .iter_mut()
        .find(|u| u.email.as_str() == email)
        .ok_or(StatusCode::NOT_FOUND)?;
    user.approved = approved;
    Ok(Json(json!({ "email": email, "approved": approved })))
}

async fn approve_user(
    State(backend): State<Backend>,
    Path(email): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    set_approved(&backend, &email, true)
}

async fn revoke_user(
    State(backend): State<Backend>,
    Path(email): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    set_approved(&backend, &email, false)
}

async fn get_preferences(
    State(backend): State<Backend>,
    Path(email): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let state = backend.state();
    state
        .preferences
        .get(&email)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_preferences(
    State(backend): State<Backend>,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let delay = {
        let mut state = backend.state();
        if state.fail_saves > 0 {
            state.fail_saves -= 1;
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        state.save_delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let mut state = backend.state();
    state.saves.push((email.clone(), body.clone()));
    state.preferences.insert(email, body);
    StatusCode::NO_CONTENT
}

async fn update_points(State(backend): State<Backend>) -> Json<Value> {
    let mut state = backend.state();
    state.points_updates += 1;
    Json(json!({ "updated": state.users.len() }))
}

async fn update_db(State(backend): State<Backend>) -> Json<Value> {
    backend.state().db_updates += 1;
    Json(json!({ "status": "ok" }))
}
