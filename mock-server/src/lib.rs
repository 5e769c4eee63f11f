use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_SLOW_MS: u64 = 100;

pub const NOT_FOUND_BODY: &str = "item not found";

pub const MALFORMED_BODY: &str = "{\"id\": not json";

/// Body served by `/typed`: carries type metadata and a date-only timestamp.
pub const TYPED_BODY: &str = r#"{"$type":"Fixtures.Item, Fixtures","$id":"1","id":"00000000-0000-0000-0000-000000000000","name":"typed","created_at":"2024-01-15"}"#;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body_len: usize,
    pub body: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub max_in_flight: usize,
    pub served: usize,
}

#[derive(Debug, Default)]
pub struct Stats {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    served: AtomicUsize,
}

impl Stats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
            served: self.served.load(Ordering::SeqCst),
        }
    }
}

/// Counts one `/slow` request as in flight until dropped, so cancelled
/// requests are still accounted for.
struct InFlight<'a>(&'a Stats);

impl<'a> InFlight<'a> {
    fn enter(stats: &'a Stats) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(stats)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

#[derive(Clone, Default)]
pub struct AppState {
    db: Db,
    stats: Arc<Stats>,
}

#[derive(Deserialize)]
pub struct SlowParams {
    pub ms: Option<u64>,
}

pub fn app() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/echo", any(echo))
        .route("/status/{code}", get(status_fixture))
        .route("/malformed", get(malformed))
        .route("/typed", get(typed))
        .route("/slow", get(slow))
        .route("/stats", get(stats))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    let items = state.db.read().await;
    let mut items: Vec<Item> = items.values().cloned().collect();
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
    Json(items)
}

async fn create_item(State(state): State<AppState>, Json(input): Json<CreateItem>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        created_at: input.created_at.unwrap_or_else(Utc::now),
    };
    state.db.write().await.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, (StatusCode, &'static str)> {
    let items = state.db.read().await;
    items
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND_BODY))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Item>, (StatusCode, &'static str)> {
    let mut items = state.db.write().await;
    let item = items.get_mut(&id).ok_or((StatusCode::NOT_FOUND, NOT_FOUND_BODY))?;
    if let Some(name) = input.name {
        item.name = name;
    }
    Ok(Json(item.clone()))
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    let mut items = state.db.write().await;
    items.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        content_type: header_text(header::CONTENT_TYPE),
        accept: header_text(header::ACCEPT),
        body_len: body.len(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status_fixture(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {code}"))
}

async fn malformed() -> &'static str {
    MALFORMED_BODY
}

async fn typed() -> ([(header::HeaderName, &'static str); 1], &'static str) {
    ([(header::CONTENT_TYPE, "application/json")], TYPED_BODY)
}

async fn slow(State(state): State<AppState>, Query(params): Query<SlowParams>) -> Json<StatsSnapshot> {
    {
        let _in_flight = InFlight::enter(&state.stats);
        tokio::time::sleep(Duration::from_millis(params.ms.unwrap_or(DEFAULT_SLOW_MS))).await;
    }
    state.stats.served.fetch_add(1, Ordering::SeqCst);
    Json(state.stats.snapshot())
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
