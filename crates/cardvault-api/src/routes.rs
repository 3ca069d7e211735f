use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use cardvault_core::db::SqliteSyncRunRepository;
use cardvault_core::{
    ChannelReporter, Database, HttpCatalogClient, SyncEngine, SyncEvent, SyncRun,
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    db: Arc<Database>,
    catalog: HttpCatalogClient,
    /// Held by the running pass; a second trigger gets 409
    sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> cardvault_core::Result<Self> {
        let db = Arc::new(Database::open(&config.db_path)?);
        Self::new(config, db)
    }

    pub fn new(config: Arc<AppConfig>, db: Arc<Database>) -> cardvault_core::Result<Self> {
        Ok(Self {
            catalog: HttpCatalogClient::new(&config.catalog)?,
            db,
            sync_lock: Arc::new(Mutex::new(())),
            config,
        })
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/sync/catalog", get(sync_catalog))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    sync_running: bool,
    last_sync: Option<SyncRun>,
}

async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let last_sync = {
        let conn = state.db.connection()?;
        SqliteSyncRunRepository::new(&conn).latest()?
    };

    Ok(Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        sync_running: state.sync_lock.try_lock().is_err(),
        last_sync,
    }))
}

/// Start one catalog pass and stream its events.
///
/// The pass runs in its own task and keeps the sync lock until it ends.
/// Dropping the response stream cancels the pass: the in-flight set finishes
/// and no further sets are fetched.
async fn sync_catalog(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let lock = Arc::clone(&state.sync_lock)
        .try_lock_owned()
        .map_err(|_| AppError::conflict("A catalog sync is already running"))?;

    let (reporter, rx) = ChannelReporter::new();
    let cancel = CancellationToken::new();
    let engine = SyncEngine::new(
        state.catalog.clone(),
        Arc::clone(&state.db),
        state.config.pass,
    );

    let token = cancel.clone();
    tokio::spawn(async move {
        let _lock = lock;
        if let Err(e) = engine.run(&reporter, &token).await {
            tracing::warn!(error = %e, "Catalog sync ended without completing");
        }
    });

    let cancel_on_drop = cancel.drop_guard();
    let events = UnboundedReceiverStream::new(rx).map(move |event| {
        let _pass = &cancel_on_drop;
        sse_event(&event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_event(event: &SyncEvent) -> Result<Event, axum::Error> {
    Event::default().json_data(event)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::{to_bytes, Body};
    use axum::extract::Path;
    use axum::http::{header, Request, StatusCode};
    use cardvault_core::db::SqliteCatalogRepository;
    use cardvault_core::{CatalogClientConfig, PassConfig};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn card(id: &str, local_id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "localId": local_id,
            "name": name,
            "category": "Pokemon",
            "rarity": "Common"
        })
    }

    /// Serve a TCGdex-shaped catalog on a local port; returns its base URL
    async fn serve_catalog(sets: Value, details: HashMap<String, Value>) -> String {
        let details = Arc::new(details);
        let app = Router::new()
            .route(
                "/en/sets",
                get(move || {
                    let sets = sets.clone();
                    async move { Json(sets) }
                }),
            )
            .route(
                "/en/sets/{id}",
                get(move |Path(id): Path<String>| {
                    let details = Arc::clone(&details);
                    async move {
                        details
                            .get(&id)
                            .cloned()
                            .map(Json)
                            .ok_or(StatusCode::NOT_FOUND)
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn test_state(catalog_url: &str) -> (AppState, Arc<Database>) {
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            db_path: "unused.db".into(),
            catalog: CatalogClientConfig::default().with_base_url(catalog_url),
            pass: PassConfig::default().with_include_series(false),
        };
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = AppState::new(Arc::new(config), Arc::clone(&db)).unwrap();
        (state, db)
    }

    fn events_of(body: &str) -> Vec<SyncEvent> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim()).unwrap())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn healthz_reports_no_sync_yet() {
        let (state, _db) = test_state("http://127.0.0.1:9");
        let response = app_router(state)
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["syncRunning"], false);
        assert_eq!(value["lastSync"], Value::Null);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_trigger_while_running_conflicts() {
        let (state, _db) = test_state("http://127.0.0.1:9");
        let _running = Arc::clone(&state.sync_lock).try_lock_owned().unwrap();

        let response = app_router(state)
            .oneshot(Request::get("/api/sync/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("already running"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_streams_events_until_complete() {
        let sets = json!([
            {"id": "base1", "name": "Base Set"},
            {"id": "jungle", "name": "Jungle"},
            {"id": "fossil", "name": "Fossil"}
        ]);
        let mut details = HashMap::new();
        details.insert(
            "base1".to_string(),
            json!({
                "id": "base1",
                "name": "Base Set",
                "cards": [card("base1-4", "4", "Charizard"), card("base1-58", "58", "Pikachu")]
            }),
        );
        details.insert(
            "jungle".to_string(),
            json!({"id": "jungle", "name": "Jungle", "cards": [card("jungle-60", "60", "Pikachu")]}),
        );
        let catalog_url = serve_catalog(sets, details).await;
        let (state, db) = test_state(&catalog_url);

        let response = app_router(state)
            .oneshot(Request::get("/api/sync/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events = events_of(std::str::from_utf8(&body).unwrap());

        assert!(matches!(events.first(), Some(SyncEvent::Starting { .. })));
        assert!(events.iter().any(|event| matches!(
            event,
            SyncEvent::Warning { set_id: Some(id), .. } if id == "fossil"
        )));
        let Some(SyncEvent::Complete { stats, .. }) = events.last() else {
            panic!("stream must end with complete, got {events:?}");
        };
        assert_eq!(stats.sets_processed, 2);
        assert_eq!(stats.cards_processed, 3);
        assert_eq!(stats.sets_failed, 1);

        let conn = db.connection().unwrap();
        let repo = SqliteCatalogRepository::new(&conn);
        assert_eq!(repo.count_sets().unwrap(), 3);
        assert_eq!(repo.count_cards().unwrap(), 3);
    }
}
