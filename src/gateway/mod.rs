//! HTTP gateway: the SSE event stream plus the fleet control routes.
//!
//! This layer only translates between HTTP and manager method calls; all
//! fleet semantics live in [`FleetManager`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::fleet::{FleetEvent, FleetManager};
use crate::model::AgentConfigPatch;

/// Maximum number of concurrent SSE connections. Prevents resource
/// exhaustion from connection flooding.
const MAX_CONNECTIONS: u64 = 100;

/// Default number of log entries returned by `GET /logs`.
const DEFAULT_LOG_LIMIT: usize = 100;

#[derive(Clone)]
struct GatewayState {
    manager: Arc<FleetManager>,
    connections: Arc<AtomicU64>,
}

/// Build the gateway router.
pub fn router(manager: Arc<FleetManager>) -> Router {
    let state = GatewayState {
        manager,
        connections: Arc::new(AtomicU64::new(0)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/events", get(events))
        .route("/bots", get(bots_status))
        .route("/bots/running", get(running_bots))
        .route("/bots/configs", get(all_configs))
        .route("/bots/start", post(start_all))
        .route("/bots/stop", post(stop_all))
        .route("/bots/{name}/status", get(bot_status))
        .route("/bots/{name}/config", get(bot_config).patch(update_config))
        .route("/bots/{name}/start", post(start_bot))
        .route("/bots/{name}/stop", post(stop_bot))
        .route("/bots/{name}/cycle", delete(remove_cycle))
        .route("/logs", get(logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(addr: SocketAddr, manager: Arc<FleetManager>) -> std::io::Result<()> {
    let app = router(manager);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Gateway shutting down");
        })
        .await?;
    Ok(())
}

// -- Handlers --

async fn health() -> &'static str {
    "ok"
}

/// SSE stream of fleet events. Slow clients miss events rather than ever
/// blocking an agent loop; reconnecting is the recovery path.
async fn events(
    State(state): State<GatewayState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>, StatusCode> {
    let counter = Arc::clone(&state.connections);
    if !try_acquire_slot(&counter, MAX_CONNECTIONS) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let rx = state.manager.subscribe();
    let stream = BroadcastStream::new(rx)
        .filter_map(|result| result.ok())
        .map(|event| {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Ok(Event::default().event(event_name(&event)).data(data))
        });

    let counted = CountedStream {
        inner: stream,
        counter,
    };

    Ok(Sse::new(counted)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("")))
}

async fn bots_status(State(state): State<GatewayState>) -> impl axum::response::IntoResponse {
    Json(state.manager.bots_status().await)
}

async fn running_bots(State(state): State<GatewayState>) -> impl axum::response::IntoResponse {
    Json(state.manager.running_bots().await)
}

async fn all_configs(State(state): State<GatewayState>) -> impl axum::response::IntoResponse {
    Json(state.manager.all_configs().await)
}

async fn bot_status(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<impl axum::response::IntoResponse, StatusCode> {
    state
        .manager
        .bot_status(&name)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn bot_config(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Result<impl axum::response::IntoResponse, StatusCode> {
    state
        .manager
        .bot_config(&name)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_config(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Json(patch): Json<AgentConfigPatch>,
) -> Result<impl axum::response::IntoResponse, StatusCode> {
    state
        .manager
        .update_config(&name, patch)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn start_bot(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> StatusCode {
    if state.manager.start_bot(&name).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn stop_bot(State(state): State<GatewayState>, Path(name): Path<String>) -> StatusCode {
    if state.manager.stop_bot(&name).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn start_all(State(state): State<GatewayState>) -> StatusCode {
    state.manager.start_all().await;
    StatusCode::OK
}

async fn stop_all(State(state): State<GatewayState>) -> StatusCode {
    state.manager.stop_all().await;
    StatusCode::OK
}

async fn remove_cycle(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> StatusCode {
    if state.manager.remove_crafting_cycle(&name).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

async fn logs(
    State(state): State<GatewayState>,
    Query(query): Query<LogsQuery>,
) -> impl axum::response::IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Json(state.manager.recent_logs(limit).await)
}

/// SSE event name for a fleet event.
fn event_name(event: &FleetEvent) -> &'static str {
    match event {
        FleetEvent::Status { .. } => "status",
        FleetEvent::Log { .. } => "log",
        FleetEvent::Config { .. } => "config",
    }
}

/// Atomically claim a connection slot, refusing beyond `max`. Concurrent
/// callers cannot overshoot the limit.
fn try_acquire_slot(counter: &AtomicU64, max: u64) -> bool {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
            if current < max { Some(current + 1) } else { None }
        })
        .is_ok()
}

/// Stream wrapper that releases the connection slot on drop.
struct CountedStream<S> {
    inner: S,
    counter: Arc<AtomicU64>,
}

impl<S: Stream + Unpin> Stream for CountedStream<S> {
    type Item = S::Item;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        std::pin::Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for CountedStream<S> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
