//! HTTP server: router assembly and API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::runs::RunOutcome;
use crate::widget;

/// Build the application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    // The widget is embedded on customer pages, so every origin may call us.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/query", post(api_query))
        .route("/api/stop", post(api_stop))
        .route("/api/generate-script/{client_id}", get(api_generate_script))
        .route("/", get(index_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound.
pub async fn start_server(config: Arc<AppConfig>, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the query API.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    /// Client identifier, resolved against the credential directory.
    client_id: String,
    /// The end-user's query text.
    query: String,
    /// Optional existing thread (continues the conversation).
    #[serde(default)]
    thread_id: Option<String>,
}

/// Response from the query API.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum QueryResponse {
    /// The assistant answered.
    Completed {
        response: String,
        thread_id: String,
        run_id: String,
    },
    /// A concurrent stop request won.
    Cancelled {
        status: &'static str,
        thread_id: String,
    },
}

/// POST /api/query - Answer one query end-to-end.
async fn api_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        request_id = %request_id,
        client_id = %req.client_id,
        thread_id = ?req.thread_id,
        query_length = req.query.len(),
        "Received query"
    );

    let Some(record) = state.directory.lookup(&req.client_id) else {
        return Err((StatusCode::NOT_FOUND, "Client ID not found".to_string()));
    };

    let internal = |e: crate::assistant::GatewayError| {
        tracing::error!(request_id = %request_id, error = %e, "Gateway call failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    };

    // Create or reuse the conversation thread. Failures up to and including
    // start_run never touch the registry; only a started run is tracked.
    let thread_id = match req.thread_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => state
            .gateway
            .create_thread(&record.api_key)
            .await
            .map_err(internal)?,
    };

    state
        .gateway
        .post_message(&record.api_key, &thread_id, &req.query)
        .await
        .map_err(internal)?;

    let run_id = state
        .gateway
        .start_run(&record.api_key, &thread_id, &record.assistant_id)
        .await
        .map_err(internal)?;

    state.coordinator.register(&run_id, &thread_id);

    // The coordinator reaps the registry entry on every exit path.
    match state
        .coordinator
        .drive(&record.api_key, &run_id, &thread_id)
        .await
    {
        Ok(RunOutcome::Completed(response)) => Ok(Json(QueryResponse::Completed {
            response,
            thread_id,
            run_id,
        })),
        Ok(RunOutcome::Cancelled) => Ok(Json(QueryResponse::Cancelled {
            status: "cancelled",
            thread_id,
        })),
        Ok(RunOutcome::Failed(reason)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Assistant run failed: {reason}"),
        )),
        Err(e) => Err(internal(e)),
    }
}

/// Request body for the stop API.
#[derive(Debug, Deserialize)]
struct StopRequest {
    /// Run to cancel.
    run_id: String,
}

/// Response from the stop API.
#[derive(Debug, Serialize)]
struct StopResponse {
    status: &'static str,
}

/// POST /api/stop - Request cancellation of an in-flight run.
///
/// Fire-and-forget: acknowledges the request without waiting for the poll
/// loop to observe the flag.
async fn api_stop(
    State(state): State<AppState>,
    Json(req): Json<StopRequest>,
) -> Result<Json<StopResponse>, (StatusCode, String)> {
    if state.coordinator.registry().request_cancel(&req.run_id) {
        tracing::info!(run_id = %req.run_id, "Cancellation requested");
        Ok(Json(StopResponse { status: "stopping" }))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            "Run not found or already completed".to_string(),
        ))
    }
}

/// Query parameters for script generation.
#[derive(Debug, Deserialize)]
struct GenerateScriptQuery {
    /// Widget brand color, `#rrggbb`.
    #[serde(default, alias = "primaryColor")]
    primary_color: Option<String>,
}

/// Response from the script generation API.
#[derive(Debug, Serialize)]
struct GenerateScriptResponse {
    script: String,
}

/// GET /api/generate-script/{client_id} - Generate the embeddable widget script.
async fn api_generate_script(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(query): Query<GenerateScriptQuery>,
) -> Result<Json<GenerateScriptResponse>, (StatusCode, String)> {
    if state.directory.lookup(&client_id).is_none() {
        return Err((StatusCode::NOT_FOUND, "Client ID not found".to_string()));
    }

    let primary_color = query
        .primary_color
        .as_deref()
        .unwrap_or(widget::DEFAULT_PRIMARY_COLOR);

    Ok(Json(GenerateScriptResponse {
        script: widget::widget_script(&client_id, primary_color),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Demo page
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Demo page that loads the widget for a client.
///
/// Pass `?client_id=...` to pick the client; the page fetches the generated
/// script and injects it, exactly as a customer page would.
async fn index_handler() -> impl IntoResponse {
    Html(DEMO_PAGE)
}

const DEMO_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Assistant Relay - Widget Demo</title>
    <style>
        body {
            font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            background: #f8f9fa;
            margin: 0;
            padding: 48px 16px;
        }
        .demo-shell { max-width: 640px; margin: 0 auto; }
        h1 { font-size: 20px; color: #111827; }
        p { color: #6b7280; font-size: 14px; }
        code { background: #eef0f2; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <div class="demo-shell">
        <h1>Assistant Relay widget demo</h1>
        <p>Append <code>?client_id=&lt;your-client-id&gt;</code> (and optionally
        <code>&amp;primary_color=%23rrggbb</code>) to load a client's widget below.</p>
        <div id="widget-slot"></div>
    </div>
    <script>
        (async () => {
            const params = new URLSearchParams(window.location.search);
            const clientId = params.get('client_id');
            if (!clientId) return;

            const color = params.get('primary_color');
            const url = '/api/generate-script/' + encodeURIComponent(clientId)
                + (color ? '?primary_color=' + encodeURIComponent(color) : '');

            const resp = await fetch(url);
            if (!resp.ok) {
                document.getElementById('widget-slot').textContent =
                    'Unknown client id: ' + clientId;
                return;
            }

            const data = await resp.json();
            const tag = document.createElement('script');
            tag.textContent = data.script;
            document.getElementById('widget-slot').appendChild(tag);
        })();
    </script>
</body>
</html>"#;
