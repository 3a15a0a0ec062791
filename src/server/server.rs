use anyhow::Result;
use std::time::Duration;

use tracing::{error, info};

use crate::library_store::{
    ArtistFilter, ArtistPatch, FolderFilter, FolderPatch, LibraryError, NewArtist, NewFolder,
    NewSong, SongFilter, SongPatch,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct CreatedResponse {
    message: &'static str,
    id: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Maps library errors onto the status codes the desktop client expects:
/// 400 for bad requests and blocked deletions, 404 for missing targets,
/// 500 when the store itself fails.
fn error_response(err: LibraryError) -> Response {
    let status = match &err {
        LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
        LibraryError::Store(inner) => {
            error!("Store error: {}", inner);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn message_ok(message: &'static str) -> Response {
    (StatusCode::OK, Json(MessageResponse { message })).into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

// =============================================================================
// Folders
// =============================================================================

async fn list_folders(
    State(store): State<GuardedLibraryStore>,
    Query(filter): Query<FolderFilter>,
) -> Response {
    match store.list_folders(&filter) {
        Ok(folders) => Json(folders).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_folder(
    State(store): State<GuardedLibraryStore>,
    Json(body): Json<NewFolder>,
) -> Response {
    match store.create_folder(&body) {
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "Folder created successfully",
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_folder(
    State(store): State<GuardedLibraryStore>,
    Path(number): Path<i64>,
    Json(body): Json<FolderPatch>,
) -> Response {
    match store.update_folder(number, &body) {
        Ok(()) => message_ok("Folder updated successfully"),
        Err(err) => error_response(err),
    }
}

async fn delete_folder(
    State(store): State<GuardedLibraryStore>,
    Path(number): Path<i64>,
) -> Response {
    match store.delete_folder(number) {
        Ok(()) => message_ok("Folder deleted successfully"),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Artists
// =============================================================================

async fn list_artists(
    State(store): State<GuardedLibraryStore>,
    Query(filter): Query<ArtistFilter>,
) -> Response {
    match store.list_artists(&filter) {
        Ok(artists) => Json(artists).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_artist(
    State(store): State<GuardedLibraryStore>,
    Json(body): Json<NewArtist>,
) -> Response {
    match store.create_artist(&body) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(CreatedResponse {
                message: "Artist created successfully",
                id,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_artist(
    State(store): State<GuardedLibraryStore>,
    Path(id): Path<i64>,
    Json(body): Json<ArtistPatch>,
) -> Response {
    match store.update_artist(id, &body) {
        Ok(()) => message_ok("Artist updated successfully"),
        Err(err) => error_response(err),
    }
}

async fn delete_artist(State(store): State<GuardedLibraryStore>, Path(id): Path<i64>) -> Response {
    match store.delete_artist(id) {
        Ok(()) => message_ok("Artist deleted successfully"),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Songs
// =============================================================================

async fn list_songs(
    State(store): State<GuardedLibraryStore>,
    Query(filter): Query<SongFilter>,
) -> Response {
    match store.list_songs(&filter) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_song(
    State(store): State<GuardedLibraryStore>,
    Json(body): Json<NewSong>,
) -> Response {
    match store.create_song(&body) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(CreatedResponse {
                message: "Song created successfully",
                id,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_song(
    State(store): State<GuardedLibraryStore>,
    Path(id): Path<i64>,
    Json(body): Json<SongPatch>,
) -> Response {
    match store.update_song(id, &body) {
        Ok(()) => message_ok("Song updated successfully"),
        Err(err) => error_response(err),
    }
}

async fn delete_song(State(store): State<GuardedLibraryStore>, Path(id): Path<i64>) -> Response {
    match store.delete_song(id) {
        Ok(()) => message_ok("Song deleted successfully"),
        Err(err) => error_response(err),
    }
}

pub fn make_app(config: ServerConfig, library_store: GuardedLibraryStore) -> Router {
    let state = ServerState::new(config, library_store);

    let app: Router = Router::new()
        .route("/", get(home))
        .route("/folders", get(list_folders))
        .route("/folders", post(create_folder))
        .route("/folders/{number}", put(update_folder))
        .route("/folders/{number}", delete(delete_folder))
        .route("/artists", get(list_artists))
        .route("/artists", post(create_artist))
        .route("/artists/{id}", put(update_artist))
        .route("/artists/{id}", delete(delete_artist))
        .route("/songs", get(list_songs))
        .route("/songs", post(create_song))
        .route("/songs/{id}", put(update_song))
        .route("/songs/{id}", delete(delete_song))
        .with_state(state.clone());

    // The desktop client is served from file:// or a dev server, so any
    // origin may call the API.
    app.layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    library_store: GuardedLibraryStore,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
    };
    let app = make_app(config, library_store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::SqliteLibraryStore;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    fn make_test_app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteLibraryStore::new(dir.path().join("library.db"), 2).unwrap());
        let app = make_app(ServerConfig::default(), store);
        (dir, app)
    }

    #[tokio::test]
    async fn list_routes_respond_ok_with_empty_arrays() {
        let (_dir, app) = make_test_app();

        for route in ["/folders", "/artists", "/songs"] {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {}", route);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(parsed, serde_json::json!([]));
        }
    }

    #[tokio::test]
    async fn empty_update_body_is_bad_request() {
        let (_dir, app) = make_test_app();

        let create = Request::builder()
            .method("POST")
            .uri("/folders")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"number": 1, "title": "Pack"}"#))
            .unwrap();
        let response = app.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let update = Request::builder()
            .method("PUT")
            .uri("/folders/1")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.clone().oneshot(update).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_required_create_field_is_bad_request() {
        let (_dir, app) = make_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/artists")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"pseudonym": "DJ"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["error"], "Missing required field: name");
    }

    #[tokio::test]
    async fn mutating_an_absent_song_is_not_found() {
        let (_dir, app) = make_test_app();

        let update = Request::builder()
            .method("PUT")
            .uri("/songs/99999")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title": "x"}"#))
            .unwrap();
        let response = app.clone().oneshot(update).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/songs/99999")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
