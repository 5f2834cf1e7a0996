use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::state::AppState;

pub const UI_ENTRY_FILE: &str = "library.html";

/// GET / and GET /library - single-page library UI
pub async fn index(State(state): State<AppState>) -> Response {
    let path = state.config.server.ui_dir.join(UI_ENTRY_FILE);

    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::debug!("library UI unavailable at {}: {}", path.display(), e);
            (
                StatusCode::NOT_FOUND,
                "Library UI not found (missing library/library.html)",
            )
                .into_response()
        }
    }
}
