use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::services::conversation;
use crate::state::AppState;

pub async fn chat_page() -> Html<&'static str> {
    Html(include_str!("../web/chat.html"))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let message = payload.message.trim().to_string();
    let session_id = payload
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let reply = match conversation::process_message(&state, &session_id, &message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, session = %session_id, "conversation processing failed");
            "Sorry, I'm having trouble right now. Please try again in a moment \
             or contact the hospital directly."
                .to_string()
        }
    };

    // Opportunistic TTL sweep keeps the session table bounded.
    {
        let db = state.db.lock().unwrap();
        if let Err(e) = queries::expire_old_sessions(&db) {
            tracing::warn!(error = %e, "failed to expire old sessions");
        }
    }

    Json(ChatResponse { session_id, reply }).into_response()
}
