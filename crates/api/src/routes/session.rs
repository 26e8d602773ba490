//! Live Session Route

use axum::{extract::State, Json};
use session_loop::SessionSnapshot;

use crate::SharedState;

/// Current state of the detection session
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    let state = state.read().await;
    Json(state.session_snapshot())
}
