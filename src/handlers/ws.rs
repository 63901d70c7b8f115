use axum::{
    extract::{State, ws::WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{handlers::AppState, ws::handle_socket};

/// Handler for WebSocket connections
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state.service, state.message_router))
}
