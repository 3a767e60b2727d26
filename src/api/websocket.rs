//! WebSocket handler for real-time snapshot streaming

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::actors::messages::HubError;
use crate::api::{error::ApiResult, state::ApiState};

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> ApiResult<Response> {
    if !state.hub.is_running() {
        return Err(HubError::Closed.into());
    }

    Ok(ws.on_upgrade(|socket| handle_websocket(socket, state)))
}

/// Handle WebSocket connection
///
/// One task forwards hub frames to the socket, the other drains inbound
/// messages. The session ends as soon as either side stops.
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    let mut subscription = state.hub.register().await;
    let id = subscription.id();

    info!("WebSocket client {id} connected");

    let (mut sender, mut receiver) = socket.split();
    let write_timeout = state.write_timeout;

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = subscription.recv().await {
            match timeout(write_timeout, sender.send(Message::Text(frame.to_string()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("WebSocket send to {id} failed: {e}");
                    break;
                }
                Err(_) => {
                    warn!("WebSocket send to {id} timed out");
                    break;
                }
            }
        }

        // a peer that stopped reading never acknowledges the close either
        let _ = timeout(write_timeout, sender.close()).await;
    });

    // inbound messages only prove the client is alive
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("WebSocket read from {id} failed: {e}");
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    state.hub.unregister(id).await;

    info!("WebSocket client {id} disconnected");
}
