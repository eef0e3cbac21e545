//! WebSocket adapter.
//!
//! Each text or binary frame is one catcher message; the reply goes back
//! in the same frame type. A connection with no inbound traffic for the
//! idle timeout is closed. The server pings on a shorter period so live
//! clients keep the deadline moving with their pongs.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use telemetry::metrics;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::extractors::ClientIp;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /ws - upgrade to a catcher WebSocket.
pub async fn ws_handler(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ws: WebSocketUpgrade,
) -> Response {
    let max_frame = state.config().max_frame_bytes();
    ws.max_message_size(max_frame)
        .max_frame_size(max_frame)
        .on_upgrade(move |socket| handle_socket(socket, state, ip))
}

struct ConnectionGuard;

impl ConnectionGuard {
    fn new() -> Self {
        metrics().active_ws_connections.inc();
        Self
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics().active_ws_connections.dec();
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState, ip: Option<String>) {
    let _guard = ConnectionGuard::new();
    let idle_timeout = state.config().ws_idle_timeout();
    let ping_period = state.config().ws_ping_period();

    let mut deadline = Instant::now() + idle_timeout;
    let mut pings = interval_at(Instant::now() + ping_period, ping_period);
    pings.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(ip = ?ip, "WebSocket connected");

    loop {
        tokio::select! {
            _ = sleep_until(deadline) => {
                info!(ip = ?ip, idle_secs = idle_timeout.as_secs(), "WebSocket idle, closing");
                break;
            }
            _ = pings.tick() => {
                if let Err(e) = socket.send(Message::Ping(Vec::new())).await {
                    debug!(error = %e, "WebSocket ping failed");
                    break;
                }
            }
            frame = socket.recv() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        warn!(ip = ?ip, error = %e, "WebSocket read failed");
                        break;
                    }
                    None => break,
                };
                deadline = Instant::now() + idle_timeout;

                let reply = match message {
                    Message::Text(text) => {
                        let response = handle_frame(&state, text.as_bytes(), ip.clone()).await;
                        Message::Text(reply_json(&response))
                    }
                    Message::Binary(data) => {
                        let response = handle_frame(&state, &data, ip.clone()).await;
                        Message::Binary(reply_json(&response).into_bytes())
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => continue,
                };

                if let Err(e) = socket.send(reply).await {
                    debug!(error = %e, "WebSocket reply failed");
                    break;
                }
            }
        }
    }

    debug!(ip = ?ip, "WebSocket disconnected");
}

async fn handle_frame(state: &AppState, body: &[u8], ip: Option<String>) -> ApiResponse {
    let result = state.admission.submit_frame(body, ip).await;
    if let Err(rejection) = &result {
        debug!(rejection = %rejection, "WebSocket frame rejected");
    }
    result.into()
}

fn reply_json(response: &ApiResponse) -> String {
    serde_json::to_string(&response.0)
        .unwrap_or_else(|_| r#"{"error":true,"message":"Bad request"}"#.to_string())
}
