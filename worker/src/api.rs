use crate::game::{
    Channel, ClientMessage, Outgoing, Phase, QueueChannel, ServerMessage, SessionError,
    MAX_PARTICIPANTS,
};
use crate::registry::{generate_game_id, SessionRegistry};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, info_span, warn, Instrument};

/// Registry specialised to the WebSocket transport
pub type Registry = SessionRegistry<QueueChannel>;

/// HTTP API state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub registry: Registry,
}

/// Response from creating a game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: String,
}

/// Live status of one game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusResponse {
    pub game_id: String,
    pub player_count: usize,
    pub phase: Phase,
    pub submitted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Create the HTTP API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/games", post(create_game))
        .route("/games/:game_id", get(get_game_status))
        .route("/games/:game_id/ws", get(handle_game_socket))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Reveal worker is alive"
}

/// Hand out a fresh game id; the session itself appears on first connect
async fn create_game(State(state): State<ApiState>) -> impl IntoResponse {
    let mut game_id = generate_game_id();
    while state.registry.get(&game_id).await.is_some() {
        game_id = generate_game_id();
    }

    info!(%game_id, "game id issued");
    (StatusCode::CREATED, Json(CreateGameResponse { game_id }))
}

async fn get_game_status(
    Path(game_id): Path<String>,
    State(state): State<ApiState>,
) -> Response {
    let Some(session) = state.registry.get(&game_id).await else {
        let response = ErrorResponse {
            message: format!("No live game {game_id}"),
        };
        return (StatusCode::NOT_FOUND, Json(response)).into_response();
    };

    let snapshot = session.snapshot().await;
    let response = GameStatusResponse {
        game_id,
        player_count: snapshot.player_count,
        phase: snapshot.phase,
        submitted: snapshot.submitted,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Upgrade to a participant connection, refusing up front when the game is full
async fn handle_game_socket(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    State(state): State<ApiState>,
) -> Response {
    if let Some(session) = state.registry.get(&game_id).await {
        if session.player_count().await >= MAX_PARTICIPANTS {
            info!(%game_id, "connection refused, game is full");
            let response = ErrorResponse {
                message: SessionError::SessionFull.to_string(),
            };
            return (StatusCode::CONFLICT, Json(response)).into_response();
        }
    }

    let span = info_span!("participant", %game_id);
    ws.on_upgrade(move |socket| serve_participant(socket, state.registry, game_id).instrument(span))
}

/// Bridge one socket to its session until either side goes away
async fn serve_participant(socket: WebSocket, registry: Registry, game_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (channel, mut outgoing) = QueueChannel::pair();
    let local = channel.clone();

    // Lost a race for the last seat after the upgrade
    let (coordinator, admission) = match registry.join(&game_id, channel).await {
        Ok(joined) => joined,
        Err(error) => {
            warn!(%error, "connection rejected");
            if let Ok(json) = serde_json::to_string(&ServerMessage::error(error.to_string())) {
                let _ = sender.send(Message::Text(json)).await;
            }
            let _ = sender.close().await;
            return;
        }
    };
    let participant_id = admission.participant_id;

    let writer = tokio::spawn(
        async move {
            while let Some(item) = outgoing.recv().await {
                match item {
                    Outgoing::Message(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(error) => {
                                warn!(%error, "failed to encode message");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json)).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Outgoing::Close => {
                        let _ = sender.close().await;
                        break;
                    }
                }
            }
        }
        .in_current_span(),
    );

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => coordinator.handle_message(&participant_id, message).await,
                Err(error) => {
                    debug!(%error, "malformed message");
                    let _ = local.send(&ServerMessage::error(format!("Malformed message: {error}")));
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // Ping/pong are answered by axum, binary is ignored
            Err(error) => {
                debug!(%error, "socket error");
                break;
            }
        }
    }

    registry.leave(&game_id, &participant_id).await;
    drop(local);
    let _ = writer.await;
    debug!(%participant_id, "connection closed");
}

/// Start the HTTP API server
pub async fn start_api_server(addr: String, registry: Registry) -> Result<()> {
    let app = create_router(ApiState { registry });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP API server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_game_serialization() {
        let response = CreateGameResponse {
            game_id: "k7pq2x".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"gameId":"k7pq2x"}"#);
    }

    #[test]
    fn test_status_response() {
        let status = GameStatusResponse {
            game_id: "k7pq2x".to_string(),
            player_count: 2,
            phase: Phase::Active,
            submitted: 1,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"playerCount\":2"));
        assert!(json.contains("\"phase\":\"Active\""));
        assert!(json.contains("\"submitted\":1"));
    }
}
