use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use worker::api::CreateGameResponse;
use worker::{ClientMessage, Role, ServerMessage};

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Reveal Client ===\n");

    let server_url = std::env::var("SERVER_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let server_url = server_url.trim_end_matches('/').to_string();

    // Join the given game, or start a new one to share with a partner
    let game_id = match std::env::var("GAME_ID") {
        Ok(id) => id,
        Err(_) => {
            let id = create_game(&server_url).await?;
            println!("Started new game: {}", id);
            println!("Tell your partner to run with GAME_ID={}\n", id);
            id
        }
    };

    let ws_url = format!("{}/games/{}/ws", websocket_base(&server_url)?, game_id);
    let (ws_stream, _) = connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("Failed to connect to {}", ws_url))?;
    let (mut sink, mut stream) = ws_stream.split();

    let join = serde_json::to_string(&ClientMessage::Join)?;
    sink.send(Message::Text(join)).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(content) if !content.trim().is_empty() => {
                        let submit = serde_json::to_string(&ClientMessage::Submit { content })?;
                        sink.send(Message::Text(submit)).await?;
                    }
                    Some(_) => {}
                    None => stdin_open = false,
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let message: ServerMessage = match serde_json::from_str(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                eprintln!("Unreadable message from server: {}", e);
                                continue;
                            }
                        };
                        let revealed = matches!(message, ServerMessage::Reveal { .. });
                        println!("{}", describe(&message));
                        if revealed {
                            let _ = sink.close().await;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        println!("Connection closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        eprintln!("Connection error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Ask the worker for a fresh game id
async fn create_game(server_url: &str) -> Result<String> {
    let response = reqwest::Client::new()
        .post(format!("{}/games", server_url))
        .send()
        .await
        .context("Failed to reach worker")?;

    if !response.status().is_success() {
        bail!("Worker returned error: {}", response.status());
    }

    let created: CreateGameResponse = response
        .json()
        .await
        .context("Failed to parse game creation response")?;
    Ok(created.game_id)
}

/// http(s)://host -> ws(s)://host
fn websocket_base(server_url: &str) -> Result<String> {
    if let Some(rest) = server_url.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else {
        bail!("SERVER_URL must start with http:// or https://, got {}", server_url)
    }
}

fn describe(message: &ServerMessage) -> String {
    match message {
        ServerMessage::Joined { role, player_count, .. } => {
            let task = match role {
                Role::Prompter => "write a prompt",
                Role::Responder => "write a response",
            };
            format!(
                "✓ Joined as {:?} ({}/2 players). When the game is active, {} and press enter.",
                role, player_count, task
            )
        }
        ServerMessage::State { player_count, phase } => {
            format!("[State] {}/2 players, phase {}", player_count, phase)
        }
        ServerMessage::Submitted => "✓ Submitted. Waiting for your partner...".to_string(),
        ServerMessage::Reveal { prompt, response } => {
            format!("\n=== Reveal ===\n  Prompt:   {}\n  Response: {}\n==============", prompt, response)
        }
        ServerMessage::Error { message } => format!("✗ {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worker::Phase;

    #[test]
    fn test_websocket_base() {
        assert_eq!(websocket_base("http://localhost:8080").unwrap(), "ws://localhost:8080");
        assert_eq!(websocket_base("https://example.com").unwrap(), "wss://example.com");
        assert!(websocket_base("localhost:8080").is_err());
    }

    #[test]
    fn test_describe() {
        let state = ServerMessage::State {
            player_count: 2,
            phase: Phase::Active,
        };
        assert_eq!(describe(&state), "[State] 2/2 players, phase Active");

        let reveal = describe(&ServerMessage::Reveal {
            prompt: "Knock knock".to_string(),
            response: "Who's there?".to_string(),
        });
        assert!(reveal.contains("Prompt:   Knock knock"));
        assert!(reveal.contains("Response: Who's there?"));
    }
}
