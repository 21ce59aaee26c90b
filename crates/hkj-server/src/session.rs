use super::registry::Okiya;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use hkj_core::PlayerId;
use hkj_gameroom::*;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

/// Upgrades the request to a WebSocket and spawns the bridge task between
/// the socket and whatever room the client binds to.
pub async fn connect(
    req: HttpRequest,
    body: web::Payload,
    okiya: web::Data<Okiya>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    actix_web::rt::spawn(bridge(okiya.into_inner(), session, stream));
    Ok(response)
}

/// The seat a connection is currently bound to.
struct Binding {
    handle: RoomHandle,
    player: PlayerId,
}

/// Pumps frames both ways for one connection. The first CREATE_ROOM or
/// JOIN_ROOM binds the socket to a seat; afterwards decoded frames are
/// forwarded into the room mailbox. A socket close detaches the seat and
/// cancels nothing.
async fn bridge(
    okiya: Arc<Okiya>,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    use futures::StreamExt;
    let (conn, mut outbound) = unbounded_channel::<String>();
    let mut binding: Option<Binding> = None;
    'sesh: loop {
        tokio::select! {
            biased;
            frame = outbound.recv() => match frame {
                Some(json) => if session.text(json).await.is_err() { break 'sesh },
                None => break 'sesh,
            },
            frame = stream.next() => match frame {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    handle_frame(&okiya, &conn, &mut binding, &text).await;
                }
                Some(Ok(actix_ws::Message::Close(_))) | Some(Err(_)) | None => break 'sesh,
                _ => continue 'sesh,
            },
        }
    }
    if let Some(Binding { handle, player }) = binding {
        log::debug!("[bridge] {} detached from {}", player, handle.code);
        let _ = handle.tx.send(Command::Detach { player });
    }
}

async fn handle_frame(
    okiya: &Arc<Okiya>,
    conn: &ConnectionTx,
    binding: &mut Option<Binding>,
    text: &str,
) {
    let message = match Protocol::decode(text) {
        Ok(message) => message,
        Err(e) => {
            let _ = conn.send(ServerMessage::error(e).to_json());
            return;
        }
    };
    // a bound socket forwards everything to its room
    if let Some(bound) = binding.as_ref() {
        let tx = bound.handle.tx.clone();
        let player = bound.player.clone();
        let leaving = matches!(message, ClientMessage::LeaveRoom {});
        let sent = tx.send(Command::Inbound { player, message });
        if sent.is_err() {
            let _ = conn.send(ServerMessage::error("room is gone").to_json());
            *binding = None;
        } else if leaving {
            *binding = None;
        }
        return;
    }
    match message {
        ClientMessage::CreateRoom {
            player_id,
            player_name,
            mode,
            ai_difficulty,
            geisha_set,
        } => {
            let name = player_name.unwrap_or_else(|| player_id.clone());
            let handle = okiya
                .create(
                    player_id.clone(),
                    name,
                    conn.clone(),
                    mode,
                    ai_difficulty,
                    geisha_set.unwrap_or_default(),
                )
                .await;
            *binding = Some(Binding {
                handle,
                player: player_id,
            });
        }
        ClientMessage::JoinRoom {
            room_id,
            player_id,
            player_name,
        } => match okiya.join(&room_id).await {
            Ok(handle) => {
                let name = player_name.unwrap_or_else(|| player_id.clone());
                let attached = handle.tx.send(Command::Attach {
                    player: player_id.clone(),
                    name,
                    conn: conn.clone(),
                });
                match attached {
                    Ok(()) => {
                        *binding = Some(Binding {
                            handle,
                            player: player_id,
                        });
                    }
                    Err(_) => {
                        let _ = conn.send(ServerMessage::error("room not found").to_json());
                    }
                }
            }
            Err(e) => {
                let _ = conn.send(ServerMessage::error(e).to_json());
            }
        },
        _ => {
            let _ = conn.send(ServerMessage::error("join a room first").to_json());
        }
    }
}
