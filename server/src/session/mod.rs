use std::sync::Arc;

use comms::{command::UserCommand, event, transport};
use nanoid::nanoid;
use tokio::{net::TcpStream, sync::broadcast};
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::room_manager::RoomManager;

use self::board_session::BoardSession;

mod board_session;

/// Given a tcp stream and the room manager, handles the user session
/// until the user quits the session, or the tcp stream is closed for some reason, or the server shuts down
pub async fn handle_user_session(
    room_manager: Arc<RoomManager>,
    mut quit_rx: broadcast::Receiver<()>,
    stream: TcpStream,
) -> anyhow::Result<()> {
    let session_id = nanoid!();
    // Split the tcp stream into a command stream and an event writer with better ergonomics
    let (mut commands, mut event_writer) = transport::server::split_tcp_stream(stream);

    // Greet the connection with its session id; the client compares it
    // against the origin of draw broadcasts to recognize its own echoes
    event_writer
        .write(&event::Event::Connected(event::ConnectedReplyEvent {
            session_id: session_id.clone(),
        }))
        .await?;

    info!(%session_id, "session started");

    // Board Session will abstract the session handling logic for multiple rooms
    let mut board_session = BoardSession::new(&session_id, room_manager);

    loop {
        tokio::select! {
            cmd = commands.next() => match cmd {
                // If the user closes the tcp stream, or sends a quit cmd
                // We need to cleanup the memberships so empty rooms can be evicted
                None | Some(Ok(UserCommand::Quit(_))) => {
                    board_session.leave_all_rooms().await;
                    break;
                }
                // Handle a valid user command
                Some(Ok(cmd)) => {
                    board_session.handle_user_command(cmd).await?;
                }
                // A line we could not parse must not kill the connection or
                // touch any room state, the offending intent is just dropped
                Some(Err(err)) => {
                    warn!(%session_id, %err, "dropping malformed command");
                }
            },
            // Aggregated events from the board session are sent to the user
            Ok(event) = board_session.recv() => {
                event_writer.write(&event).await?;
            }
            // If the server is shutting down, we can just close the tcp streams
            // and exit the session handler. Since the server is shutting down,
            // we don't need to cleanup memberships one by one
            Ok(_) = quit_rx.recv() => {
                drop(event_writer);
                info!(%session_id, "gracefully shutting down user tcp stream");
                break;
            }
        }
    }

    info!(%session_id, "session ended");

    Ok(())
}
