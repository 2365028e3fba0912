use anyhow::Context;
use comms::{
    command::{self, UserCommand},
    event::{self, Event},
    segment::Segment,
    transport,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::StreamExt;

const PORT: usize = 8082;

async fn server_example() -> anyhow::Result<()> {
    // bind to the example port to wait for client connection
    let listener = TcpListener::bind(format!("0.0.0.0:{}", PORT))
        .await
        .expect("could not bind to the port");

    // accept the only client connection we will have
    let tcp_stream = match listener.accept().await {
        Ok((tcp_stream, _addr)) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to accept client: {}", e)),
    };

    // break the client connection into higher level API for ease of use
    let (mut command_stream, mut event_writer) = transport::server::split_tcp_stream(tcp_stream);

    // greet the session with its connection identity
    event_writer
        .write(&Event::Connected(event::ConnectedReplyEvent {
            session_id: "session-id-1".into(),
        }))
        .await?;

    // echo every drawn segment back as a broadcast event, the way the real
    // server does after appending it to the room log
    let mut current_index: i64 = -1;
    while let Some(result) = command_stream.next().await {
        match result.context("failed to read command")? {
            UserCommand::DrawLine(cmd) => {
                current_index += 1;
                event_writer
                    .write(&Event::DrawLine(event::SegmentDrawnBroadcastEvent {
                        room_id: cmd.room_id,
                        session_id: "session-id-1".into(),
                        current_index,
                        segment: cmd.segment,
                    }))
                    .await?;
            }
            UserCommand::Quit(_) => break,
            cmd => println!("SERVER: ignoring {:?}", cmd),
        }
    }

    Ok(())
}

async fn client_example() -> anyhow::Result<()> {
    // create a client connection to the server
    let tcp_stream = TcpStream::connect(format!("localhost:{}", PORT))
        .await
        .context("failed to connect to server")?;

    // break the server connection into higher level API for ease of use
    let (mut event_stream, mut command_writer) = transport::client::split_tcp_stream(tcp_stream);

    // read the greeting event from the server
    match event_stream.next().await {
        Some(Ok(event)) => println!("CLIENT: received {:?}", event),
        Some(Err(e)) => return Err(anyhow::anyhow!("could not parse event: {}", e)),
        None => return Err(anyhow::anyhow!("server closed the connection")),
    }

    command_writer
        .write(&UserCommand::JoinRoom(command::JoinRoomCommand {
            room_id: "room-1".into(),
        }))
        .await?;

    command_writer
        .write(&UserCommand::DrawLine(command::DrawLineCommand {
            room_id: "room-1".into(),
            segment: Segment {
                start_x: 10.0,
                start_y: 20.0,
                end_x: 30.0,
                end_y: 40.0,
                color: "#000000".to_string(),
                brush_size: 5.0,
            },
        }))
        .await?;

    // wait for the echo of the drawn segment
    match event_stream.next().await {
        Some(Ok(event)) => println!("CLIENT: received {:?}", event),
        _ => return Err(anyhow::anyhow!("did not receive the draw echo")),
    }

    command_writer.write(&UserCommand::Quit(command::QuitCommand)).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let (server_result, client_result) = tokio::join!(server_example(), client_example());

    server_result.expect("server example failed");
    client_result.expect("client example failed");
}
