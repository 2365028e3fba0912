use anyhow::Context;
use comms::{
    command,
    transport::{
        self,
        client::{CommandWriter, EventStream},
    },
};
use tokio::{
    net::TcpStream,
    sync::{
        broadcast,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
};
use tokio_stream::StreamExt;

use crate::{surface::CanvasSurface, Interrupted, Terminator};

use super::{action::Action, State};

pub struct StateStore {
    state_tx: UnboundedSender<State>,
}

impl StateStore {
    pub fn new() -> (Self, UnboundedReceiver<State>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel::<State>();

        (StateStore { state_tx }, state_rx)
    }
}

type ServerHandle = (EventStream, CommandWriter);

async fn create_server_handle(addr: &str) -> anyhow::Result<ServerHandle> {
    let stream = TcpStream::connect(addr).await?;
    let (event_stream, command_writer) = transport::client::split_tcp_stream(stream);

    Ok((event_stream, command_writer))
}

impl StateStore {
    pub async fn main_loop<S: CanvasSurface>(
        self,
        mut surface: S,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let mut opt_server_handle: Option<ServerHandle> = None;
        let mut state = State::default();

        // the initial state once
        self.state_tx.send(state.clone())?;

        let result = loop {
            if let Some((event_stream, command_writer)) = opt_server_handle.as_mut() {
                tokio::select! {
                    // Handle the server events as they come in
                    maybe_event = event_stream.next() => match maybe_event {
                        Some(Ok(event)) => {
                            state.handle_server_event(&event, &mut surface);
                        },
                        // server disconnected, we need to reset the state
                        None => {
                            opt_server_handle = None;
                            state = State::default();
                            surface.clear();
                        },
                        _ => (),
                    },
                    // Handle the actions coming from the outer application
                    // and process them to do async operations
                    Some(action) = action_rx.recv() => match action {
                        Action::SelectRoom { room_id } => {
                            let has_joined = state.set_active_room(room_id.as_str(), &mut surface);

                            if !has_joined {
                                command_writer
                                    .write(&command::UserCommand::JoinRoom(command::JoinRoomCommand {
                                        room_id,
                                    }))
                                    .await
                                    .context("could not join room")?;
                            }
                        },
                        Action::DrawSegment { segment } => {
                            if state.draw_local(&segment, &mut surface) {
                                if let Some(room_id) = state.active_room.clone() {
                                    command_writer
                                        .write(&command::UserCommand::DrawLine(command::DrawLineCommand {
                                            room_id,
                                            segment,
                                        }))
                                        .await
                                        .context("could not send segment")?;
                                }
                            }
                        },
                        Action::CompleteDrawing => {
                            if let Some(room_id) = state.active_room.clone() {
                                command_writer
                                    .write(&command::UserCommand::CompleteDrawing(
                                        command::CompleteDrawingCommand { room_id },
                                    ))
                                    .await
                                    .context("could not complete drawing")?;
                            }
                        },
                        Action::Undo => {
                            // local hints avoid sending requests the server
                            // would refuse anyway; the server still re-checks
                            if state.can_undo() {
                                if let Some(room_id) = state.active_room.clone() {
                                    command_writer
                                        .write(&command::UserCommand::UndoAction(
                                            command::UndoActionCommand { room_id },
                                        ))
                                        .await
                                        .context("could not send undo request")?;
                                }
                            }
                        },
                        Action::Redo => {
                            if state.can_redo() {
                                if let Some(room_id) = state.active_room.clone() {
                                    command_writer
                                        .write(&command::UserCommand::RedoAction(
                                            command::RedoActionCommand { room_id },
                                        ))
                                        .await
                                        .context("could not send redo request")?;
                                }
                            }
                        },
                        Action::ClearBoard => {
                            if let Some(room_id) = state.active_room.clone() {
                                command_writer
                                    .write(&command::UserCommand::ClearBoard(
                                        command::ClearBoardCommand { room_id },
                                    ))
                                    .await
                                    .context("could not send clear request")?;
                            }
                        },
                        Action::LeaveRoom { room_id } => {
                            state.forget_room(&room_id, &mut surface);

                            command_writer
                                .write(&command::UserCommand::LeaveRoom(command::LeaveRoomCommand {
                                    room_id,
                                }))
                                .await
                                .context("could not leave room")?;
                        },
                        Action::Exit => {
                            let _ = command_writer.write(&command::UserCommand::Quit(command::QuitCommand)).await;
                            let _ = terminator.terminate(Interrupted::UserInt);

                            break Interrupted::UserInt;
                        },
                        _ => (),
                    },
                    // Catch and handle interrupt signal to gracefully shutdown
                    Ok(interrupted) = interrupt_rx.recv() => {
                        break interrupted;
                    }
                }
            } else {
                tokio::select! {
                    Some(action) = action_rx.recv() => match action {
                        Action::ConnectToServerRequest { addr } => {
                            state.mark_connection_request_start();
                            // emit event to re-render any part depending on the connection status
                            self.state_tx.send(state.clone())?;

                            match create_server_handle(&addr).await {
                                Ok(server_handle) => {
                                    // set the server handle and change status for further processing
                                    let _ = opt_server_handle.insert(server_handle);
                                    state.process_connection_request_result(Ok(addr));
                                },
                                Err(err) => {
                                    state.process_connection_request_result(Err(err));
                                }
                            }
                        },
                        Action::Exit => {
                            let _ = terminator.terminate(Interrupted::UserInt);

                            break Interrupted::UserInt;
                        },
                        _ => (),
                    },
                    // Catch and handle interrupt signal to gracefully shutdown
                    Ok(interrupted) = interrupt_rx.recv() => {
                        break interrupted;
                    }
                }
            }

            self.state_tx.send(state.clone())?;
        };

        Ok(result)
    }
}
