use std::sync::Arc;

use tokio::{
    net::TcpListener,
    signal::unix::{signal, SignalKind},
    sync::broadcast,
    task::JoinSet,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::room_manager::RoomManager;

mod room_manager;
mod session;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("ADDR").unwrap_or_else(|_| String::from(DEFAULT_ADDR));
    let room_manager = Arc::new(RoomManager::new());
    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

    let mut interrupt =
        signal(SignalKind::interrupt()).expect("failed to create interrupt signal stream");
    let server = TcpListener::bind(&addr)
        .await
        .expect("could not bind to the address");
    let (quit_tx, quit_rx) = broadcast::channel::<()>(1);

    info!(%addr, "listening");
    loop {
        tokio::select! {
            _ = interrupt.recv() => {
                info!("server interrupted, gracefully shutting down");
                let _ = quit_tx.send(());
                break;
            }
            Ok((socket, _)) = server.accept() => {
                join_set.spawn(session::handle_user_session(
                    Arc::clone(&room_manager),
                    quit_rx.resubscribe(),
                    socket,
                ));
            }
        }
    }

    while join_set.join_next().await.is_some() {}
    info!("server shut down");
}
