use std::net::{IpAddr, SocketAddr, TcpStream};

use axum::Router;
use tokio::{
    net::TcpListener,
    sync::watch::{Receiver, Sender},
};

use crate::service::token::TokenManager;

use super::state::Context;

pub async fn start_server<T: TokenManager + Send + Sync + Clone + 'static>(
    bind: IpAddr,
    port: u16,
    app: Router<Context<T>>,
    state: Context<T>,
    name: &'static str,
) -> anyhow::Result<ServerHandle> {
    let app = app.with_state(state);
    let listener = TcpListener::bind((bind, port)).await?;
    let server_addr = listener.local_addr()?;

    let (shutdown_trigger, shutdown_receiver) = tokio::sync::watch::channel(());
    let (shutdown_notifier, shutdown_listener) = tokio::sync::watch::channel(());

    tokio::task::spawn(async move {
        tracing::info!("Launching {} on {}", name, server_addr);
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_receiver))
            .await
        {
            tracing::error!("{} stopped with error: {}", name, err);
        }

        let _ = shutdown_notifier.send(());
    });

    wait_for_server(server_addr).await;

    Ok(ServerHandle::new(
        server_addr,
        shutdown_trigger,
        shutdown_listener,
    ))
}

pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Sender<()>,
    waiter: Receiver<()>,
}

impl ServerHandle {
    pub fn new(addr: SocketAddr, shutdown: Sender<()>, waiter: Receiver<()>) -> Self {
        Self {
            addr,
            shutdown,
            waiter,
        }
    }

    /// Bound address; useful when started on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    pub async fn wait(&mut self) -> anyhow::Result<()> {
        self.waiter.changed().await.map(Ok)?
    }
}

async fn shutdown_signal(mut receiver: Receiver<()>) {
    let _ = receiver.changed().await;
}

async fn wait_for_server(socket: SocketAddr) {
    for _ in 0..10 {
        if TcpStream::connect_timeout(&socket, std::time::Duration::from_millis(25)).is_ok() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}
