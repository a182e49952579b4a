//! TCP listener and per-connection request loop

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use indexq_core::config::DaemonConfig;
use indexq_core::{IndexqError, Result, SessionManager};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::dispatch::Dispatcher;
use crate::protocol::{Request, Response};

/// Query service: one task per connection, requests answered in order
pub struct Server {
    config: DaemonConfig,
    dispatcher: Arc<Dispatcher>,
}

/// Per-connection limits taken from config
#[derive(Debug, Clone, Copy)]
struct Limits {
    idle_timeout: Option<Duration>,
    max_request_bytes: usize,
}

impl Server {
    pub fn new(config: DaemonConfig, sessions: Arc<SessionManager>) -> Self {
        Self {
            config,
            dispatcher: Arc::new(Dispatcher::new(sessions)),
        }
    }

    /// Validate config and bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        self.config.validate()?;
        let addr = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| IndexqError::Connection(format!("Failed to listen on {}: {}", addr, e)))
    }

    /// Bind and serve until Ctrl-C
    pub async fn serve(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.run(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves, then let
    /// open connections finish their current request before returning
    pub async fn run<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Listening on {}", listener.local_addr()?);
        tokio::pin!(shutdown);

        let limits = Limits {
            idle_timeout: (self.config.idle_timeout > 0).then(|| Duration::from_secs(self.config.idle_timeout)),
            max_request_bytes: self.config.max_request_bytes,
        };

        let mut connections = JoinSet::new();
        let (closing_tx, closing_rx) = watch::channel(false);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::info!("Client connected: {}", peer);
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let closing = closing_rx.clone();
                            connections.spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, dispatcher, limits, closing).await {
                                    tracing::warn!("[{}] Connection error: {}", peer, e);
                                }
                                tracing::info!("Client disconnected: {}", peer);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Error accepting connection: {}", e);
                        }
                    }
                }
                // Reap finished connections so the set stays small
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Connection task failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        drop(listener);
        closing_tx.send_replace(true);
        if !connections.is_empty() {
            tracing::info!("Waiting for {} open connection(s)", connections.len());
        }
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Connection task failed: {}", e);
            }
        }

        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    limits: Limits,
    mut closing: watch::Receiver<bool>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();

        if *closing.borrow() {
            break;
        }

        let read = async {
            let mut limited = (&mut reader).take(limits.max_request_bytes as u64 + 1);
            match limits.idle_timeout {
                Some(idle) => tokio::time::timeout(idle, limited.read_line(&mut line)).await.ok(),
                None => Some(limited.read_line(&mut line).await),
            }
        };

        // Shutdown interrupts the wait for a request, never a request in progress
        let read = tokio::select! {
            read = read => read,
            _ = closing.changed() => {
                tracing::debug!("[{}] Closing for shutdown", peer);
                break;
            }
        };
        let Some(read) = read else {
            tracing::info!("[{}] Idle timeout, closing", peer);
            break;
        };

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!("[{}] Undecodable request: {}", peer, e);
                send(&mut writer, &Response::invalid(e)).await?;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if line.len() > limits.max_request_bytes && !line.ends_with('\n') {
            tracing::warn!("[{}] Request exceeds {} bytes, closing", peer, limits.max_request_bytes);
            let response = Response::invalid(format!("request exceeds {} bytes", limits.max_request_bytes));
            send(&mut writer, &response).await?;
            break;
        }

        let payload = line.trim();
        if payload.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(payload) {
            Ok(request) => dispatcher.dispatch(request).await,
            Err(e) => {
                tracing::warn!("[{}] Undecodable request: {}", peer, e);
                Response::invalid(e)
            }
        };

        send(&mut writer, &response).await?;
    }

    Ok(())
}

/// Write one response followed by a newline
async fn send(writer: &mut OwnedWriteHalf, response: &Response) -> Result<()> {
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
