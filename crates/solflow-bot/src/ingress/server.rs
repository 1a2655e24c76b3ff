use std::net::SocketAddr;

use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, error::TrySendError},
    task::{self, JoinHandle},
};

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("failed to bind webhook listener on {bind_addr}: {source}")]
    Bind {
        bind_addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("failed to accept webhook client on {local_addr}: {source}")]
    Accept {
        local_addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("failed to read webhook request: {source}")]
    Read { source: std::io::Error },
    #[error("failed to write webhook response: {source}")]
    Write { source: std::io::Error },
}

/// Notification that a webhook POST arrived.
#[derive(Debug, Clone, Copy)]
pub struct WebhookTrigger {
    /// Peer that delivered the notification.
    pub peer: SocketAddr,
}

/// Minimal HTTP listener that turns webhook POSTs into channel triggers.
///
/// Request bodies are ignored; the arrival of a POST is the whole signal.
pub struct WebhookListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl WebhookListener {
    /// Binds the listener socket.
    ///
    /// Binding is split from serving so an unusable address surfaces as a
    /// startup error instead of a dead background task.
    ///
    /// # Errors
    ///
    /// Returns [`IngressError::Bind`] when the address cannot be bound.
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self, IngressError> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| IngressError::Bind { bind_addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| IngressError::Bind { bind_addr, source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener actually bound; differs from the requested
    /// address when port 0 was asked for.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves webhook requests on a background task, pushing one trigger per
    /// POST into `trigger_tx`.
    #[must_use]
    pub fn spawn(self, trigger_tx: mpsc::Sender<WebhookTrigger>) -> JoinHandle<()> {
        let local_addr = self.local_addr;
        task::spawn(async move {
            if let Err(error) = run_webhook_server(self.listener, local_addr, trigger_tx).await {
                tracing::error!(%local_addr, error = %error, "webhook listener terminated");
            }
        })
    }
}

async fn run_webhook_server(
    listener: TcpListener,
    local_addr: SocketAddr,
    trigger_tx: mpsc::Sender<WebhookTrigger>,
) -> Result<(), IngressError> {
    tracing::info!(%local_addr, "webhook listener ready");

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|source| IngressError::Accept { local_addr, source })?;
        let trigger_tx = trigger_tx.clone();
        task::spawn(async move {
            if let Err(error) = handle_webhook_client(stream, peer, trigger_tx).await {
                tracing::warn!(%peer, error = %error, "webhook client failed");
            }
        });
    }
}

async fn handle_webhook_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    trigger_tx: mpsc::Sender<WebhookTrigger>,
) -> Result<(), IngressError> {
    const MAX_REQUEST_HEAD: usize = 8_192;
    const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 19\r\nConnection: close\r\n\r\n{\"status\":\"queued\"}";
    const METHOD_NOT_ALLOWED_RESPONSE: &[u8] =
        b"HTTP/1.1 405 Method Not Allowed\r\nAllow: POST\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    let mut head = [0_u8; MAX_REQUEST_HEAD];
    let mut filled = 0;
    // Read up to the header terminator; the body carries nothing the trigger
    // needs, so it stays unread.
    while filled < head.len() {
        let read = stream
            .read(&mut head[filled..])
            .await
            .map_err(|source| IngressError::Read { source })?;
        if read == 0 {
            break;
        }
        filled += read;
        if head[..filled].windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    if filled == 0 {
        return Ok(());
    }

    if head[..filled].starts_with(b"POST ") {
        match trigger_tx.try_send(WebhookTrigger { peer }) {
            Ok(()) => {
                tracing::info!(%peer, "webhook notification received");
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(%peer, "webhook trigger queue full; dropping trigger");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(%peer, "webhook trigger channel closed");
            }
        }
        stream
            .write_all(OK_RESPONSE)
            .await
            .map_err(|source| IngressError::Write { source })?;
    } else {
        tracing::debug!(%peer, "rejecting non-POST webhook request");
        stream
            .write_all(METHOD_NOT_ALLOWED_RESPONSE)
            .await
            .map_err(|source| IngressError::Write { source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    async fn send_request(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut response = Vec::new();
        let stream = TcpStream::connect(addr).await;
        assert!(stream.is_ok());
        if let Ok(mut stream) = stream {
            if stream.write_all(request).await.is_ok() {
                let _ = stream.read_to_end(&mut response).await;
            }
        }
        response
    }

    #[tokio::test]
    async fn post_requests_are_acknowledged_and_queued() {
        let (trigger_tx, mut trigger_rx) = mpsc::channel(4);
        let listener = WebhookListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await;
        assert!(listener.is_ok());
        if let Ok(listener) = listener {
            let local_addr = listener.local_addr();
            let _server = listener.spawn(trigger_tx);

            let response = send_request(
                local_addr,
                b"POST /webhook HTTP/1.1\r\nHost: bot\r\nContent-Length: 2\r\n\r\n{}",
            )
            .await;
            assert!(response.starts_with(b"HTTP/1.1 200"));
            assert!(response.ends_with(br#"{"status":"queued"}"#));

            let trigger = trigger_rx.recv().await;
            assert!(trigger.is_some());
            if let Some(trigger) = trigger {
                assert_eq!(trigger.peer.ip(), Ipv4Addr::LOCALHOST);
            }
        }
    }

    #[tokio::test]
    async fn non_post_requests_are_rejected() {
        let (trigger_tx, mut trigger_rx) = mpsc::channel(4);
        let listener = WebhookListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await;
        assert!(listener.is_ok());
        if let Ok(listener) = listener {
            let local_addr = listener.local_addr();
            let _server = listener.spawn(trigger_tx);

            let response =
                send_request(local_addr, b"GET /webhook HTTP/1.1\r\nHost: bot\r\n\r\n").await;
            assert!(response.starts_with(b"HTTP/1.1 405"));
            assert!(trigger_rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn full_queue_drops_triggers_but_still_acknowledges() {
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);
        let listener = WebhookListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await;
        assert!(listener.is_ok());
        if let Ok(listener) = listener {
            let local_addr = listener.local_addr();
            let _server = listener.spawn(trigger_tx);

            let request: &[u8] = b"POST / HTTP/1.1\r\nHost: bot\r\n\r\n";
            let first = send_request(local_addr, request).await;
            let second = send_request(local_addr, request).await;
            assert!(first.starts_with(b"HTTP/1.1 200"));
            assert!(second.starts_with(b"HTTP/1.1 200"));

            assert!(trigger_rx.recv().await.is_some());
            assert!(trigger_rx.try_recv().is_err());
        }
    }
}
