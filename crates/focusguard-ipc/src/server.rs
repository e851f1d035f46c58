//! Listening side of the coordination protocol

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{send_raise, IpcError, IpcResult, MAX_MESSAGE_LEN, RAISE_MESSAGE};

/// A valid `RAISE` message arrived from another instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaiseSignal;

/// Outcome of trying to become the single running instance
#[derive(Debug)]
pub enum Acquisition {
    /// This process owns the coordination port
    Primary(RaiseListener),
    /// Another instance owns the port and has been asked to raise itself
    Signaled,
}

/// Claims the coordination port or defers to the instance that holds it
pub struct InstanceCoordinator {
    addr: SocketAddr,
    timeout: Duration,
}

impl InstanceCoordinator {
    /// Coordinate on `127.0.0.1:port`
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            timeout,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the port, or signal the current owner if it is taken.
    ///
    /// Only "address in use" is treated as another instance running. Any
    /// other bind failure is returned to the caller.
    pub async fn acquire_or_signal(&self) -> IpcResult<Acquisition> {
        match bind_listener(self.addr) {
            Ok(listener) => {
                let addr = listener.local_addr()?;
                info!(addr = %addr, "Coordination port acquired");
                Ok(Acquisition::Primary(RaiseListener { listener, addr }))
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                info!(addr = %self.addr, "Another instance is running, asking it to raise");
                if let Err(e) = send_raise(self.addr, self.timeout).await {
                    warn!(error = %e, "Failed to signal running instance");
                }
                Ok(Acquisition::Signaled)
            }
            Err(source) => Err(IpcError::PortUnavailable {
                port: self.addr.port(),
                source,
            }),
        }
    }
}

fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1)
}

/// Accepts coordination connections on the owned port
#[derive(Debug)]
pub struct RaiseListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl RaiseListener {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Forward every valid `RAISE` message to `raises`.
    ///
    /// Connection errors are logged and the loop keeps accepting. Returns
    /// once the receiving side of `raises` is gone.
    pub async fn run(self, raises: mpsc::UnboundedSender<RaiseSignal>, read_timeout: Duration) {
        loop {
            let stream = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = raises.closed() => break,
            };

            match stream {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "Coordination connection accepted");
                    let raises = raises.clone();
                    tokio::spawn(async move {
                        match read_message(stream, read_timeout).await {
                            Ok(message) if message == RAISE_MESSAGE => {
                                let _ = raises.send(RaiseSignal);
                            }
                            Ok(message) => {
                                debug!(len = message.len(), "Ignoring unrecognized coordination message");
                            }
                            Err(e) => {
                                debug!(error = %e, "Coordination connection failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept coordination connection");
                    // Avoid spinning if accept keeps failing (e.g. fd exhaustion)
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        debug!("Raise listener stopped");
    }
}

async fn read_message(stream: TcpStream, timeout: Duration) -> IpcResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(RAISE_MESSAGE.len());
    let mut limited = stream.take(MAX_MESSAGE_LEN as u64);

    tokio::time::timeout(timeout, limited.read_to_end(&mut buf))
        .await
        .map_err(|_| IpcError::Timeout(timeout))??;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const TIMEOUT: Duration = Duration::from_secs(2);

    async fn primary() -> RaiseListener {
        match InstanceCoordinator::new(0, TIMEOUT).acquire_or_signal().await.unwrap() {
            Acquisition::Primary(listener) => listener,
            Acquisition::Signaled => panic!("ephemeral port should always bind"),
        }
    }

    #[tokio::test]
    async fn second_instance_signals_first() {
        let listener = primary().await;
        let port = listener.local_addr().port();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(listener.run(tx, TIMEOUT));

        let second = InstanceCoordinator::new(port, TIMEOUT);
        let outcome = second.acquire_or_signal().await.unwrap();
        assert!(matches!(outcome, Acquisition::Signaled));

        let signal = tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap();
        assert_eq!(signal, Some(RaiseSignal));

        // One launch, one message
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unrecognized_message_is_ignored() {
        let listener = primary().await;
        let addr = listener.local_addr();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(listener.run(tx, TIMEOUT));

        for payload in [&b"HELLO"[..], b"RAISE\n", b"RAISERAISE"] {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(payload).await.unwrap();
            stream.shutdown().await.unwrap();
        }

        // A valid message after the invalid ones still gets through
        send_raise(addr, TIMEOUT).await.unwrap();
        let signal = tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap();
        assert_eq!(signal, Some(RaiseSignal));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn listener_survives_dropped_connection() {
        let listener = primary().await;
        let addr = listener.local_addr();

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(listener.run(tx, TIMEOUT));

        drop(TcpStream::connect(addr).await.unwrap());

        send_raise(addr, TIMEOUT).await.unwrap();
        let signal = tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap();
        assert_eq!(signal, Some(RaiseSignal));
    }

    #[tokio::test]
    async fn send_raise_without_listener_fails() {
        let listener = primary().await;
        let addr = listener.local_addr();
        drop(listener);

        assert!(send_raise(addr, TIMEOUT).await.is_err());
    }
}
