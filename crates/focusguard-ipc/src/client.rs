//! Sending side of the coordination protocol

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::{IpcError, IpcResult, RAISE_MESSAGE};

/// Ask the instance listening on `addr` to bring itself to the foreground
pub async fn send_raise(addr: SocketAddr, timeout: Duration) -> IpcResult<()> {
    let send = async {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(RAISE_MESSAGE).await?;
        stream.shutdown().await?;
        Ok::<_, std::io::Error>(())
    };

    tokio::time::timeout(timeout, send)
        .await
        .map_err(|_| IpcError::Timeout(timeout))??;

    debug!(addr = %addr, "Raise request sent");
    Ok(())
}
