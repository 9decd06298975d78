//! Module `data_channel`
//!
//! A data connection opened against a passive endpoint. It carries exactly
//! one listing or file and is closed when dropped, including on error paths.

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ClientConfig;
use crate::error::{FtpClientError, FtpResult};
use crate::middleware::{FtpEvent, SharedHook};
use crate::transfer::PassiveEndpoint;

const CHUNK_SIZE: usize = 16 * 1024;

/// Single-use data connection.
pub struct DataChannel {
    stream: TcpStream,
    peer: SocketAddr,
    idle_timeout: Duration,
    hook: SharedHook,
    bytes_read: u64,
    bytes_written: u64,
}

impl DataChannel {
    /// Connects a new data socket to a passive endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Address advertised by the server in its PASV reply.
    /// * `config` - Supplies the connect timeout and the idle timeout used by
    ///   every later read or write.
    /// * `hook` - Receives `DataChannelOpened` now and `DataChannelClosed`
    ///   when the channel is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(DataChannel)` - A connected channel, good for one transfer.
    /// * `Err(FtpClientError::Timeout)` - The connect did not finish in time.
    /// * `Err(FtpClientError::Connection)` - The connect was refused or failed.
    ///
    /// # Behavior
    ///
    /// There is no handshake beyond the TCP connect. The caller opens the
    /// channel before sending the command that starts the transfer.
    pub async fn open(
        endpoint: &PassiveEndpoint,
        config: &ClientConfig,
        hook: SharedHook,
    ) -> FtpResult<Self> {
        let connect = TcpStream::connect((endpoint.host(), endpoint.port()));
        let stream = timeout(config.connect_timeout(), connect)
            .await
            .map_err(|_| FtpClientError::Timeout {
                stage: "data connect",
            })??;
        let peer = stream.peer_addr()?;

        info!("Data channel opened to {}", peer);
        hook.on_event(&FtpEvent::DataChannelOpened(peer));

        Ok(Self {
            stream,
            peer,
            idle_timeout: config.data_timeout(),
            hook,
            bytes_read: 0,
            bytes_written: 0,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Reads until the server closes its side; end of data is signalled by
    /// the close, not by a length. The idle timeout restarts on every chunk.
    pub async fn read_to_end(&mut self) -> FtpResult<Vec<u8>> {
        let mut data = Vec::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = timeout(self.idle_timeout, self.stream.read(&mut buf))
                .await
                .map_err(|_| FtpClientError::Timeout { stage: "data read" })??;
            if n == 0 {
                return Ok(data);
            }
            data.extend_from_slice(&buf[..n]);
            self.bytes_read += n as u64;
        }
    }

    /// Writes the full payload. The caller must [`close`](Self::close) the
    /// channel so the server observes end of data. The idle timeout applies
    /// to each chunk, not to the whole payload.
    pub async fn write_all(&mut self, data: &[u8]) -> FtpResult<()> {
        for chunk in data.chunks(CHUNK_SIZE) {
            timeout(self.idle_timeout, self.stream.write_all(chunk))
                .await
                .map_err(|_| FtpClientError::Timeout { stage: "data write" })??;
            self.bytes_written += chunk.len() as u64;
        }
        Ok(())
    }

    /// Flushes and shuts down the write side, then releases the socket.
    pub async fn close(mut self) -> FtpResult<()> {
        timeout(self.idle_timeout, self.stream.shutdown())
            .await
            .map_err(|_| FtpClientError::Timeout {
                stage: "data close",
            })??;
        Ok(())
    }
}

impl Drop for DataChannel {
    fn drop(&mut self) {
        debug!(
            "Data channel to {} released ({} bytes read, {} bytes written)",
            self.peer, self.bytes_read, self.bytes_written
        );
        self.hook.on_event(&FtpEvent::DataChannelClosed {
            bytes_read: self.bytes_read,
            bytes_written: self.bytes_written,
        });
    }
}
