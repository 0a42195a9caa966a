//! Network transport layer
//!
//! The codec only ever sees complete frames. A transport sends one request
//! and returns exactly one response frame, using the response's data-length
//! field to know where the frame ends:
//!
//! 1. read [`FrameKind::response_prefix_len`] units (through the data-length field)
//! 2. decode the data length
//! 3. read that many more units
//!
//! Any failed exchange drops the connection; the next exchange reconnects.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::constants::SLMP_RESPONSE_BUFFER_SIZE;
use crate::error::{SlmpError, SlmpResult};
use crate::logging::log_packet;
use crate::parser::ResponseParser;
use crate::protocol::FrameKind;

/// Request/response byte transport.
///
/// # Implemented By
///
/// - [`TcpTransport`] - SLMP over TCP
pub trait SlmpTransport: Send + Sync {
    /// Send one request frame and return the complete response frame.
    ///
    /// `kind` tells the transport how to find the end of the response.
    fn exchange(
        &mut self,
        kind: FrameKind,
        request: &[u8],
    ) -> impl std::future::Future<Output = SlmpResult<Vec<u8>>> + Send;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> impl std::future::Future<Output = SlmpResult<()>> + Send;

    fn get_stats(&self) -> TransportStats;
}

/// Transport layer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl TransportStats {
    fn record_error(&mut self, err: &SlmpError) {
        self.errors += 1;
        if matches!(err, SlmpError::Timeout { .. }) {
            self.timeouts += 1;
        }
    }
}

/// SLMP over TCP.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    pub address: SocketAddr,
    timeout: Duration,
    stats: TransportStats,
    packet_logging: bool,
}

impl TcpTransport {
    /// Connect to `address`.
    pub async fn new(address: SocketAddr, timeout_duration: Duration) -> SlmpResult<Self> {
        let stream = connect(address, timeout_duration).await?;
        Ok(Self {
            stream: Some(stream),
            address,
            timeout: timeout_duration,
            stats: TransportStats::default(),
            packet_logging: false,
        })
    }

    /// Connect with packet logging switched on or off.
    pub async fn with_packet_logging(
        address: SocketAddr,
        timeout_duration: Duration,
        enable_logging: bool,
    ) -> SlmpResult<Self> {
        let mut transport = Self::new(address, timeout_duration).await?;
        transport.packet_logging = enable_logging;
        Ok(transport)
    }

    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn reconnect(&mut self) -> SlmpResult<()> {
        self.stream = None;
        debug!("Reconnecting to {}", self.address);
        self.stream = Some(connect(self.address, self.timeout).await?);
        Ok(())
    }
}

async fn connect(address: SocketAddr, timeout_duration: Duration) -> SlmpResult<TcpStream> {
    match timeout(timeout_duration, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        Ok(Err(e)) => Err(SlmpError::connection(format!(
            "Failed to connect to {}: {}",
            address, e
        ))),
        Err(_) => Err(SlmpError::timeout(
            format!("connect to {}", address),
            timeout_duration.as_millis() as u64,
        )),
    }
}

async fn read_exact_timed(
    stream: &mut TcpStream,
    buf: &mut [u8],
    timeout_duration: Duration,
    operation: &str,
) -> SlmpResult<()> {
    match timeout(timeout_duration, stream.read_exact(buf)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(SlmpError::Io(e)),
        Err(_) => Err(SlmpError::timeout(operation, timeout_duration.as_millis() as u64)),
    }
}

/// Read one length-delimited response frame.
async fn read_response(
    stream: &mut TcpStream,
    kind: FrameKind,
    timeout_duration: Duration,
) -> SlmpResult<Vec<u8>> {
    let prefix_len = kind.response_prefix_len();
    let mut frame = vec![0u8; prefix_len];
    read_exact_timed(stream, &mut frame, timeout_duration, "read response header").await?;

    let total = ResponseParser::expected_frame_len(&frame, kind)?;
    let limit = kind.wire_width(SLMP_RESPONSE_BUFFER_SIZE);
    if total > limit {
        return Err(SlmpError::malformed_frame(format!(
            "response of {} units exceeds limit {}",
            total, limit
        )));
    }

    frame.resize(total, 0);
    if total > prefix_len {
        read_exact_timed(
            stream,
            &mut frame[prefix_len..],
            timeout_duration,
            "read response data",
        )
        .await?;
    }
    Ok(frame)
}

impl SlmpTransport for TcpTransport {
    async fn exchange(&mut self, kind: FrameKind, request: &[u8]) -> SlmpResult<Vec<u8>> {
        if self.stream.is_none() {
            self.reconnect().await?;
        }

        self.stats.requests_sent += 1;
        self.stats.bytes_sent += request.len() as u64;
        if self.packet_logging {
            log_packet("send", kind, request);
        }

        let timeout_duration = self.timeout;
        let result = match self.stream.as_mut() {
            Some(stream) => {
                match timeout(timeout_duration, stream.write_all(request)).await {
                    Ok(Ok(())) => read_response(stream, kind, timeout_duration).await,
                    Ok(Err(e)) => Err(SlmpError::Io(e)),
                    Err(_) => Err(SlmpError::timeout(
                        "send request",
                        timeout_duration.as_millis() as u64,
                    )),
                }
            }
            None => Err(SlmpError::connection("not connected")),
        };

        match result {
            Ok(frame) => {
                self.stats.responses_received += 1;
                self.stats.bytes_received += frame.len() as u64;
                if self.packet_logging {
                    log_packet("receive", kind, &frame);
                }
                Ok(frame)
            }
            Err(err) => {
                self.stats.record_error(&err);
                // Stream position is unknown after a failed exchange
                warn!("Dropping connection to {}: {}", self.address, err);
                self.stream = None;
                Err(err)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> SlmpResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const OK_3E: [u8; 15] = [
        0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04,
    ];

    /// Accept one connection, read `request_len` bytes, answer with `reply`
    /// split across two writes.
    async fn serve_once(reply: Vec<u8>, request_len: usize) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; request_len];
            if socket.read_exact(&mut buf).await.is_err() {
                return;
            }
            let (a, b) = reply.split_at(reply.len() / 2);
            let _ = socket.write_all(a).await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = socket.write_all(b).await;
            // Keep the socket open until the client is done
            tokio::time::sleep(Duration::from_millis(200)).await;
        });
        addr
    }

    #[tokio::test]
    async fn test_tcp_exchange_binary() {
        let addr = serve_once(OK_3E.to_vec(), 4).await;
        let mut transport = TcpTransport::new(addr, Duration::from_secs(2)).await.unwrap();
        assert!(transport.is_connected());

        let frame = transport
            .exchange(FrameKind::ThreeEBinary, &[1, 2, 3, 4])
            .await
            .unwrap();
        assert_eq!(frame, OK_3E.to_vec());

        let stats = transport.get_stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.responses_received, 1);
        assert_eq!(stats.bytes_sent, 4);
        assert_eq!(stats.bytes_received, 15);
    }

    #[tokio::test]
    async fn test_tcp_exchange_ascii() {
        let reply = b"D00000FF03FF00000C000012340ABC".to_vec();
        let addr = serve_once(reply.clone(), 2).await;
        let mut transport = TcpTransport::with_packet_logging(addr, Duration::from_secs(2), true)
            .await
            .unwrap();
        let frame = transport.exchange(FrameKind::ThreeEAscii, b"50").await.unwrap();
        assert_eq!(frame, reply);
    }

    #[tokio::test]
    async fn test_tcp_timeout_drops_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let mut transport = TcpTransport::new(addr, Duration::from_millis(50)).await.unwrap();
        let err = transport
            .exchange(FrameKind::ThreeEBinary, &[0x50, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, SlmpError::Timeout { .. }));
        assert!(!transport.is_connected());

        let stats = transport.get_stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.timeouts, 1);
    }

    #[tokio::test]
    async fn test_tcp_close() {
        let addr = serve_once(OK_3E.to_vec(), 1).await;
        let mut transport = TcpTransport::new(addr, Duration::from_secs(1)).await.unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_stats_record_error() {
        let mut stats = TransportStats::default();
        stats.record_error(&SlmpError::timeout("read", 10));
        stats.record_error(&SlmpError::connection("reset"));
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.timeouts, 1);
    }
}
