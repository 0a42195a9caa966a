//! High-level SLMP client implementations
//!
//! # Architecture
//!
//! One ReadRandom cycle runs the whole codec pipeline:
//!
//! ```text
//! devices ─► PseudoDwordSplitter ─► FrameBuilder ─► transport
//!                                                      │
//! values ◄─ BitExpansionUtility ◄─ PseudoDwordSplitter ◄─ DeviceDataExtractor ◄─ ResponseParser
//! ```
//!
//! [`GenericSlmpClient`] implements the pipeline once over any
//! [`SlmpTransport`]; [`SlmpTcpClient`] binds it to TCP. Each client owns its
//! own [`SequenceNumberManager`], so clients for different PLCs never share a
//! sequence space.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voltage_slmp::{ClientConfig, DeviceSpecification, FrameKind, SlmpClient, SlmpResult, SlmpTcpClient};
//!
//! #[tokio::main]
//! async fn main() -> SlmpResult<()> {
//!     let config = ClientConfig::new().with_frame_kind(FrameKind::FourEBinary);
//!     let mut client = SlmpTcpClient::from_address("192.168.3.39:5007", config).await?;
//!
//!     let devices: Vec<DeviceSpecification> = vec!["D100".parse()?, "M0".parse()?];
//!     let values = client.read_random(&devices).await?;
//!     for (key, value) in values.iter() {
//!         println!("{} = {}", key, value);
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bits::BitExpansionUtility;
use crate::codec::DeviceDataExtractor;
use crate::constants::DEFAULT_MONITORING_TIMER;
use crate::device::DeviceSpecification;
use crate::device_limits::DeviceLimits;
use crate::dword::{PseudoDwordSplitter, WordDevice, WordPair};
use crate::error::{SlmpError, SlmpResult};
use crate::frame::FrameBuilder;
use crate::logging::CallbackLogger;
use crate::parser::{ResponseFrame, ResponseParser};
use crate::protocol::{FrameKind, FrameVersion, NetworkRoute};
use crate::sequence::SequenceNumberManager;
use crate::transport::{SlmpTransport, TcpTransport, TransportStats};
use crate::value::{DeviceValue, DeviceValueMap};
use crate::DEFAULT_TIMEOUT_MS;

// ============================================================================
// Configuration
// ============================================================================

/// Per-client settings.
///
/// ```rust
/// use std::time::Duration;
/// use voltage_slmp::{ClientConfig, DeviceLimits, FrameKind, NetworkRoute};
///
/// let config = ClientConfig::new()
///     .with_frame_kind(FrameKind::FourEAscii)
///     .with_route(NetworkRoute::new().with_network(1).with_station(2))
///     .with_monitoring_timer(16)
///     .with_timeout(Duration::from_secs(3))
///     .with_limits(DeviceLimits::conservative());
///
/// assert!(config.frame_kind.is_four_e());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub frame_kind: FrameKind,
    pub route: NetworkRoute,
    /// PLC-side wait, in 250 ms units
    pub monitoring_timer: u16,
    /// Socket-side timeout
    pub timeout: Duration,
    pub limits: DeviceLimits,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_kind(mut self, kind: FrameKind) -> Self {
        self.frame_kind = kind;
        self
    }

    pub fn with_route(mut self, route: NetworkRoute) -> Self {
        self.route = route;
        self
    }

    pub fn with_monitoring_timer(mut self, units: u16) -> Self {
        self.monitoring_timer = units;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame_kind: FrameKind::default(),
            route: NetworkRoute::default(),
            monitoring_timer: DEFAULT_MONITORING_TIMER,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            limits: DeviceLimits::default(),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// How a requested device should be read and presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    /// One word, presented as [`DeviceValue::Word`]
    Word(DeviceSpecification),
    /// Two consecutive words, presented as [`DeviceValue::Dword`]
    Dword(DeviceSpecification),
    /// One word, presented as 16 [`DeviceValue::Bit`] entries
    Bits(DeviceSpecification),
}

impl DeviceRequest {
    pub fn spec(&self) -> &DeviceSpecification {
        match self {
            DeviceRequest::Word(s) | DeviceRequest::Dword(s) | DeviceRequest::Bits(s) => s,
        }
    }

    /// Words this request occupies on the wire.
    pub fn word_count(&self) -> usize {
        match self {
            DeviceRequest::Dword(_) => 2,
            DeviceRequest::Word(_) | DeviceRequest::Bits(_) => 1,
        }
    }
}

// ============================================================================
// Client trait
// ============================================================================

/// SLMP client operations.
///
/// # Implemented By
///
/// - [`SlmpTcpClient`] - SLMP over TCP
/// - [`GenericSlmpClient`] - Generic client for custom transports
pub trait SlmpClient: Send + Sync {
    /// ReadRandom in one frame, mapped by device key.
    fn read_random(
        &mut self,
        devices: &[DeviceSpecification],
    ) -> impl std::future::Future<Output = SlmpResult<DeviceValueMap>> + Send;

    /// ReadRandom in one frame, raw words in request order.
    fn read_random_words(
        &mut self,
        devices: &[DeviceSpecification],
    ) -> impl std::future::Future<Output = SlmpResult<Vec<u16>>> + Send;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> impl std::future::Future<Output = SlmpResult<()>> + Send;

    fn get_stats(&self) -> TransportStats;

    /// ReadRandom over any number of devices, split into frames of at most
    /// `limits.max_random_devices`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use voltage_slmp::{ClientConfig, DeviceCode, DeviceLimits, DeviceSpecification, SlmpClient, SlmpTcpClient};
    ///
    /// # async fn example() -> voltage_slmp::SlmpResult<()> {
    /// let mut client = SlmpTcpClient::from_address("192.168.3.39:5007", ClientConfig::new()).await?;
    /// let devices: Vec<_> = (0..500).map(|n| DeviceSpecification::new(DeviceCode::D, n)).collect();
    ///
    /// // 500 devices at 192 per frame: 3 requests
    /// let words = client.read_random_batch(&devices, &DeviceLimits::new()).await?;
    /// assert_eq!(words.len(), 500);
    /// # Ok(())
    /// # }
    /// ```
    fn read_random_batch(
        &mut self,
        devices: &[DeviceSpecification],
        limits: &DeviceLimits,
    ) -> impl std::future::Future<Output = SlmpResult<Vec<u16>>> + Send
    where
        Self: Sized,
    {
        let chunk_size = limits.random_chunk_size();
        let inter_request_delay_ms = limits.inter_request_delay_ms;
        async move {
            if devices.is_empty() {
                return Ok(Vec::new());
            }

            let mut result = Vec::with_capacity(devices.len());
            let mut chunks = devices.chunks(chunk_size).peekable();
            while let Some(chunk) = chunks.next() {
                let words = self.read_random_words(chunk).await?;
                result.extend_from_slice(&words);

                if inter_request_delay_ms > 0 && chunks.peek().is_some() {
                    tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
                }
            }

            Ok(result)
        }
    }

    /// Read words, dwords and bit groups together.
    ///
    /// Dwords are split into word pairs on the way out and recombined on the
    /// way back; bit groups are expanded LSB-first into 16 keyed bits.
    fn read_random_mixed(
        &mut self,
        requests: &[DeviceRequest],
        limits: &DeviceLimits,
    ) -> impl std::future::Future<Output = SlmpResult<DeviceValueMap>> + Send
    where
        Self: Sized,
    {
        let limits = *limits;
        async move {
            let dwords: Vec<DeviceSpecification> = requests
                .iter()
                .filter_map(|r| match r {
                    DeviceRequest::Dword(spec) => Some(*spec),
                    _ => None,
                })
                .collect();
            PseudoDwordSplitter::split_specs(&dwords)?;

            let word_count = requests
                .iter()
                .filter(|r| matches!(r, DeviceRequest::Word(_)))
                .count();
            let bit_count = (requests.len() - word_count - dwords.len()) * 16;
            limits.check_batch(word_count, dwords.len(), bit_count)?;

            let mut wire = Vec::with_capacity(requests.iter().map(|r| r.word_count()).sum());
            for request in requests {
                match request {
                    DeviceRequest::Word(spec) | DeviceRequest::Bits(spec) => wire.push(*spec),
                    DeviceRequest::Dword(spec) => {
                        wire.push(*spec);
                        wire.push(
                            DeviceSpecification::new(spec.code, spec.address + 1)
                                .with_hex_address(spec.is_hex_address),
                        );
                    }
                }
            }

            let words = self.read_random_batch(&wire, &limits).await?;
            if words.len() < wire.len() {
                return Err(SlmpError::insufficient_payload(wire.len() * 2, words.len() * 2));
            }

            let mut pairs = Vec::with_capacity(dwords.len());
            let mut cursor = 0;
            for request in requests {
                if let DeviceRequest::Dword(spec) = request {
                    pairs.push(WordPair::new(
                        WordDevice::new(spec.code, spec.address, words[cursor]),
                        WordDevice::new(spec.code, spec.address + 1, words[cursor + 1]),
                    ));
                }
                cursor += request.word_count();
            }
            let mut combined = PseudoDwordSplitter::combine_word_pairs_to_dword(&pairs)?.into_iter();

            let mut values = DeviceValueMap::with_capacity(requests.len());
            let mut cursor = 0;
            for request in requests {
                match request {
                    DeviceRequest::Word(spec) => {
                        values.insert(spec.key(), DeviceValue::Word(words[cursor]));
                    }
                    DeviceRequest::Bits(spec) => {
                        for (key, bit) in BitExpansionUtility::expand_device(spec, words[cursor]) {
                            values.insert(key, DeviceValue::Bit(bit));
                        }
                    }
                    DeviceRequest::Dword(spec) => {
                        if let Some(dword) = combined.next() {
                            values.insert(spec.key(), DeviceValue::Dword(dword.value));
                        }
                    }
                }
                cursor += request.word_count();
            }
            Ok(values)
        }
    }
}

// ============================================================================
// Generic client
// ============================================================================

/// Generic SLMP client that works with any transport.
pub struct GenericSlmpClient<T: SlmpTransport> {
    transport: T,
    config: ClientConfig,
    sequence: SequenceNumberManager,
    logger: Option<CallbackLogger>,
}

impl<T: SlmpTransport> GenericSlmpClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            sequence: SequenceNumberManager::new(),
            logger: None,
        }
    }

    pub fn with_logger(transport: T, config: ClientConfig, logger: CallbackLogger) -> Self {
        Self {
            logger: Some(logger),
            ..Self::new(transport, config)
        }
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sequence_manager(&self) -> &SequenceNumberManager {
        &self.sequence
    }

    /// Build, send and parse one ReadRandom frame.
    ///
    /// Fails with [`SlmpError::PlcError`] on a non-zero end code and with
    /// [`SlmpError::SequenceMismatch`] when a 4E response echoes a different
    /// sequence number.
    pub async fn execute_read_random(
        &mut self,
        devices: &[DeviceSpecification],
    ) -> SlmpResult<ResponseFrame> {
        self.config.limits.check_random(devices.len())?;

        let kind = self.config.frame_kind;
        let sequence = self.sequence.get_next(kind.version());
        let request = FrameBuilder::new(kind)
            .route(self.config.route)
            .monitoring_timer(self.config.monitoring_timer)
            .sequence(sequence)
            .devices(devices.iter().copied())
            .build_read_random()?;
        let wire = request.to_wire();

        if let Some(ref logger) = self.logger {
            logger.log_request(kind, sequence, devices.len(), &wire);
        }

        let raw = self.transport.exchange(kind, &wire).await?;
        let response = ResponseParser::parse(&raw, kind)?;

        if let Some(ref logger) = self.logger {
            logger.log_response(kind, response.sequence, response.end_code, response.payload());
        }

        if kind.version() == FrameVersion::FourE {
            let received = response.sequence.unwrap_or_default();
            if received != sequence {
                warn!("4E sequence mismatch: sent {}, received {}", sequence, received);
                return Err(SlmpError::SequenceMismatch {
                    expected: sequence,
                    received,
                });
            }
        }

        debug!(
            "ReadRandom complete: kind={}, seq={}, devices={}",
            kind,
            sequence,
            devices.len()
        );
        response.into_result()
    }
}

impl<T: SlmpTransport> SlmpClient for GenericSlmpClient<T> {
    async fn read_random(&mut self, devices: &[DeviceSpecification]) -> SlmpResult<DeviceValueMap> {
        let response = self.execute_read_random(devices).await?;
        DeviceDataExtractor::extract(response.payload(), devices)
    }

    async fn read_random_words(&mut self, devices: &[DeviceSpecification]) -> SlmpResult<Vec<u16>> {
        let response = self.execute_read_random(devices).await?;
        DeviceDataExtractor::extract_words(response.payload(), devices.len())
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    async fn close(&mut self) -> SlmpResult<()> {
        self.transport.close().await
    }

    fn get_stats(&self) -> TransportStats {
        self.transport.get_stats()
    }
}

// ============================================================================
// TCP client
// ============================================================================

/// SLMP TCP client implementation using the generic client
pub struct SlmpTcpClient {
    inner: GenericSlmpClient<TcpTransport>,
}

impl SlmpTcpClient {
    pub async fn new(addr: SocketAddr, config: ClientConfig) -> SlmpResult<Self> {
        let transport = TcpTransport::new(addr, config.timeout).await?;
        Ok(Self {
            inner: GenericSlmpClient::new(transport, config),
        })
    }

    /// Create a TCP client with a packet logger (tracing logger when `None`).
    pub async fn with_logging(
        addr: &str,
        config: ClientConfig,
        logger: Option<CallbackLogger>,
    ) -> SlmpResult<Self> {
        let addr = parse_address(addr)?;
        let transport = TcpTransport::new(addr, config.timeout).await?;
        Ok(Self {
            inner: GenericSlmpClient::with_logger(transport, config, logger.unwrap_or_default()),
        })
    }

    pub async fn from_address(addr: &str, config: ClientConfig) -> SlmpResult<Self> {
        Self::new(parse_address(addr)?, config).await
    }

    pub fn from_transport(transport: TcpTransport, config: ClientConfig) -> Self {
        Self {
            inner: GenericSlmpClient::new(transport, config),
        }
    }

    pub fn server_address(&self) -> SocketAddr {
        self.inner.transport().address
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// Enable or disable packet logging on existing client
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.inner.transport_mut().set_packet_logging(enabled);
    }

    pub async fn execute_read_random(
        &mut self,
        devices: &[DeviceSpecification],
    ) -> SlmpResult<ResponseFrame> {
        self.inner.execute_read_random(devices).await
    }
}

fn parse_address(addr: &str) -> SlmpResult<SocketAddr> {
    addr.parse()
        .map_err(|e| SlmpError::invalid_parameter("address", format!("Invalid address '{}': {}", addr, e)))
}

impl SlmpClient for SlmpTcpClient {
    async fn read_random(&mut self, devices: &[DeviceSpecification]) -> SlmpResult<DeviceValueMap> {
        self.inner.read_random(devices).await
    }

    async fn read_random_words(&mut self, devices: &[DeviceSpecification]) -> SlmpResult<Vec<u16>> {
        self.inner.read_random_words(devices).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn close(&mut self) -> SlmpResult<()> {
        self.inner.close().await
    }

    fn get_stats(&self) -> TransportStats {
        self.inner.get_stats()
    }
}
