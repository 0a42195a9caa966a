//! ReadRandom request frame construction
//!
//! Binary layout (little-endian multi-byte fields):
//!
//! | Field | 3E | 4E |
//! |-------|----|----|
//! | Subheader | `50 00` | `54 00` |
//! | Sequence number | - | 2 |
//! | Reserved | - | `00 00` |
//! | Network / Station / I/O / Multidrop | 5 | 5 |
//! | Data length | 2 | 2 |
//! | Monitoring timer | 2 | 2 |
//! | Command `0x0403` | 2 | 2 |
//! | Subcommand `0x0000` | 2 | 2 |
//! | Word count / Dword count | 1 + 1 | 1 + 1 |
//! | Device entries | 4 x N | 4 x N |
//!
//! The data length counts every byte after the field itself and is
//! back-patched once the frame is complete. ASCII frames are the binary frame
//! rendered as uppercase hex, never built separately.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::codec::bytes_to_hex;
use crate::constants::*;
use crate::device::DeviceSpecification;
use crate::error::{SlmpError, SlmpResult};
use crate::protocol::{Encoding, FrameKind, FrameVersion, NetworkRoute};

/// Growable frame buffer bounded by [`MAX_FRAME_LENGTH`].
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    data: BytesMut,
}

impl FrameBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity.min(MAX_FRAME_LENGTH)),
        }
    }

    #[inline]
    fn ensure_room(&self, additional: usize) -> SlmpResult<()> {
        if self.data.len() + additional > MAX_FRAME_LENGTH {
            return Err(SlmpError::invalid_parameter(
                "frame",
                format!(
                    "frame would exceed max size: {} + {} > {}",
                    self.data.len(),
                    additional,
                    MAX_FRAME_LENGTH
                ),
            ));
        }
        Ok(())
    }

    /// Push a single byte
    #[inline]
    pub fn push(&mut self, byte: u8) -> SlmpResult<()> {
        self.ensure_room(1)?;
        self.data.put_u8(byte);
        Ok(())
    }

    /// Push u16 in little-endian
    #[inline]
    pub fn push_u16_le(&mut self, value: u16) -> SlmpResult<()> {
        self.ensure_room(2)?;
        self.data.put_u16_le(value);
        Ok(())
    }

    /// Extend with a byte slice
    #[inline]
    pub fn extend(&mut self, data: &[u8]) -> SlmpResult<()> {
        self.ensure_room(data.len())?;
        self.data.put_slice(data);
        Ok(())
    }

    /// Overwrite two already-written bytes with a little-endian u16.
    pub fn patch_u16_le(&mut self, offset: usize, value: u16) -> SlmpResult<()> {
        if offset + 2 > self.data.len() {
            return Err(SlmpError::invalid_parameter(
                "offset",
                format!("patch at {} outside frame of {} bytes", offset, self.data.len()),
            ));
        }
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    kind: FrameKind,
    sequence: u16,
    device_count: usize,
    bytes: Bytes,
}

impl RequestFrame {
    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Sequence number written into the frame (`0` for 3E).
    #[inline]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    #[inline]
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Binary frame bytes, independent of the target encoding.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Binary frame length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Uppercase hex rendering of the binary frame.
    pub fn to_ascii(&self) -> String {
        bytes_to_hex(&self.bytes)
    }

    /// Bytes to put on the wire for this frame's encoding.
    pub fn to_wire(&self) -> Bytes {
        match self.kind.encoding() {
            Encoding::Binary => self.bytes.clone(),
            Encoding::Ascii => Bytes::from(self.to_ascii().into_bytes()),
        }
    }

    /// Value of the data-length field.
    pub fn data_length(&self) -> u16 {
        let offset = self.kind.data_length_offset();
        u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }
}

/// Fluent ReadRandom request builder.
///
/// # Example
///
/// ```rust
/// use voltage_slmp::{DeviceCode, DeviceSpecification, FrameBuilder, FrameKind};
///
/// let frame = FrameBuilder::new(FrameKind::ThreeEBinary)
///     .device(DeviceSpecification::new(DeviceCode::D, 100))
///     .build_read_random()
///     .unwrap();
///
/// assert_eq!(frame.len(), 21);
/// assert_eq!(frame.to_ascii().len(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    kind: FrameKind,
    route: NetworkRoute,
    monitoring_timer: u16,
    sequence: u16,
    devices: Vec<DeviceSpecification>,
}

impl FrameBuilder {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            route: NetworkRoute::default(),
            monitoring_timer: DEFAULT_MONITORING_TIMER,
            sequence: 0,
            devices: Vec::new(),
        }
    }

    /// Set the network route
    #[inline]
    pub fn route(mut self, route: NetworkRoute) -> Self {
        self.route = route;
        self
    }

    /// Set the monitoring timer (250 ms units)
    #[inline]
    pub fn monitoring_timer(mut self, units: u16) -> Self {
        self.monitoring_timer = units;
        self
    }

    /// Set the 4E sequence number (ignored for 3E)
    #[inline]
    pub fn sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    /// Add one device
    #[inline]
    pub fn device(mut self, device: DeviceSpecification) -> Self {
        self.devices.push(device);
        self
    }

    /// Add several devices
    pub fn devices<I>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = DeviceSpecification>,
    {
        self.devices.extend(devices);
        self
    }

    fn validate(&self) -> SlmpResult<()> {
        if self.devices.is_empty() {
            return Err(SlmpError::invalid_parameter(
                "devices",
                "device list must not be empty",
            ));
        }
        if self.devices.len() > MAX_READ_RANDOM_DEVICES {
            return Err(SlmpError::TooManyDevices {
                count: self.devices.len(),
                max: MAX_READ_RANDOM_DEVICES,
            });
        }
        for device in &self.devices {
            device.validate_for_read_random()?;
        }
        Ok(())
    }

    /// Build a ReadRandom (0x0403 / 0x0000) request.
    ///
    /// All validation happens before the first byte is written.
    pub fn build_read_random(self) -> SlmpResult<RequestFrame> {
        self.validate()?;

        let kind = self.kind;
        let sequence = match kind.version() {
            FrameVersion::ThreeE => 0,
            FrameVersion::FourE => self.sequence,
        };
        let capacity = kind.data_length_offset()
            + DATA_LENGTH_FIELD_LEN
            + READ_RANDOM_COMMAND_SECTION_LEN
            + DEVICE_SPEC_LEN * self.devices.len();
        let mut frame = FrameBuffer::with_capacity(capacity);

        frame.extend(&kind.request_subheader())?;
        if kind.is_four_e() {
            frame.push_u16_le(sequence)?;
            frame.push_u16_le(0x0000)?;
        }
        frame.extend(&self.route.to_bytes())?;

        let length_offset = frame.len();
        frame.push_u16_le(0)?;

        frame.push_u16_le(self.monitoring_timer)?;
        frame.push_u16_le(CMD_READ_RANDOM)?;
        frame.push_u16_le(SUBCMD_WORD_UNIT)?;
        frame.push(self.devices.len() as u8)?;
        frame.push(0)?;
        for device in &self.devices {
            frame.extend(&device.to_device_spec_bytes())?;
        }

        let data_length = frame.len() - (length_offset + DATA_LENGTH_FIELD_LEN);
        frame.patch_u16_le(length_offset, data_length as u16)?;

        debug!(
            "ReadRandom frame built: kind={}, seq={}, devices={}, data_len={}, total_len={}",
            kind,
            sequence,
            self.devices.len(),
            data_length,
            frame.len()
        );

        Ok(RequestFrame {
            kind,
            sequence,
            device_count: self.devices.len(),
            bytes: frame.freeze(),
        })
    }
}

/// Build a binary ReadRandom request with the default route.
pub fn build_read_random_request(
    devices: &[DeviceSpecification],
    version: FrameVersion,
    monitoring_timer: u16,
    sequence: u16,
) -> SlmpResult<Vec<u8>> {
    let frame = FrameBuilder::new(FrameKind::new(version, Encoding::Binary))
        .monitoring_timer(monitoring_timer)
        .sequence(sequence)
        .devices(devices.iter().copied())
        .build_read_random()?;
    Ok(frame.as_bytes().to_vec())
}

/// Build the ASCII rendering of [`build_read_random_request`].
pub fn build_read_random_request_ascii(
    devices: &[DeviceSpecification],
    version: FrameVersion,
    monitoring_timer: u16,
    sequence: u16,
) -> SlmpResult<String> {
    let frame = FrameBuilder::new(FrameKind::new(version, Encoding::Ascii))
        .monitoring_timer(monitoring_timer)
        .sequence(sequence)
        .devices(devices.iter().copied())
        .build_read_random()?;
    Ok(frame.to_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceCode;

    fn d(address: u32) -> DeviceSpecification {
        DeviceSpecification::new(DeviceCode::D, address)
    }

    #[test]
    fn test_frame_buffer_operations() {
        let mut buf = FrameBuffer::new();
        assert!(buf.is_empty());
        buf.push(0x50).unwrap();
        buf.push_u16_le(0x0403).unwrap();
        buf.extend(&[0xAA, 0xBB]).unwrap();
        assert_eq!(buf.as_slice(), &[0x50, 0x03, 0x04, 0xAA, 0xBB]);

        buf.patch_u16_le(3, 0x1234).unwrap();
        assert_eq!(buf.as_slice(), &[0x50, 0x03, 0x04, 0x34, 0x12]);
        assert!(buf.patch_u16_le(4, 0).is_err());
    }

    #[test]
    fn test_frame_buffer_limit() {
        let mut buf = FrameBuffer::new();
        buf.extend(&vec![0u8; MAX_FRAME_LENGTH]).unwrap();
        assert!(buf.push(0).is_err());
    }

    #[test]
    fn test_3e_single_device_layout() {
        let frame = build_read_random_request(&[d(100)], FrameVersion::ThreeE, 32, 0).unwrap();
        assert_eq!(
            frame,
            vec![
                0x50, 0x00, // subheader
                0x00, 0xFF, 0xFF, 0x03, 0x00, // route
                0x0C, 0x00, // data length = 12
                0x20, 0x00, // monitoring timer
                0x03, 0x04, // command
                0x00, 0x00, // subcommand
                0x01, 0x00, // word / dword count
                0x64, 0x00, 0x00, 0xA8, // D100
            ]
        );
        assert_eq!(frame.len(), 21);
    }

    #[test]
    fn test_4e_layout_carries_sequence() {
        let frame = build_read_random_request(&[d(0)], FrameVersion::FourE, 16, 0x0102).unwrap();
        assert_eq!(&frame[0..6], &[0x54, 0x00, 0x02, 0x01, 0x00, 0x00]);
        assert_eq!(&frame[6..11], &[0x00, 0xFF, 0xFF, 0x03, 0x00]);
        assert_eq!(u16::from_le_bytes([frame[11], frame[12]]), 12);
        assert_eq!(&frame[13..15], &[0x10, 0x00]);
        assert_eq!(frame.len(), 25);
    }

    #[test]
    fn test_3e_ignores_sequence() {
        let frame = FrameBuilder::new(FrameKind::ThreeEBinary)
            .sequence(77)
            .device(d(1))
            .build_read_random()
            .unwrap();
        assert_eq!(frame.sequence(), 0);
        assert_eq!(&frame.as_bytes()[0..2], &[0x50, 0x00]);
    }

    #[test]
    fn test_data_length_multiple_devices() {
        let devices: Vec<_> = (0..10).map(d).collect();
        let frame = FrameBuilder::new(FrameKind::FourEBinary)
            .devices(devices)
            .build_read_random()
            .unwrap();
        assert_eq!(frame.data_length() as usize, 8 + 4 * 10);
        assert_eq!(frame.len(), 13 + frame.data_length() as usize);
        assert_eq!(frame.device_count(), 10);
    }

    #[test]
    fn test_ascii_is_hex_of_binary() {
        let devices = [d(100), DeviceSpecification::new(DeviceCode::W, 0x1A)];
        let binary = build_read_random_request(&devices, FrameVersion::ThreeE, 32, 0).unwrap();
        let ascii = build_read_random_request_ascii(&devices, FrameVersion::ThreeE, 32, 0).unwrap();
        assert_eq!(ascii, bytes_to_hex(&binary));
        assert_eq!(ascii.len(), binary.len() * 2);
        assert!(ascii.starts_with("500000FFFF0300"));
    }

    #[test]
    fn test_ascii_wire_bytes() {
        let frame = FrameBuilder::new(FrameKind::ThreeEAscii)
            .device(d(100))
            .build_read_random()
            .unwrap();
        assert_eq!(frame.to_wire().len(), 42);
        assert_eq!(&frame.to_wire()[..4], b"5000");
    }

    #[test]
    fn test_custom_route() {
        let route = NetworkRoute::new().with_network(2).with_station(5);
        let frame = FrameBuilder::new(FrameKind::ThreeEBinary)
            .route(route)
            .device(d(0))
            .build_read_random()
            .unwrap();
        assert_eq!(&frame.as_bytes()[2..4], &[0x02, 0x05]);
    }

    #[test]
    fn test_empty_device_list_rejected() {
        let err = build_read_random_request(&[], FrameVersion::ThreeE, 32, 0).unwrap_err();
        assert!(matches!(err, SlmpError::InvalidParameter { .. }));
    }

    #[test]
    fn test_device_ceiling() {
        let devices: Vec<_> = (0..255).map(d).collect();
        assert!(build_read_random_request(&devices, FrameVersion::FourE, 32, 0).is_ok());

        let devices: Vec<_> = (0..256).map(d).collect();
        let err = build_read_random_request(&devices, FrameVersion::FourE, 32, 0).unwrap_err();
        assert!(matches!(err, SlmpError::TooManyDevices { count: 256, max: 255 }));
    }

    #[test]
    fn test_unsupported_devices_rejected() {
        for code in [DeviceCode::TS, DeviceCode::TC, DeviceCode::CS, DeviceCode::CC] {
            let devices = [d(0), DeviceSpecification::new(code, 1)];
            let err = build_read_random_request(&devices, FrameVersion::ThreeE, 32, 0).unwrap_err();
            assert!(matches!(
                err,
                SlmpError::UnsupportedDeviceForCommand { command: 0x0403, .. }
            ));
        }
    }

    #[test]
    fn test_address_out_of_range_rejected() {
        let err = build_read_random_request(&[d(0x0100_0000)], FrameVersion::ThreeE, 32, 0)
            .unwrap_err();
        assert!(matches!(err, SlmpError::InvalidParameter { .. }));
    }
}
