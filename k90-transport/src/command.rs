//! Command Channel: typed request/response exchanges with the K90
//!
//! Every operation maps to exactly one vendor control transfer. Arguments are
//! validated before anything goes on the wire, so a rejected call never
//! touches the device. Each call blocks until the transfer completes or the
//! transport times out.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::TransportError;
use crate::protocol::{self, limits, request};
use crate::ControlTransport;

/// Macro playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroMode {
    /// Macros are played back by host software
    #[default]
    Software,
    /// Macros are played back by the keyboard firmware
    Hardware,
}

impl MacroMode {
    /// wValue sent with `request::MACRO_MODE`
    pub fn wire_value(self) -> u16 {
        match self {
            MacroMode::Software => protocol::macro_mode::SW,
            MacroMode::Hardware => protocol::macro_mode::HW,
        }
    }

    /// Decode the first byte of a GET_MODE response
    pub fn from_mode_byte(byte: u8) -> Option<Self> {
        match byte as u16 {
            protocol::macro_mode::SW => Some(MacroMode::Software),
            protocol::macro_mode::HW => Some(MacroMode::Hardware),
            _ => None,
        }
    }

    /// Two-letter label used by the configuration surface
    pub fn label(self) -> &'static str {
        match self {
            MacroMode::Software => "SW",
            MacroMode::Hardware => "HW",
        }
    }
}

impl fmt::Display for MacroMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of per-profile bulk blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Bindings,
    Keys,
    Data,
}

impl BlobKind {
    pub const ALL: [BlobKind; 3] = [BlobKind::Bindings, BlobKind::Keys, BlobKind::Data];

    pub fn request(self) -> u8 {
        match self {
            BlobKind::Bindings => request::PROFILE_BINDINGS,
            BlobKind::Keys => request::PROFILE_KEYS,
            BlobKind::Data => request::PROFILE_DATA,
        }
    }

    /// Largest payload accepted for this blob
    pub fn max_len(self) -> usize {
        match self {
            BlobKind::Bindings => limits::BINDINGS_MAX_LEN,
            BlobKind::Keys => limits::KEYS_MAX_LEN,
            BlobKind::Data => limits::DATA_MAX_LEN,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlobKind::Bindings => "bindings",
            BlobKind::Keys => "keys",
            BlobKind::Data => "data",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// GET_STATUS response block
///
/// Only the backlight level (byte 4) and the active profile (byte 7) are
/// understood; the remaining bytes are kept opaque.
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct StatusReport {
    _unknown0: [u8; 4],
    backlight: u8,
    _unknown1: [u8; 2],
    profile: u8,
}

impl StatusReport {
    /// Parse the fixed 8-byte block
    pub fn parse(data: &[u8]) -> Result<Self, TransportError> {
        if data.len() < limits::STATUS_LEN {
            return Err(TransportError::ShortTransfer {
                expected: limits::STATUS_LEN,
                actual: data.len(),
            });
        }
        StatusReport::read_from_bytes(&data[..limits::STATUS_LEN]).map_err(|_| {
            TransportError::ShortTransfer {
                expected: limits::STATUS_LEN,
                actual: data.len(),
            }
        })
    }

    /// Backlight level as reported (not clamped)
    pub fn backlight(&self) -> u8 {
        self.backlight
    }

    /// Active profile as reported (not range checked)
    pub fn profile(&self) -> u8 {
        self.profile
    }
}

/// GET_MODE response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReport {
    raw: [u8; limits::MODE_LEN],
}

impl From<[u8; limits::MODE_LEN]> for ModeReport {
    fn from(raw: [u8; limits::MODE_LEN]) -> Self {
        Self { raw }
    }
}

impl ModeReport {
    pub fn raw(&self) -> [u8; limits::MODE_LEN] {
        self.raw
    }

    /// Decoded mode, `None` if byte 0 is not a known mode value
    pub fn mode(&self) -> Option<MacroMode> {
        MacroMode::from_mode_byte(self.raw[0])
    }
}

/// Typed front end over a [`ControlTransport`]
///
/// Cheap to clone; every clone shares the same transport.
#[derive(Clone)]
pub struct CommandChannel {
    transport: Arc<dyn ControlTransport>,
}

impl CommandChannel {
    pub fn new(transport: Arc<dyn ControlTransport>) -> Self {
        Self { transport }
    }

    /// Read the status block (backlight level, active profile)
    pub fn get_status(&self) -> Result<StatusReport, TransportError> {
        let mut buf = [0u8; limits::STATUS_LEN];
        self.read_exact(request::STATUS, &mut buf)?;
        StatusReport::parse(&buf)
    }

    /// Read the current macro mode word
    pub fn get_mode(&self) -> Result<ModeReport, TransportError> {
        let mut buf = [0u8; limits::MODE_LEN];
        self.read_exact(request::GET_MODE, &mut buf)?;
        Ok(ModeReport::from(buf))
    }

    /// Set backlight brightness (0..=3)
    pub fn set_brightness(&self, level: u8) -> Result<(), TransportError> {
        if level > limits::BACKLIGHT_MAX {
            return Err(TransportError::InvalidValue(format!(
                "brightness {} out of range 0-{}",
                level,
                limits::BACKLIGHT_MAX
            )));
        }
        self.send(request::BRIGHTNESS, level as u16, 0, &[])
    }

    /// Switch macro playback between host software and keyboard firmware
    pub fn set_macro_mode(&self, mode: MacroMode) -> Result<(), TransportError> {
        self.send(request::MACRO_MODE, mode.wire_value(), 0, &[])
    }

    /// Drive the red macro-record LED
    pub fn set_record_led(&self, on: bool) -> Result<(), TransportError> {
        let value = if on {
            protocol::record_led::ON
        } else {
            protocol::record_led::OFF
        };
        self.send(request::MACRO_MODE, value, 0, &[])
    }

    /// Select the active profile (1..=3)
    pub fn set_profile(&self, profile: u8) -> Result<(), TransportError> {
        check_profile(profile)?;
        self.send(request::PROFILE, profile as u16, 0, &[])
    }

    /// Upload a bulk blob to one profile slot
    ///
    /// The size bound for `kind` is checked before the transfer.
    pub fn write_profile_blob(
        &self,
        kind: BlobKind,
        profile: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        if data.len() > kind.max_len() {
            return Err(TransportError::PayloadTooLarge {
                kind,
                len: data.len(),
                max: kind.max_len(),
            });
        }
        check_profile(profile)?;
        self.send(kind.request(), 0, profile as u16, data)
    }

    pub fn write_bindings(&self, profile: u8, data: &[u8]) -> Result<(), TransportError> {
        self.write_profile_blob(BlobKind::Bindings, profile, data)
    }

    pub fn write_keys(&self, profile: u8, data: &[u8]) -> Result<(), TransportError> {
        self.write_profile_blob(BlobKind::Keys, profile, data)
    }

    pub fn write_data(&self, profile: u8, data: &[u8]) -> Result<(), TransportError> {
        self.write_profile_blob(BlobKind::Data, profile, data)
    }

    fn send(&self, req: u8, value: u16, index: u16, data: &[u8]) -> Result<(), TransportError> {
        debug!(
            "control out: req={} value=0x{:04x} index={} len={}",
            req,
            value,
            index,
            data.len()
        );
        self.transport
            .control_out(req, value, index, data)
            .inspect_err(|e| warn!("control out req={} failed: {}", req, e))
    }

    fn read_exact(&self, req: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        let n = self
            .transport
            .control_in(req, 0, 0, buf)
            .inspect_err(|e| warn!("control in req={} failed: {}", req, e))?;
        debug!("control in: req={} got {} bytes: {:02X?}", req, n, &buf[..n.min(buf.len())]);
        if n < buf.len() {
            return Err(TransportError::ShortTransfer {
                expected: buf.len(),
                actual: n,
            });
        }
        Ok(())
    }
}

fn check_profile(profile: u8) -> Result<(), TransportError> {
    if profile == 0 || profile > protocol::PROFILE_COUNT {
        return Err(TransportError::InvalidValue(format!(
            "profile {} out of range 1-{}",
            profile,
            protocol::PROFILE_COUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Direction, MockTransport};

    fn channel() -> (Arc<MockTransport>, CommandChannel) {
        let mock = Arc::new(MockTransport::new());
        let channel = CommandChannel::new(mock.clone());
        (mock, channel)
    }

    #[test]
    fn test_get_status_decodes_backlight_and_profile() {
        let (mock, ch) = channel();
        mock.respond(request::STATUS, &[0, 0, 0, 0, 2, 0, 0, 3]);

        let status = ch.get_status().unwrap();
        assert_eq!(status.backlight(), 2);
        assert_eq!(status.profile(), 3);

        let t = &mock.transfers()[0];
        assert_eq!(t.direction, Direction::In);
        assert_eq!((t.request, t.value, t.index), (request::STATUS, 0, 0));
    }

    #[test]
    fn test_get_status_short_read_is_error() {
        let (mock, ch) = channel();
        mock.respond(request::STATUS, &[0, 0, 0, 0, 2]);

        match ch.get_status() {
            Err(TransportError::ShortTransfer { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 5);
            }
            other => panic!("expected short transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_get_mode() {
        let (mock, ch) = channel();
        mock.respond(request::GET_MODE, &[0x01, 0x00]);
        assert_eq!(ch.get_mode().unwrap().mode(), Some(MacroMode::Hardware));

        mock.respond(request::GET_MODE, &[0x30, 0x00]);
        assert_eq!(ch.get_mode().unwrap().mode(), Some(MacroMode::Software));

        mock.respond(request::GET_MODE, &[0x7f, 0x00]);
        let report = ch.get_mode().unwrap();
        assert_eq!(report.mode(), None);
        assert_eq!(report.raw(), [0x7f, 0x00]);
    }

    #[test]
    fn test_set_brightness_wire_format() {
        let (mock, ch) = channel();
        ch.set_brightness(3).unwrap();

        let out = mock.outgoing();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].request, 49);
        assert_eq!(out[0].value, 3);
        assert_eq!(out[0].index, 0);
        assert!(out[0].data.is_empty());
    }

    #[test]
    fn test_set_brightness_out_of_range_sends_nothing() {
        let (mock, ch) = channel();
        assert!(matches!(
            ch.set_brightness(4),
            Err(TransportError::InvalidValue(_))
        ));
        assert!(mock.transfers().is_empty());
    }

    #[test]
    fn test_macro_mode_and_record_led_share_opcode() {
        let (mock, ch) = channel();
        ch.set_macro_mode(MacroMode::Hardware).unwrap();
        ch.set_macro_mode(MacroMode::Software).unwrap();
        ch.set_record_led(true).unwrap();
        ch.set_record_led(false).unwrap();

        let values: Vec<(u8, u16)> = mock
            .outgoing()
            .iter()
            .map(|t| (t.request, t.value))
            .collect();
        assert_eq!(
            values,
            vec![(2, 0x0001), (2, 0x0030), (2, 0x0020), (2, 0x0040)]
        );
    }

    #[test]
    fn test_set_profile_validates_domain() {
        let (mock, ch) = channel();
        assert!(ch.set_profile(0).is_err());
        assert!(ch.set_profile(4).is_err());
        assert!(mock.transfers().is_empty());

        ch.set_profile(2).unwrap();
        let out = mock.outgoing();
        assert_eq!((out[0].request, out[0].value, out[0].index), (20, 2, 0));
    }

    #[test]
    fn test_blob_bounds() {
        let (mock, ch) = channel();

        ch.write_bindings(1, &[0xaa; 128]).unwrap();
        ch.write_keys(2, &[0xbb; 64]).unwrap();
        ch.write_data(3, &[0xcc; 4096]).unwrap();
        assert_eq!(mock.outgoing().len(), 3);
        mock.clear();

        for (kind, max) in [
            (BlobKind::Bindings, 128),
            (BlobKind::Keys, 64),
            (BlobKind::Data, 4096),
        ] {
            let err = ch
                .write_profile_blob(kind, 1, &vec![0u8; max + 1])
                .unwrap_err();
            match err {
                TransportError::PayloadTooLarge { kind: k, len, max: m } => {
                    assert_eq!(k, kind);
                    assert_eq!(len, max + 1);
                    assert_eq!(m, max);
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
        assert!(mock.transfers().is_empty());
    }

    #[test]
    fn test_blob_uses_index_as_profile_selector() {
        let (mock, ch) = channel();
        ch.write_keys(3, &[1, 2, 3]).unwrap();

        let out = mock.outgoing();
        assert_eq!(out[0].request, request::PROFILE_KEYS);
        assert_eq!(out[0].value, 0);
        assert_eq!(out[0].index, 3);
        assert_eq!(out[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn test_transport_failure_surfaces_verbatim() {
        let (mock, ch) = channel();
        mock.fail(request::PROFILE);
        assert!(matches!(
            ch.set_profile(1),
            Err(TransportError::Usb(rusb::Error::Pipe))
        ));
    }
}
