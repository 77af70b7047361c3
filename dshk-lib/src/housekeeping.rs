//! Data Storage (DS) housekeeping telemetry payload and packet.
use std::borrow::Cow;

use tracing::trace;

use crate::spacepacket::{PrimaryHeader, SecondaryHeader, TelemetryHeader};
use crate::{Cursor, Result};

/// Size of the filter table filename field.
pub const FILENAME_LEN: usize = 32;

/// DS application housekeeping counters.
///
/// Multi-byte counters are held in host byte order. The spare alignment byte
/// present on the wire is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HousekeepingPayload {
    /// Count of valid commands received
    pub cmd_accepted: u8,
    /// Count of invalid commands received
    pub cmd_rejected: u8,
    /// Count of destination file table loads
    pub dest_table_load: u8,
    /// Count of failed attempts to get destination table data pointer
    pub dest_table_err: u8,
    /// Count of packet filter table loads
    pub filter_table_load: u8,
    /// Count of failed attempts to get filter table data pointer
    pub filter_table_err: u8,
    /// Application enable/disable state
    pub app_enable_state: u8,
    /// Count of good destination file writes
    pub file_write: u16,
    /// Count of bad destination file writes
    pub file_write_err: u16,
    /// Count of good updates to secondary header
    pub file_update: u16,
    /// Count of bad updates to secondary header
    pub file_update_err: u16,
    /// Count of packets discarded because DS was disabled
    pub disabled_pkt: u32,
    /// Count of packets discarded because the file or filter table failed to load,
    /// or because the packet was not in the filter table
    pub ignored_pkt: u32,
    /// Count of packets discarded by the filter test
    pub filtered_pkt: u32,
    /// Count of packets that passed the filter test
    pub passed_pkt: u32,
    /// Filter table filename; NUL terminated or NUL padded
    pub filter_table_filename: [u8; FILENAME_LEN],
}

impl HousekeepingPayload {
    pub const LEN: usize = 64;

    /// Decode the next 64 bytes of `cursor`.
    ///
    /// # Errors
    /// [crate::Error::InsufficientData] if fewer than 64 bytes remain.
    pub fn decode(cursor: &mut Cursor) -> Result<Self> {
        let raw = cursor.read_exact(Self::LEN)?;
        Self::decode_fields(&mut Cursor::new(raw))
    }

    // Reads from a cursor over exactly `LEN` bytes, so none of these can fail.
    fn decode_fields(c: &mut Cursor) -> Result<Self> {
        let cmd_accepted = c.read_u8()?;
        let cmd_rejected = c.read_u8()?;
        let dest_table_load = c.read_u8()?;
        let dest_table_err = c.read_u8()?;
        let filter_table_load = c.read_u8()?;
        let filter_table_err = c.read_u8()?;
        let app_enable_state = c.read_u8()?;
        let _spare = c.read_u8()?;

        let file_write = c.read_be_u16()?;
        let file_write_err = c.read_be_u16()?;
        let file_update = c.read_be_u16()?;
        let file_update_err = c.read_be_u16()?;

        let disabled_pkt = c.read_be_u32()?;
        let ignored_pkt = c.read_be_u32()?;
        let filtered_pkt = c.read_be_u32()?;
        let passed_pkt = c.read_be_u32()?;

        let filter_table_filename = c.read_array::<FILENAME_LEN>()?;

        Ok(HousekeepingPayload {
            cmd_accepted,
            cmd_rejected,
            dest_table_load,
            dest_table_err,
            filter_table_load,
            filter_table_err,
            app_enable_state,
            file_write,
            file_write_err,
            file_update,
            file_update_err,
            disabled_pkt,
            ignored_pkt,
            filtered_pkt,
            passed_pkt,
            filter_table_filename,
        })
    }

    /// Filename bytes up to the first NUL, decoded lossily as text.
    #[must_use]
    pub fn filter_table_filename_str(&self) -> Cow<'_, str> {
        let end = self
            .filter_table_filename
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(FILENAME_LEN);
        String::from_utf8_lossy(&self.filter_table_filename[..end])
    }

    /// Encode to wire format; the spare byte is written as 0.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[..8].copy_from_slice(&[
            self.cmd_accepted,
            self.cmd_rejected,
            self.dest_table_load,
            self.dest_table_err,
            self.filter_table_load,
            self.filter_table_err,
            self.app_enable_state,
            0,
        ]);
        buf[8..10].copy_from_slice(&self.file_write.to_be_bytes());
        buf[10..12].copy_from_slice(&self.file_write_err.to_be_bytes());
        buf[12..14].copy_from_slice(&self.file_update.to_be_bytes());
        buf[14..16].copy_from_slice(&self.file_update_err.to_be_bytes());
        buf[16..20].copy_from_slice(&self.disabled_pkt.to_be_bytes());
        buf[20..24].copy_from_slice(&self.ignored_pkt.to_be_bytes());
        buf[24..28].copy_from_slice(&self.filtered_pkt.to_be_bytes());
        buf[28..32].copy_from_slice(&self.passed_pkt.to_be_bytes());
        buf[32..].copy_from_slice(&self.filter_table_filename);
        buf
    }
}

/// A single DS housekeeping telemetry packet.
///
/// # Example
/// Decode a packet with a secondary header.
/// ```
/// use dshk::{Cursor, Packet};
///
/// let mut dat = vec![
///     // primary header bytes
///     0x08, 0x00, 0x00, 0x01, 0x00, 0x3f,
///     // secondary header time
///     0x5f, 0x00, 0x00, 0x00, 0x00, 0x00,
/// ];
/// dat.extend_from_slice(&[0u8; 64]);
///
/// let (packet, consumed) = Packet::decode(&mut Cursor::new(&dat)).unwrap();
/// assert_eq!(consumed, 76);
/// assert_eq!(packet.secondary().unwrap().seconds, 0x5f00_0000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packet {
    header: TelemetryHeader,
    payload: HousekeepingPayload,
}

impl Packet {
    #[must_use]
    pub fn new(header: TelemetryHeader, payload: HousekeepingPayload) -> Self {
        Packet { header, payload }
    }

    /// Decode a telemetry header followed by a payload.
    ///
    /// Returns the packet and the number of bytes consumed from `cursor`.
    ///
    /// # Errors
    /// [crate::Error::InsufficientData] from whichever read could not be satisfied.
    pub fn decode(cursor: &mut Cursor) -> Result<(Packet, usize)> {
        let start = cursor.position();
        let header = TelemetryHeader::decode(cursor)?;
        let payload = HousekeepingPayload::decode(cursor)?;
        let consumed = cursor.position() - start;
        trace!(offset = start, consumed, "decoded packet");
        Ok((Packet { header, payload }, consumed))
    }

    #[must_use]
    pub fn header(&self) -> &TelemetryHeader {
        &self.header
    }

    #[must_use]
    pub fn primary(&self) -> &PrimaryHeader {
        self.header.primary()
    }

    #[must_use]
    pub fn secondary(&self) -> Option<&SecondaryHeader> {
        self.header.secondary()
    }

    #[must_use]
    pub fn payload(&self) -> &HousekeepingPayload {
        &self.payload
    }

    /// Number of bytes this packet occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len() + HousekeepingPayload::LEN
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.header.encode();
        buf.extend_from_slice(&self.payload.encode());
        buf
    }
}

/// Decode a single packet from `cursor`. See [Packet::decode].
///
/// # Errors
/// [crate::Error::InsufficientData] if the packet is truncated.
pub fn decode_packet(cursor: &mut Cursor) -> Result<(Packet, usize)> {
    Packet::decode(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn payload_bytes() -> [u8; 64] {
        let mut dat = [0u8; 64];
        dat[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 1, 0xaa]);
        // file_write
        dat[8..10].copy_from_slice(&[0x01, 0x02]);
        dat[10..12].copy_from_slice(&[0x00, 0x03]);
        dat[12..14].copy_from_slice(&[0xff, 0xfe]);
        dat[14..16].copy_from_slice(&[0x80, 0x00]);
        // disabled_pkt
        dat[16..20].copy_from_slice(&[0x00, 0x00, 0x00, 0x05]);
        dat[20..24].copy_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        dat[24..28].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        dat[28..32].copy_from_slice(&[0x00, 0x01, 0x00, 0x00]);
        dat[32..32 + 18].copy_from_slice(b"/cf/ds_filter.tbl\0");
        dat
    }

    #[test]
    fn decode_payload() {
        let dat = payload_bytes();
        let mut cursor = Cursor::new(&dat);
        let p = HousekeepingPayload::decode(&mut cursor).unwrap();

        assert!(cursor.at_end());
        assert_eq!(p.cmd_accepted, 1);
        assert_eq!(p.cmd_rejected, 2);
        assert_eq!(p.dest_table_load, 3);
        assert_eq!(p.dest_table_err, 4);
        assert_eq!(p.filter_table_load, 5);
        assert_eq!(p.filter_table_err, 6);
        assert_eq!(p.app_enable_state, 1);
        assert_eq!(p.file_write, 258);
        assert_eq!(p.file_write_err, 3);
        assert_eq!(p.file_update, 0xfffe);
        assert_eq!(p.file_update_err, 0x8000);
        assert_eq!(p.disabled_pkt, 5);
        assert_eq!(p.ignored_pkt, 0x0102_0304);
        assert_eq!(p.filtered_pkt, u32::MAX);
        assert_eq!(p.passed_pkt, 65536);
        assert_eq!(p.filter_table_filename_str(), "/cf/ds_filter.tbl");
        assert_eq!(&p.filter_table_filename[..4], b"/cf/");
    }

    #[test]
    fn encode_payload_zeroes_spare() {
        let dat = payload_bytes();
        let p = HousekeepingPayload::decode(&mut Cursor::new(&dat)).unwrap();
        let encoded = p.encode();

        assert_eq!(encoded[7], 0);
        assert_eq!(encoded[..7], dat[..7]);
        assert_eq!(encoded[8..], dat[8..]);
    }

    #[test]
    fn filename_without_nul_uses_all_bytes() {
        let p = HousekeepingPayload {
            filter_table_filename: [b'a'; FILENAME_LEN],
            ..Default::default()
        };
        assert_eq!(p.filter_table_filename_str().len(), FILENAME_LEN);
    }

    #[test]
    fn payload_not_enough_bytes() {
        let dat = [0u8; 63];
        let mut cursor = Cursor::new(&dat);

        assert_eq!(
            HousekeepingPayload::decode(&mut cursor),
            Err(Error::InsufficientData {
                needed: 64,
                available: 63
            })
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn decode_packet_without_secondary() {
        let mut dat = vec![0x00, 0x00, 0x00, 0x01, 0x00, 0x3f];
        dat.extend_from_slice(&payload_bytes());

        let mut cursor = Cursor::new(&dat);
        let (packet, consumed) = decode_packet(&mut cursor).unwrap();

        assert_eq!(consumed, 70);
        assert!(packet.secondary().is_none());
        assert!(!packet.primary().has_secondary_header());
        assert_eq!(packet.payload().file_write, 258);
        assert_eq!(packet.encoded_len(), 70);
    }

    #[test]
    fn packet_round_trip() {
        let payload = HousekeepingPayload::decode(&mut Cursor::new(&payload_bytes())).unwrap();
        let header = TelemetryHeader::new(
            PrimaryHeader::new(0x2b8, 42).with_length_field(69),
            Some(SecondaryHeader::new(0x5f00_0000, 123)),
        );
        let packet = Packet::new(header, payload);

        let encoded = packet.encode();
        assert_eq!(encoded.len(), packet.encoded_len());

        let (decoded, consumed) = decode_packet(&mut Cursor::new(&encoded)).unwrap();
        assert_eq!(consumed, 76);
        assert_eq!(decoded, packet);
    }
}
