//! CCSDS primary header and cFS telemetry header decoding.
//!
//! References:
//! * CCSDS Space Packet Protocol 133.0-B-1
//!     - https://public.ccsds.org/Pubs/133x0b1c2.pdf
mod summary;
#[cfg(feature = "timecode")]
mod timecode;

use tracing::trace;

use crate::{Cursor, Result};

pub use summary::{missing_packets, ApidSummary, Summary};
#[cfg(feature = "timecode")]
pub use timecode::mission_epoch;

pub type Apid = u16;

/// Packet is a part of a packet group, but not first and not last
pub const SEQ_CONTINUATION: u8 = 0;
/// Packet is the first packet in a packet group
pub const SEQ_FIRST: u8 = 1;
/// Packet is the last packet in a packet group
pub const SEQ_LAST: u8 = 2;
/// Packet is not part of a packet group, i.e., standalone.
pub const SEQ_UNSEGMENTED: u8 = 3;

const APID_MASK: u16 = 0x07ff;
const SECONDARY_HEADER_MASK: u16 = 0x0800;
const PACKET_TYPE_MASK: u16 = 0x1000;
const VERSION_MASK: u16 = 0xe000;
const SEQ_COUNT_MASK: u16 = 0x3fff;
const SEQ_FLAGS_MASK: u16 = 0xc000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PacketType {
    Telemetry,
    Command,
}

impl PacketType {
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            PacketType::Telemetry => 0,
            PacketType::Command => 1,
        }
    }
}

/// CCSDS version number. Reserved values are kept rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CcsdsVersion {
    Version1,
    Version2,
    Unknown(u8),
}

impl From<u8> for CcsdsVersion {
    fn from(value: u8) -> Self {
        match value {
            0 => CcsdsVersion::Version1,
            1 => CcsdsVersion::Version2,
            v => CcsdsVersion::Unknown(v),
        }
    }
}

/// CCSDS Primary Header
///
/// Holds the three raw header words; every subfield is derived from them on access.
///
/// # Example
/// ```
/// use dshk::{Cursor, PrimaryHeader};
///
/// let dat: &[u8] = &[0x08, 0x00, 0xc0, 0x01, 0x00, 0x3f];
/// let header = PrimaryHeader::decode(&mut Cursor::new(dat)).unwrap();
/// assert!(header.has_secondary_header());
/// assert_eq!(header.sequence_count(), 1);
/// assert_eq!(header.segmentation_flags(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimaryHeader {
    stream_id: u16,
    sequence: u16,
    length: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = 16383;
    /// Difference between the total packet size and the length field.
    pub const LENGTH_OFFSET: usize = 7;

    /// Decode a header from the next 6 bytes of `cursor`.
    ///
    /// # Errors
    /// [crate::Error::InsufficientData] if fewer than 6 bytes remain.
    pub fn decode(cursor: &mut Cursor) -> Result<Self> {
        let buf = cursor.read_exact(Self::LEN)?;
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        Ok(Self::from_words(d1, d2, d3))
    }

    /// Construct from host order stream id, sequence and length words.
    #[must_use]
    pub fn from_words(stream_id: u16, sequence: u16, length: u16) -> Self {
        PrimaryHeader {
            stream_id,
            sequence,
            length,
        }
    }

    /// A version 1, unsegmented telemetry header without a secondary header.
    ///
    /// `apid` and `sequence_count` are masked to 11 and 14 bits. The length field is 0;
    /// see [PrimaryHeader::with_length_field].
    #[must_use]
    pub fn new(apid: Apid, sequence_count: u16) -> Self {
        Self::from_words(
            apid & APID_MASK,
            (u16::from(SEQ_UNSEGMENTED) << 14) | (sequence_count & SEQ_COUNT_MASK),
            0,
        )
    }

    #[must_use]
    pub fn with_secondary_header(mut self, present: bool) -> Self {
        if present {
            self.stream_id |= SECONDARY_HEADER_MASK;
        } else {
            self.stream_id &= !SECONDARY_HEADER_MASK;
        }
        self
    }

    #[must_use]
    pub fn with_packet_type(mut self, packet_type: PacketType) -> Self {
        self.stream_id =
            (self.stream_id & !PACKET_TYPE_MASK) | (u16::from(packet_type.flag()) << 12);
        self
    }

    /// Set the 3-bit version number; higher bits of `version` are dropped.
    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.stream_id =
            (self.stream_id & !VERSION_MASK) | ((u16::from(version) << 13) & VERSION_MASK);
        self
    }

    /// Set the 2-bit segmentation flags; see the `SEQ_*` values.
    #[must_use]
    pub fn with_segmentation_flags(mut self, flags: u8) -> Self {
        self.sequence =
            (self.sequence & !SEQ_FLAGS_MASK) | ((u16::from(flags) << 14) & SEQ_FLAGS_MASK);
        self
    }

    #[must_use]
    pub fn with_length_field(mut self, length: u16) -> Self {
        self.length = length;
        self
    }

    /// Raw packet identification word.
    #[must_use]
    pub fn stream_id(&self) -> u16 {
        self.stream_id
    }

    /// Raw packet sequence control word.
    #[must_use]
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    #[must_use]
    pub fn application_id(&self) -> Apid {
        self.stream_id & APID_MASK
    }

    #[must_use]
    pub fn has_secondary_header(&self) -> bool {
        self.stream_id & SECONDARY_HEADER_MASK != 0
    }

    /// Packet type bit; 0 for telemetry, 1 for command.
    #[must_use]
    pub fn packet_type_flag(&self) -> u8 {
        ((self.stream_id & PACKET_TYPE_MASK) >> 12) as u8
    }

    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        if self.packet_type_flag() == 0 {
            PacketType::Telemetry
        } else {
            PacketType::Command
        }
    }

    /// Raw 3-bit version number; 0 is CCSDS version 1.
    #[must_use]
    pub fn ccsds_version(&self) -> u8 {
        ((self.stream_id & VERSION_MASK) >> 13) as u8
    }

    #[must_use]
    pub fn version(&self) -> CcsdsVersion {
        CcsdsVersion::from(self.ccsds_version())
    }

    #[must_use]
    pub fn sequence_count(&self) -> u16 {
        self.sequence & SEQ_COUNT_MASK
    }

    /// Defines a packets grouping. See the `SEQ_*` values.
    #[must_use]
    pub fn segmentation_flags(&self) -> u8 {
        ((self.sequence & SEQ_FLAGS_MASK) >> 14) as u8
    }

    /// True when this packet is not part of a packet group.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.segmentation_flags() == SEQ_UNSEGMENTED
    }

    /// Raw length word. By convention the total packet size minus 7, but it is not
    /// used for framing.
    #[must_use]
    pub fn packet_length_field(&self) -> u16 {
        self.length
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..2].copy_from_slice(&self.stream_id.to_be_bytes());
        buf[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        buf[4..6].copy_from_slice(&self.length.to_be_bytes());
        buf
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PrimaryHeader {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("PrimaryHeader", 8)?;
        s.serialize_field("stream_id", &self.stream_id)?;
        s.serialize_field("application_id", &self.application_id())?;
        s.serialize_field("has_secondary_header", &self.has_secondary_header())?;
        s.serialize_field("packet_type", &self.packet_type())?;
        s.serialize_field("ccsds_version", &self.ccsds_version())?;
        s.serialize_field("sequence_count", &self.sequence_count())?;
        s.serialize_field("segmentation_flags", &self.segmentation_flags())?;
        s.serialize_field("packet_length_field", &self.length)?;
        s.end()
    }
}

/// cFS telemetry secondary header; a 4 byte seconds and 2 byte subseconds time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SecondaryHeader {
    pub seconds: u32,
    pub subseconds: u16,
}

impl SecondaryHeader {
    pub const LEN: usize = 6;

    #[must_use]
    pub fn new(seconds: u32, subseconds: u16) -> Self {
        SecondaryHeader {
            seconds,
            subseconds,
        }
    }

    /// Decode the time from the next 6 bytes of `cursor`.
    ///
    /// # Errors
    /// [crate::Error::InsufficientData] if fewer than 6 bytes remain.
    pub fn decode(cursor: &mut Cursor) -> Result<Self> {
        let buf = cursor.read_exact(Self::LEN)?;
        Ok(SecondaryHeader {
            seconds: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            subseconds: u16::from_be_bytes([buf[4], buf[5]]),
        })
    }

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..4].copy_from_slice(&self.seconds.to_be_bytes());
        buf[4..6].copy_from_slice(&self.subseconds.to_be_bytes());
        buf
    }
}

/// Primary header plus the secondary header when the primary header flags one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TelemetryHeader {
    primary: PrimaryHeader,
    secondary: Option<SecondaryHeader>,
}

impl TelemetryHeader {
    /// Combine headers. The primary header secondary header flag is set according to
    /// whether `secondary` is provided.
    #[must_use]
    pub fn new(primary: PrimaryHeader, secondary: Option<SecondaryHeader>) -> Self {
        TelemetryHeader {
            primary: primary.with_secondary_header(secondary.is_some()),
            secondary,
        }
    }

    /// Decode a primary header and, if flagged, a secondary header.
    ///
    /// # Errors
    /// [crate::Error::InsufficientData] if either header cannot be read.
    pub fn decode(cursor: &mut Cursor) -> Result<Self> {
        let primary = PrimaryHeader::decode(cursor)?;
        let secondary = if primary.has_secondary_header() {
            Some(SecondaryHeader::decode(cursor)?)
        } else {
            None
        };
        trace!(
            apid = primary.application_id(),
            seq = primary.sequence_count(),
            secondary = secondary.is_some(),
            "decoded telemetry header"
        );
        Ok(TelemetryHeader { primary, secondary })
    }

    #[must_use]
    pub fn primary(&self) -> &PrimaryHeader {
        &self.primary
    }

    /// `None` when the primary header does not flag a secondary header.
    #[must_use]
    pub fn secondary(&self) -> Option<&SecondaryHeader> {
        self.secondary.as_ref()
    }

    /// Number of bytes this header occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self.secondary {
            Some(_) => PrimaryHeader::LEN + SecondaryHeader::LEN,
            None => PrimaryHeader::LEN,
        }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.primary.encode());
        if let Some(secondary) = &self.secondary {
            buf.extend_from_slice(&secondary.encode());
        }
        buf
    }
}
