//! Sequential decoding of back-to-back packets from a byte buffer.
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::housekeeping::{decode_packet, Packet};
use crate::spacepacket::PrimaryHeader;
use crate::{Cursor, Error, Result};

/// Stream walker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// More bytes remain to be decoded.
    Ready,
    /// All bytes were decoded into packets.
    Done,
    /// A packet failed to decode; no further packets will be produced.
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Require the primary header length field to agree with the number of bytes
    /// decoded for each packet. Framing never depends on the length field; this only
    /// adds a check after each packet is decoded.
    pub validate_length: bool,
}

/// Iterator over the packets in a buffer of concatenated packets.
///
/// Produces each decoded packet in stream order. The first failure is produced as an
/// `Err` after which iteration ends; there is no resynchronization. A buffer whose
/// trailing packet is truncated is a failure.
///
/// # Example
/// ```
/// use dshk::stream::{State, Walker};
///
/// let mut dat = vec![0x00, 0x20, 0xc0, 0x01, 0x00, 0x45];
/// dat.extend_from_slice(&[0u8; 64]);
/// dat.extend_from_slice(&[0x00, 0x20]);
///
/// let mut walker = Walker::new(&dat);
/// assert!(walker.next().unwrap().is_ok());
/// assert!(walker.next().unwrap().is_err());
/// assert_eq!(walker.state(), State::Failed);
/// assert_eq!(walker.position(), 70);
/// assert!(walker.next().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    cursor: Cursor<'a>,
    state: State,
    options: WalkOptions,
}

impl<'a> Walker<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, WalkOptions::default())
    }

    #[must_use]
    pub fn with_options(buf: &'a [u8], options: WalkOptions) -> Self {
        let state = if buf.is_empty() {
            State::Done
        } else {
            State::Ready
        };
        Walker {
            cursor: Cursor::new(buf),
            state,
            options,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of bytes consumed. After a failure this is the offset at which the
    /// failing read was attempted.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    fn step(&mut self) -> Result<Packet> {
        let (packet, consumed) = decode_packet(&mut self.cursor)?;
        if self.options.validate_length {
            check_length(&packet, consumed)?;
        }
        Ok(packet)
    }
}

fn check_length(packet: &Packet, consumed: usize) -> Result<()> {
    let length_field = packet.primary().packet_length_field();
    let expected = usize::from(length_field) + PrimaryHeader::LENGTH_OFFSET;
    if expected != consumed {
        return Err(Error::LengthMismatch {
            length_field,
            expected,
            actual: consumed,
        });
    }
    Ok(())
}

impl Iterator for Walker<'_> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != State::Ready {
            return None;
        }

        match self.step() {
            Ok(packet) => {
                if self.cursor.at_end() {
                    self.state = State::Done;
                    debug!(bytes = self.cursor.position(), "stream done");
                }
                Some(Ok(packet))
            }
            Err(err) => {
                self.state = State::Failed;
                debug!(offset = self.cursor.position(), "stream failed: {err}");
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Walker<'_> {}

/// Decode all packets in `buf`.
///
/// An empty buffer produces no packets.
///
/// # Errors
/// The first error encountered; packets decoded before it are discarded. Use
/// [walk_stream] to keep them.
///
/// # Example
/// ```
/// let mut dat = vec![0x08, 0x00, 0x00, 0x01, 0x00, 0x3f, 0x5f, 0, 0, 0, 0, 0];
/// dat.extend_from_slice(&[0u8; 64]);
/// let twice = [dat.clone(), dat].concat();
///
/// let packets = dshk::decode_stream(&twice).unwrap();
/// assert_eq!(packets.len(), 2);
/// ```
pub fn decode_stream(buf: &[u8]) -> Result<Vec<Packet>> {
    Walker::new(buf).collect()
}

/// Result of walking an entire buffer.
#[derive(Debug, Clone)]
pub struct StreamReport {
    /// Packets decoded before any failure, in stream order.
    pub packets: Vec<Packet>,
    /// Bytes consumed; the failure offset when `error` is set.
    pub consumed: usize,
    pub error: Option<Error>,
}

impl StreamReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode all packets in `buf`, keeping the packets decoded before a failure.
#[must_use]
pub fn walk_stream(buf: &[u8], options: &WalkOptions) -> StreamReport {
    let mut walker = Walker::with_options(buf, *options);
    let mut packets = Vec::default();
    let mut error = None;
    for zult in walker.by_ref() {
        match zult {
            Ok(packet) => packets.push(packet),
            Err(err) => error = Some(err),
        }
    }
    trace!(packets = packets.len(), state = ?walker.state(), "walked stream");

    StreamReport {
        packets,
        consumed: walker.position(),
        error,
    }
}
