use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use super::{Apid, PrimaryHeader};
use crate::Packet;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ApidSummary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
}

/// Tracks stats on decoded packets.
///
/// # Example
/// ```
/// use dshk::{decode_stream, Summary};
///
/// let mut dat = vec![0x00, 0x20, 0xc0, 0x01, 0x00, 0x45];
/// dat.extend_from_slice(&[0u8; 64]);
///
/// let mut summary = Summary::default();
/// for packet in decode_stream(&dat).unwrap() {
///     summary.add(&packet);
/// }
/// assert_eq!(summary.count, 1);
/// assert_eq!(summary.bytes, 70);
/// ```
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Summary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
    pub apids: HashMap<Apid, ApidSummary>,

    #[cfg_attr(feature = "serde", serde(skip))]
    seen_headers: HashMap<Apid, PrimaryHeader>,
}

impl Summary {
    pub fn add(&mut self, packet: &Packet) {
        let size = packet.encoded_len();
        self.count += 1;
        self.bytes += size;

        let hdr = *packet.header().primary();
        let apid = self.apids.entry(hdr.application_id()).or_default();
        apid.count += 1;
        apid.bytes += size;

        if let Some(last_hdr) = self.seen_headers.get(&hdr.application_id()) {
            let missing = missing_packets(hdr.sequence_count(), last_hdr.sequence_count()) as usize;
            apid.missing += missing;
            self.missing += missing;
        }
        self.seen_headers.insert(hdr.application_id(), hdr);
    }
}

/// Calculate the number of missing sequence counts.
///
/// `cur` is the current sequence count. `last` is the sequence count seen before `cur`.
#[must_use]
pub fn missing_packets(cur: u16, last: u16) -> u16 {
    let expected = if last + 1 > PrimaryHeader::SEQ_MAX {
        0
    } else {
        last + 1
    };
    if cur != expected {
        if last + 1 > cur {
            return cur + PrimaryHeader::SEQ_MAX - last;
        }
        return cur - last - 1;
    }
    0
}
