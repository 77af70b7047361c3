use std::io::Write;

use anyhow::{Context, Result};
use dshk::{spacepacket::Apid, walk_stream, Packet, WalkOptions};
use hifitime::Epoch;
use tracing::{debug, trace, warn};

/// Criteria a packet must meet to be written.
#[derive(Debug, Default, Clone)]
pub struct Criteria {
    /// Keep only these APIDs; empty keeps all.
    pub include: Vec<Apid>,
    /// Drop these APIDs.
    pub exclude: Vec<Apid>,
    /// Keep only packets with a time before this.
    pub before: Option<Epoch>,
    /// Keep only packets with a time after this.
    pub after: Option<Epoch>,
}

impl Criteria {
    fn keep(&self, packet: &Packet) -> bool {
        let apid = packet.primary().application_id();
        if !self.include.is_empty() && !self.include.contains(&apid) {
            return false;
        }
        if self.exclude.contains(&apid) {
            return false;
        }
        if self.before.is_none() && self.after.is_none() {
            return true;
        }
        // Time filters need a time
        let Some(epoch) = packet.secondary().map(|s| s.epoch()) else {
            return false;
        };
        if self.before.is_some_and(|before| epoch >= before) {
            return false;
        }
        if self.after.is_some_and(|after| epoch <= after) {
            return false;
        }
        true
    }
}

/// Write the packets in `dat` that meet `criteria` to `writer`, returning the number
/// written. Packets after a decode failure are not written.
pub fn filter<W>(dat: &[u8], mut writer: W, criteria: &Criteria) -> Result<usize>
where
    W: Write,
{
    let report = walk_stream(dat, &WalkOptions::default());
    if let Some(ref err) = report.error {
        warn!("stopped at byte offset {}: {err}", report.consumed);
    }

    let mut count = 0;
    for packet in &report.packets {
        if !criteria.keep(packet) {
            trace!(
                apid = packet.primary().application_id(),
                seq = packet.primary().sequence_count(),
                "dropping"
            );
            continue;
        }
        writer
            .write_all(&packet.encode())
            .context("writing packet")?;
        count += 1;
    }
    debug!("wrote {count} of {} packets", report.packets.len());
    Ok(count)
}
