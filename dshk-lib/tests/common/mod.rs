use std::path::PathBuf;

use dshk::{HousekeepingPayload, Packet, PrimaryHeader, SecondaryHeader, TelemetryHeader};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// A packet with a secondary header and a length field consistent with its size.
#[allow(dead_code)]
pub fn synthetic_packet(seq: u16, seconds: u32) -> Packet {
    let payload = HousekeepingPayload {
        cmd_accepted: 3,
        file_write: 0x0102,
        disabled_pkt: 5,
        passed_pkt: u32::from(seq) * 1000,
        ..Default::default()
    };
    Packet::new(
        TelemetryHeader::new(
            PrimaryHeader::new(0xb8, seq).with_length_field(69),
            Some(SecondaryHeader::new(seconds, 0)),
        ),
        payload,
    )
}
