use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use dshk::{walk_stream, WalkOptions};
use tracing::{debug, info};

use crate::render::{registry, render_packet, Format, PacketView};

pub fn decode(input: &Path, format: &Format, validate_length: bool) -> Result<()> {
    let dat = std::fs::read(input).with_context(|| format!("reading {input:?}"))?;
    debug!("read {} bytes from {input:?}", dat.len());

    let report = walk_stream(&dat, &WalkOptions { validate_length });

    let mut offset = 0;
    let views: Vec<PacketView> = report
        .packets
        .iter()
        .enumerate()
        .map(|(idx, packet)| {
            let view = PacketView::new(idx, offset, packet);
            offset += packet.encoded_len();
            view
        })
        .collect();

    let mut out = stdout().lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &views).context("serializing to json")?;
            writeln!(out).context("writing to stdout")?;
        }
        Format::Text => {
            let hb = registry();
            for view in &views {
                let text = render_packet(&hb, view)?;
                writeln!(out, "{text}").context("writing to stdout")?;
            }
        }
    }

    info!("decoded {} packets", report.packets.len());
    match report.error {
        Some(err) => Err(err).with_context(|| {
            format!(
                "decoding {input:?} failed at byte offset {}",
                report.consumed
            )
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dshk::{HousekeepingPayload, Packet, PrimaryHeader, TelemetryHeader};

    fn write_input(dir: &Path, dat: &[u8]) -> std::path::PathBuf {
        let path = dir.join("hk.dat");
        std::fs::write(&path, dat).unwrap();
        path
    }

    fn packet() -> Packet {
        Packet::new(
            TelemetryHeader::new(PrimaryHeader::new(0xb8, 1).with_length_field(63), None),
            HousekeepingPayload::default(),
        )
    }

    #[test]
    fn decode_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = write_input(tmpdir.path(), &packet().encode());

        decode(&path, &Format::Json, true).unwrap();
    }

    #[test]
    fn decode_truncated_file_reports_offset() {
        let tmpdir = tempfile::tempdir().unwrap();
        let mut dat = packet().encode();
        dat.extend_from_slice(&[0x00, 0xb8, 0xc0]);
        let path = write_input(tmpdir.path(), &dat);

        let err = decode(&path, &Format::Text, false).unwrap_err();
        assert!(format!("{err}").contains("byte offset 70"), "{err}");
    }

    #[test]
    fn decode_missing_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        assert!(decode(&tmpdir.path().join("nope.dat"), &Format::Text, false).is_err());
    }
}
