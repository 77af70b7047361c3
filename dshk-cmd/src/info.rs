use std::{
    cmp,
    io::{stdout, Write},
    path::Path,
};

use anyhow::{Context, Result};
use dshk::{walk_stream, Summary, WalkOptions};
use hifitime::Epoch;
use serde::Serialize;
use tracing::warn;

use crate::render::{registry, Format};

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    summary: Summary,
    first_packet_time: Option<String>,
    last_packet_time: Option<String>,
    consumed: usize,
    error: Option<String>,
}

fn summarize(fpath: &Path, dat: &[u8]) -> Info {
    let report = walk_stream(dat, &WalkOptions::default());
    if let Some(ref err) = report.error {
        warn!("stopped at byte offset {}: {err}", report.consumed);
    }

    let mut summary = Summary::default();
    let mut first: Option<Epoch> = None;
    let mut last: Option<Epoch> = None;
    for packet in &report.packets {
        summary.add(packet);
        if let Some(secondary) = packet.secondary() {
            let epoch = secondary.epoch();
            first = first.map_or(Some(epoch), |cur| Some(cmp::min(epoch, cur)));
            last = last.map_or(Some(epoch), |cur| Some(cmp::max(epoch, cur)));
        }
    }

    Info {
        filename: fpath.to_string_lossy().to_string(),
        summary,
        first_packet_time: first.map(|e| e.to_string()),
        last_packet_time: last.map(|e| e.to_string()),
        consumed: report.consumed,
        error: report.error.map(|e| e.to_string()),
    }
}

pub fn info(fpath: &Path, format: &Format) -> Result<()> {
    let dat = std::fs::read(fpath).with_context(|| format!("reading {fpath:?}"))?;
    let info = summarize(fpath, &dat);

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = registry()
                .render("info", &info)
                .context("rendering text")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dshk::{HousekeepingPayload, Packet, PrimaryHeader, SecondaryHeader, TelemetryHeader};

    fn stream() -> Vec<u8> {
        [(1, 10), (2, 5), (5, 20)]
            .iter()
            .flat_map(|(seq, seconds)| {
                Packet::new(
                    TelemetryHeader::new(
                        PrimaryHeader::new(0xb8, *seq),
                        Some(SecondaryHeader::new(*seconds, 0)),
                    ),
                    HousekeepingPayload::default(),
                )
                .encode()
            })
            .collect()
    }

    #[test]
    fn summarize_stream() {
        let info = summarize(Path::new("hk.dat"), &stream());

        assert_eq!(info.summary.count, 3);
        assert_eq!(info.summary.missing, 2);
        assert_eq!(info.consumed, 228);
        assert!(info.error.is_none());
        assert_eq!(
            info.first_packet_time,
            Some(SecondaryHeader::new(5, 0).epoch().to_string())
        );
        assert_eq!(
            info.last_packet_time,
            Some(SecondaryHeader::new(20, 0).epoch().to_string())
        );
    }

    #[test]
    fn summarize_truncated_stream() {
        let mut dat = stream();
        dat.truncate(100);
        let info = summarize(Path::new("hk.dat"), &dat);

        assert_eq!(info.summary.count, 1);
        assert_eq!(info.consumed, 88);
        assert!(info.error.is_some());

        let text = registry().render("info", &info).unwrap();
        assert!(text.contains("Count:    1"), "{text}");
        assert!(text.contains("(offset 88)"), "{text}");
    }
}
