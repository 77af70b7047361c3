use anyhow::{Context, Result};
use dshk::{HousekeepingPayload, Packet, PrimaryHeader, SecondaryHeader};
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

/// Serializable view of a packet with the values a reader wants rendered as text.
#[derive(Debug, Serialize)]
pub struct PacketView<'a> {
    index: usize,
    offset: usize,
    primary: &'a PrimaryHeader,
    secondary: Option<&'a SecondaryHeader>,
    time: Option<String>,
    payload: &'a HousekeepingPayload,
    filter_table_filename: String,
}

impl<'a> PacketView<'a> {
    pub fn new(index: usize, offset: usize, packet: &'a Packet) -> Self {
        PacketView {
            index,
            offset,
            primary: packet.primary(),
            secondary: packet.secondary(),
            time: packet.secondary().map(|s| s.epoch().to_string()),
            payload: packet.payload(),
            filter_table_filename: packet.payload().filter_table_filename_str().into_owned(),
        }
    }
}

/// Handlebars registry with the templates and helpers used for text output.
pub fn registry() -> Handlebars<'static> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(v.len()).max(v.len());
        format!("{v:>num$}")
    });
    let mut hb = Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(left_pad));
    assert!(hb.register_template_string("packet", PACKET_TEMPLATE).is_ok());
    assert!(hb.register_template_string("info", INFO_TEMPLATE).is_ok());
    hb
}

pub fn render_packet(hb: &Handlebars, view: &PacketView) -> Result<String> {
    hb.render("packet", view).context("rendering packet")
}

const PACKET_TEMPLATE: &str = r"Packet {{ index }} @ {{ offset }}
  Primary Header
    Application ID:        {{ primary.application_id }}
    Secondary Header:      {{ primary.has_secondary_header }}
    Packet Type:           {{ primary.packet_type }}
    CCSDS Version:         {{ primary.ccsds_version }}
    Sequence Count:        {{ primary.sequence_count }}
    Segmentation Flags:    {{ primary.segmentation_flags }}
    Length:                {{ primary.packet_length_field }}
{{ #if secondary }}  Secondary Header
    Seconds:               {{ secondary.seconds }}
    Subseconds:            {{ secondary.subseconds }}
    Time:                  {{ time }}
{{ else }}  No Secondary Header
{{ /if }}  Payload
    CmdAcceptedCounter:    {{ payload.cmd_accepted }}
    CmdRejectedCounter:    {{ payload.cmd_rejected }}
    DestTblLoadCounter:    {{ payload.dest_table_load }}
    DestTblErrCounter:     {{ payload.dest_table_err }}
    FilterTblLoadCounter:  {{ payload.filter_table_load }}
    FilterTblErrCounter:   {{ payload.filter_table_err }}
    AppEnableState:        {{ payload.app_enable_state }}
    FileWriteCounter:      {{ payload.file_write }}
    FileWriteErrCounter:   {{ payload.file_write_err }}
    FileUpdateCounter:     {{ payload.file_update }}
    FileUpdateErrCounter:  {{ payload.file_update_err }}
    DisabledPktCounter:    {{ payload.disabled_pkt }}
    IgnoredPktCounter:     {{ payload.ignored_pkt }}
    FilteredPktCounter:    {{ payload.filtered_pkt }}
    PassedPktCounter:      {{ payload.passed_pkt }}
    FilterTblFilename:     {{ filter_table_filename }}
";

const INFO_TEMPLATE: &str = r"{{ filename }}
===============================================================
First:    {{ first_packet_time }}
Last:     {{ last_packet_time }}
APIDS:    {{ #each summary.apids }}{{ @key }}{{ #if @last }}{{ else }}, {{ /if }}{{ /each }}
Count:    {{ summary.count }}
Bytes:    {{ summary.bytes }}
Missing:  {{ summary.missing }}
{{ #if error }}Error:    {{ error }} (offset {{ consumed }})
{{ /if }}---------------------------------------------------------------
  APID     Count       Bytes   Missing
---------------------------------------------------------------
{{ #each summary.apids }}{{ lpad 6 @key }}  {{ lpad 8 count }}  {{ lpad 10 bytes }}  {{ lpad 8 missing }}
{{/each }}
";

#[cfg(test)]
mod tests {
    use super::*;
    use dshk::TelemetryHeader;

    #[test]
    fn render_packet_text() {
        let mut payload = HousekeepingPayload {
            file_write: 258,
            ..Default::default()
        };
        payload.filter_table_filename[..7].copy_from_slice(b"/cf/tbl");
        let packet = Packet::new(
            TelemetryHeader::new(
                PrimaryHeader::new(0xb8, 7),
                Some(SecondaryHeader::new(0, 0)),
            ),
            payload,
        );

        let hb = registry();
        let text = render_packet(&hb, &PacketView::new(0, 0, &packet)).unwrap();

        assert!(text.contains("Application ID:        184"), "{text}");
        assert!(text.contains("Sequence Count:        7"), "{text}");
        assert!(text.contains("Packet Type:           Telemetry"), "{text}");
        assert!(text.contains("FileWriteCounter:      258"), "{text}");
        assert!(text.contains("FilterTblFilename:     /cf/tbl\n"), "{text}");
        assert!(text.contains("Time:                  2000-01-01T11:58:55"), "{text}");
    }

    #[test]
    fn render_packet_without_secondary() {
        let packet = Packet::new(
            TelemetryHeader::new(PrimaryHeader::new(1, 1), None),
            HousekeepingPayload::default(),
        );

        let text = render_packet(&registry(), &PacketView::new(3, 210, &packet)).unwrap();

        assert!(text.starts_with("Packet 3 @ 210\n"), "{text}");
        assert!(text.contains("No Secondary Header"), "{text}");
        assert!(!text.contains("Seconds:"), "{text}");
    }
}
