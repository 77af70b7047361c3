#![doc = include_str!("../README.md")]

mod cursor;
mod error;

pub mod housekeeping;
pub mod spacepacket;
pub mod stream;

pub use cursor::Cursor;
pub use error::{Error, Result};
pub use housekeeping::{decode_packet, HousekeepingPayload, Packet};
pub use spacepacket::{
    CcsdsVersion, PacketType, PrimaryHeader, SecondaryHeader, Summary, TelemetryHeader,
};
pub use stream::{decode_stream, walk_stream, StreamReport, WalkOptions, Walker};
