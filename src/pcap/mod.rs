//! Capture file reading.

mod reader;

pub use reader::{PcapReader, RawPacket};
