//! Command-line argument definitions.

use clap::Parser;
use std::path::PathBuf;

/// Decode captured network packets into human-readable text.
#[derive(Parser, Debug)]
#[command(name = "pktdump")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture file to decode (pcap or pcapng, optionally gzipped)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Stop after decoding this many packets
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub count: Option<u64>,

    /// Suppress per-packet timestamps
    #[arg(short = 't', long = "no-timestamp")]
    pub no_timestamp: bool,

    /// List registered protocol printers
    #[arg(long = "list-printers")]
    pub list_printers: bool,

    /// Increase decode detail (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Info-only invocations need no capture file.
    pub fn is_info_only(&self) -> bool {
        self.list_printers
    }
}
