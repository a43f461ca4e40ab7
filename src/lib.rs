//! pktdump - decode captured network packets into human-readable text.
//!
//! The library reads pcap/pcapng files and renders each packet as a one-line
//! summary (more with verbosity), chaining per-protocol printers from the
//! link layer up. Every read of packet bytes is bounds-checked against the
//! captured length; a packet cut short by the capture prints a `[|proto]`
//! marker, and a packet whose own fields contradict its structure prints
//! ` (invalid)`. A malformed packet never panics and never affects the
//! packets around it.
//!
//! # Example
//!
//! ```no_run
//! use pktdump::emit::Emitter;
//! use pktdump::pcap::PcapReader;
//! use pktdump::printer::{default_registry, print_packet};
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = default_registry();
//!     let mut reader = PcapReader::open("capture.pcap")?;
//!     while let Some(packet) = reader.next_packet()? {
//!         let mut out = Emitter::new(0);
//!         print_packet(
//!             &registry,
//!             packet.link_type,
//!             &packet.data,
//!             packet.original_length as usize,
//!             &mut out,
//!         );
//!         println!("{}", out.finish());
//!     }
//!     Ok(())
//! }
//! ```

pub mod buf;
pub mod cache;
pub mod cli;
pub mod emit;
pub mod error;
pub mod pcap;
pub mod printer;
pub mod tlv;
pub mod token;

pub use error::{Error, Result};
