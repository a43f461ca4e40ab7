//! Fuzz target for the ISAKMP printer.
//!
//! ISAKMP has the deepest structure of the supported protocols: a
//! next-payload chain, SA > Proposal > Transform recursion, and dual-form
//! transform attributes, plus the cross-packet cookie cache. The input is
//! framed as Ethernet/IPv4/UDP port 500 so the fuzz bytes land directly in
//! the ISAKMP printer.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdump::emit::Emitter;
use pktdump::printer::{default_registry, print_packet};

fuzz_target!(|data: &[u8]| {
    let udp_len = (8 + data.len()).min(u16::MAX as usize) as u16;
    let total_len = (20 + usize::from(udp_len)).min(u16::MAX as usize) as u16;

    let mut frame = Vec::with_capacity(42 + data.len());
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x02]);
    frame.extend_from_slice(&[0x08, 0x00]);

    frame.extend_from_slice(&[0x45, 0x00]);
    frame.extend_from_slice(&total_len.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00]);
    frame.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);

    frame.extend_from_slice(&500u16.to_be_bytes());
    frame.extend_from_slice(&500u16.to_be_bytes());
    frame.extend_from_slice(&udp_len.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(data);

    // The registry persists across the two calls, so the second one also
    // exercises cookie-cache hits recorded by the first.
    let registry = default_registry();
    for verbosity in [0, 2] {
        let mut out = Emitter::new(verbosity);
        print_packet(&registry, 1, &frame, frame.len(), &mut out);
        let _ = out.finish();
    }
});
