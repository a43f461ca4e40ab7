//! Fuzz target for the IPv6 extension-header chain walker.
//!
//! The walker follows a linked chain of headers with attacker-controlled
//! lengths and a Jumbo Payload override of the fixed header's payload length.
//! The input bytes are placed right after a fixed IPv6 header so the fuzzer
//! controls the whole chain.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdump::emit::Emitter;
use pktdump::printer::{default_registry, print_packet};

fuzz_target!(|data: &[u8]| {
    let Some((&first_nxt, rest)) = data.split_first() else {
        return;
    };

    let mut frame = Vec::with_capacity(54 + rest.len());
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x02]);
    frame.extend_from_slice(&[0x86, 0xDD]);

    frame.extend_from_slice(&[0x60, 0x00, 0x00, 0x00]);
    frame.extend_from_slice(&(rest.len().min(u16::MAX as usize) as u16).to_be_bytes());
    frame.push(first_nxt);
    frame.push(0x40);
    frame.extend_from_slice(&[0u8; 32]); // src, dst
    frame.extend_from_slice(rest);

    let registry = default_registry();
    for verbosity in [0, 2] {
        let mut out = Emitter::new(verbosity);
        print_packet(&registry, 1, &frame, frame.len(), &mut out);
        let _ = out.finish();
    }
});
