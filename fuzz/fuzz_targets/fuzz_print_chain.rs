//! Fuzz target for the whole printer chain.
//!
//! The first input byte picks the link type (Ethernet or raw IP), the rest is
//! the captured packet. The chain must never panic, loop, or read out of
//! bounds, whatever the bytes say.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdump::emit::Emitter;
use pktdump::printer::{default_registry, print_packet};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, packet)) = data.split_first() else {
        return;
    };
    let link_type = if selector & 1 == 0 { 1 } else { 101 };

    let registry = default_registry();

    // Both the quiet and the verbose path: the option walks only run when
    // verbose.
    for verbosity in [0, 2] {
        let mut out = Emitter::new(verbosity);
        print_packet(&registry, link_type, packet, packet.len() * 2, &mut out);
        let _ = out.finish();
    }
});
