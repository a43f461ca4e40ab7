//! Fuzz target for the generic TLV walker.
//!
//! The first input byte selects the header shape; the rest is the record
//! area. The walk must terminate (forward progress on every iteration) and
//! never read outside the buffer, for any shape/byte combination.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pktdump::buf::PacketCursor;
use pktdump::emit::Emitter;
use pktdump::tlv::{self, Step, TlvShape};

fuzz_target!(|data: &[u8]| {
    let Some((&sel, records)) = data.split_first() else {
        return;
    };

    let shape = TlvShape {
        type_width: if sel & 1 == 0 { 1 } else { 2 },
        len_width: if sel & 2 == 0 { 1 } else { 2 },
        length_first: sel & 4 != 0,
        length_includes_header: sel & 8 != 0,
        align: if sel & 16 == 0 { 1 } else { 4 },
    };

    let cur = PacketCursor::new(records);
    let mut out = Emitter::new(0);
    let _ = tlv::walk(&cur, 0, records.len(), &shape, 0, &mut out, |_, _| {
        Ok(Step::Continue)
    });
});
