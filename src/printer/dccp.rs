//! DCCP printer.
//!
//! DCCP is the one supported protocol with native 24- and 48-bit sequence
//! numbers: the generic header carries a 48-bit sequence number when the
//! extended-sequence bit is set and a 24-bit one otherwise.

use smallvec::SmallVec;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::token::Tokens;

/// IP protocol number for DCCP.
pub const IP_PROTO_DCCP: u8 = 33;

/// Packet type values from the generic header.
const TYPE_NAMES: Tokens = Tokens(&[
    (0, "request"),
    (1, "response"),
    (2, "data"),
    (3, "ack"),
    (4, "dataack"),
    (5, "closereq"),
    (6, "close"),
    (7, "reset"),
    (8, "sync"),
    (9, "syncack"),
]);

const OPTION_NAMES: Tokens = Tokens(&[
    (32, "change_l"),
    (33, "confirm_l"),
    (34, "change_r"),
    (35, "confirm_r"),
    (36, "init_cookie"),
    (37, "ndp_count"),
    (38, "ack_vector0"),
    (39, "ack_vector1"),
    (40, "data_dropped"),
    (41, "timestamp"),
    (42, "timestamp_echo"),
    (43, "elapsed_time"),
    (44, "data_checksum"),
]);

/// DCCP printer.
#[derive(Debug, Clone, Copy)]
pub struct DccpPrinter;

impl Printer for DccpPrinter {
    fn name(&self) -> &'static str {
        "dccp"
    }

    fn display_name(&self) -> &'static str {
        "DCCP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        match context.hint("ip_protocol") {
            Some(proto) if proto == u64::from(IP_PROTO_DCCP) => Some(100),
            _ => None,
        }
    }

    fn print<'a>(
        &self,
        data: &'a [u8],
        _context: &PrintContext,
        out: &mut Emitter,
    ) -> DecodeResult<Printed<'a>> {
        let cur = PacketCursor::new(data);

        let src_port = cur.be16_at(0)?;
        let dst_port = cur.be16_at(2)?;
        let doff = usize::from(cur.u8_at(4)?) * 4;
        let type_x = cur.u8_at(8)?;
        let pkt_type = (type_x >> 1) & 0x0f;
        let extended_seq = type_x & 1 != 0;

        crate::emit!(
            out,
            "DCCP {} {src_port} > {dst_port}",
            TYPE_NAMES.get(u32::from(pkt_type))
        );

        // 48-bit sequence numbers in the 16-byte header, 24-bit in the short
        // 12-byte form.
        let (seq, fixed_len) = if extended_seq {
            (cur.be48_at(10)?, 16)
        } else {
            (u64::from(cur.be24_at(9)?), 12)
        };

        if out.verbose() {
            crate::emit!(out, ", seq {seq}");
        }

        if doff < fixed_len {
            out.invalid();
            return Ok(Printed::last());
        }

        if doff > fixed_len {
            cur.span(fixed_len, doff - fixed_len)?;
            if out.verbose() {
                out.str(", options [");
                print_options(&cur, fixed_len, doff, out)?;
                out.str("]");
            }
        }

        let payload = &data[doff.min(data.len())..];
        crate::emit!(out, ", length {}", payload.len());

        let mut hints = SmallVec::new();
        hints.push(("src_port", u64::from(src_port)));
        hints.push(("dst_port", u64::from(dst_port)));

        Ok(Printed::next(payload, hints))
    }
}

/// Walk the option area. Types below 32 are single-byte options; the rest
/// carry a length that counts the two header bytes.
fn print_options(
    cur: &PacketCursor<'_>,
    start: usize,
    end: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    let mut offset = start;
    let mut first = true;

    while offset < end {
        let typ = cur.u8_at(offset)?;

        if !first {
            out.str(",");
        }
        first = false;

        if typ < 32 {
            match typ {
                0 => out.str("padding"),
                1 => out.str("mandatory"),
                2 => out.str("slow_receiver"),
                _ => crate::emit!(out, "opt-{typ}"),
            }
            offset += 1;
            continue;
        }

        let len = usize::from(cur.u8_at(offset + 1)?);
        if len < 2 || offset + len > end {
            out.invalid();
            return Ok(());
        }

        crate::emit!(out, "{}", OPTION_NAMES.get_or("opt-", u32::from(typ)));
        if typ == 41 && len == 6 {
            crate::emit!(out, " {}", cur.be32_at(offset + 2)?);
        }

        offset += len;
    }

    Ok(())
}
