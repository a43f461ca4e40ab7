//! TCP printer.

use smallvec::SmallVec;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::token::Tokens;

/// IP protocol number for TCP.
pub const IP_PROTO_TCP: u8 = 6;

/// TCP flag bits as laid out on the wire.
pub mod flags {
    pub const FIN: u32 = 0x01;
    pub const SYN: u32 = 0x02;
    pub const RST: u32 = 0x04;
    pub const PSH: u32 = 0x08;
    pub const ACK: u32 = 0x10;
    pub const URG: u32 = 0x20;
    pub const ECE: u32 = 0x40;
    pub const CWR: u32 = 0x80;
}

const FLAG_NAMES: Tokens = Tokens(&[
    (flags::FIN, "F"),
    (flags::SYN, "S"),
    (flags::RST, "R"),
    (flags::PSH, "P"),
    (flags::ACK, "."),
    (flags::URG, "U"),
    (flags::ECE, "E"),
    (flags::CWR, "W"),
]);

/// TCP option kinds.
mod opt {
    pub const EOL: u8 = 0;
    pub const NOP: u8 = 1;
    pub const MSS: u8 = 2;
    pub const WSCALE: u8 = 3;
    pub const SACK_OK: u8 = 4;
    pub const TIMESTAMP: u8 = 8;
}

const OPTION_NAMES: Tokens = Tokens(&[
    (opt::EOL as u32, "eol"),
    (opt::NOP as u32, "nop"),
    (opt::MSS as u32, "mss"),
    (opt::WSCALE as u32, "wscale"),
    (opt::SACK_OK as u32, "sackOK"),
    (opt::TIMESTAMP as u32, "TS"),
]);

/// TCP printer.
#[derive(Debug, Clone, Copy)]
pub struct TcpPrinter;

impl Printer for TcpPrinter {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn display_name(&self) -> &'static str {
        "TCP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        match context.hint("ip_protocol") {
            Some(proto) if proto == u64::from(IP_PROTO_TCP) => Some(100),
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
        let seq = cur.be32_at(4)?;
        let ack = cur.be32_at(8)?;
        let doff_flags = cur.be16_at(12)?;
        let header_len = usize::from(doff_flags >> 12) * 4;
        let flag_bits = u32::from(doff_flags & 0x00ff);
        let window = cur.be16_at(14)?;

        crate::emit!(
            out,
            "TCP {src_port} > {dst_port}, flags [{}]",
            FLAG_NAMES.flags(flag_bits)
        );

        if header_len < 20 {
            out.invalid();
            return Ok(Printed::last());
        }

        if out.verbose() {
            crate::emit!(out, ", seq {seq}");
            if flag_bits & flags::ACK != 0 {
                crate::emit!(out, ", ack {ack}");
            }
            crate::emit!(out, ", win {window}");
        }

        if header_len > 20 {
            // The whole option area must be captured before it is walked.
            cur.span(20, header_len - 20)?;
            if out.verbose() {
                out.str(", options [");
                print_options(&cur, 20, header_len, out)?;
                out.str("]");
            }
        }

        let payload = &data[header_len.min(data.len())..];
        crate::emit!(out, ", length {}", payload.len());

        let mut hints = SmallVec::new();
        hints.push(("src_port", u64::from(src_port)));
        hints.push(("dst_port", u64::from(dst_port)));

        Ok(Printed::next(payload, hints))
    }
}

/// Walk the TCP option bytes in `[start, end)`.
///
/// EOL and NOP are single bytes with no length; every other option carries a
/// length that counts its own two header bytes, so a declared length below 2
/// cannot make progress and is Invalid.
fn print_options(
    cur: &PacketCursor<'_>,
    start: usize,
    end: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    let mut offset = start;
    let mut first = true;

    while offset < end {
        let kind = cur.u8_at(offset)?;

        if !first {
            out.str(",");
        }
        first = false;

        match kind {
            opt::EOL => {
                out.str("eol");
                return Ok(());
            }
            opt::NOP => {
                out.str("nop");
                offset += 1;
                continue;
            }
            _ => {}
        }

        let len = usize::from(cur.u8_at(offset + 1)?);
        if len < 2 || offset + len > end {
            out.invalid();
            return Ok(());
        }

        match (kind, len) {
            (opt::MSS, 4) => crate::emit!(out, "mss {}", cur.be16_at(offset + 2)?),
            (opt::WSCALE, 3) => crate::emit!(out, "wscale {}", cur.u8_at(offset + 2)?),
            (opt::SACK_OK, 2) => out.str("sackOK"),
            (opt::TIMESTAMP, 10) => crate::emit!(
                out,
                "TS val {} ecr {}",
                cur.be32_at(offset + 2)?,
                cur.be32_at(offset + 6)?
            ),
            _ => crate::emit!(out, "{}", OPTION_NAMES.get_or("opt-", u32::from(kind))),
        }

        offset += len;
    }

    Ok(())
}
