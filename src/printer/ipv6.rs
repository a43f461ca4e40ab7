//! IPv6 printer, including the extension-header chain walker.
//!
//! After the fixed 40-byte header, IPv6 carries a linked chain of extension
//! headers, each naming the type of the next. The walker below follows the
//! chain, accounting consumed bytes against the declared payload length,
//! until it reaches a type it does not recognize as an extension header; the
//! remaining bytes and the final next-header value are then handed to the
//! transport printers.
//!
//! Two rules from the protocol carry all the subtlety:
//!
//! - A Hop-by-Hop header is only legal as the first extension header. Seen
//!   anywhere else it is Invalid and ends the walk.
//! - A zero payload-length field is only legal when the Hop-by-Hop header
//!   carries a Jumbo Payload option, which then supplies the real length.
//!   The walker defers committing to a total length until the Hop-by-Hop
//!   options have been scanned.

use std::net::Ipv6Addr;

use smallvec::SmallVec;

use super::ipv4::PROTO_NAMES;
use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::cache::FlowHash;
use crate::emit::Emitter;
use crate::error::{DecodeResult, Truncated};

/// IPv6 fixed header length.
const HEADER_LEN: usize = 40;

/// Next-header values for the recognized extension headers.
pub mod next_header {
    pub const HOP_BY_HOP: u8 = 0;
    pub const ROUTING: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const DEST_OPTS: u8 = 60;
    pub const NO_NEXT: u8 = 59;
}

/// Option types inside Hop-by-Hop and Destination Options headers.
mod opt {
    pub const PAD1: u8 = 0;
    pub const PADN: u8 = 1;
    pub const JUMBO: u8 = 0xc2;
}

/// IPv6 printer.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Printer;

impl Printer for Ipv6Printer {
    fn name(&self) -> &'static str {
        "ip6"
    }

    fn display_name(&self) -> &'static str {
        "IPv6"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        match context.hint("ethertype") {
            Some(et) if et == u64::from(super::ethertype::IPV6) => Some(100),
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

        let first = cur.be32_at(0)?;
        let version = (first >> 28) as u8;

        out.str("IP6");
        if version != 6 {
            out.invalid();
            return Ok(Printed::last());
        }

        let flow_label = first & 0x000f_ffff;
        let plen = usize::from(cur.be16_at(4)?);
        let ip6_nxt = cur.u8_at(6)?;
        let hop_limit = cur.u8_at(7)?;
        let src = cur.span(8, 16)?;
        let dst = cur.span(24, 16)?;

        let mut addr = [0u8; 16];
        addr.copy_from_slice(src);
        let src_addr = Ipv6Addr::from(addr);
        addr.copy_from_slice(dst);
        let dst_addr = Ipv6Addr::from(addr);

        crate::emit!(out, " {src_addr} > {dst_addr}");
        if out.verbose() {
            crate::emit!(
                out,
                " (flowlabel {flow_label:#x}, hlim {hop_limit}, next-header {} ({ip6_nxt}), payload length: {plen})",
                PROTO_NAMES.get(u32::from(ip6_nxt)),
            );
        }

        let flow = FlowHash::from_addrs(src, dst);

        match walk_ext_headers(&cur, ip6_nxt, plen, out)? {
            ChainEnd::Handoff {
                next,
                offset,
                remaining_len,
            } => {
                let payload_end = (offset + remaining_len).min(data.len());
                let payload = &data[offset.min(payload_end)..payload_end];

                let mut hints = SmallVec::new();
                hints.push(("ip_protocol", u64::from(next)));
                hints.push(("ip_version", 6));

                Ok(Printed::next(payload, hints).with_flow(flow))
            }
            ChainEnd::Done => Ok(Printed::last().with_flow(flow)),
        }
    }
}

/// Outcome of the extension-header walk.
enum ChainEnd {
    /// Control passes to the transport demultiplexer.
    Handoff {
        next: u8,
        offset: usize,
        remaining_len: usize,
    },
    /// Nothing left to decode (no-next-header, trailing fragment, Invalid).
    Done,
}

/// Follow the extension-header chain starting right after the fixed header.
fn walk_ext_headers(
    cur: &PacketCursor<'_>,
    ip6_nxt: u8,
    plen: usize,
    out: &mut Emitter,
) -> DecodeResult<ChainEnd> {
    let mut next = ip6_nxt;
    let mut offset = HEADER_LEN;
    let mut first = true;
    // Committed once the Hop-by-Hop header (which must come first) has been
    // scanned for a Jumbo Payload option.
    let mut payload_len = plen;

    loop {
        let advance = match next {
            next_header::HOP_BY_HOP => {
                if !first {
                    // Protocol violation: Hop-by-Hop only directly after the
                    // fixed header.
                    out.str(" HBH");
                    out.invalid();
                    return Ok(ChainEnd::Done);
                }
                let nxt = cur.u8_at(offset)?;
                let hlen = (usize::from(cur.u8_at(offset + 1)?) + 1) * 8;
                if out.verbose() {
                    out.str(" HBH");
                }
                let jumbo = scan_options(cur, offset + 2, offset + hlen, out)?;
                match jumbo {
                    Some(len) if plen == 0 => {
                        payload_len = len as usize;
                        if out.verbose() {
                            crate::emit!(out, " jumbogram ({len})");
                        }
                    }
                    Some(_) => {
                        // Jumbo alongside a nonzero payload length: the two
                        // length claims contradict each other.
                        out.invalid();
                        return Ok(ChainEnd::Done);
                    }
                    None => {}
                }
                next = nxt;
                hlen
            }
            next_header::DEST_OPTS => {
                let nxt = cur.u8_at(offset)?;
                let hlen = (usize::from(cur.u8_at(offset + 1)?) + 1) * 8;
                if out.verbose() {
                    out.str(" DSTOPT");
                }
                scan_options(cur, offset + 2, offset + hlen, out)?;
                next = nxt;
                hlen
            }
            next_header::ROUTING => {
                let nxt = cur.u8_at(offset)?;
                let hlen = (usize::from(cur.u8_at(offset + 1)?) + 1) * 8;
                if !print_routing(cur, offset, hlen, out)? {
                    return Ok(ChainEnd::Done);
                }
                next = nxt;
                hlen
            }
            next_header::FRAGMENT => {
                let nxt = cur.u8_at(offset)?;
                let offlg = cur.be16_at(offset + 2)?;
                let ident = cur.be32_at(offset + 4)?;
                let frag_offset = usize::from(offlg >> 3) * 8;
                let more = offlg & 1 != 0;
                if frag_offset > 0 {
                    // Non-first fragment: the payload is mid-stream bytes.
                    crate::emit!(out, " frag ({frag_offset}|{ident})");
                    return Ok(ChainEnd::Done);
                }
                if out.verbose() {
                    crate::emit!(out, " frag (0|{ident}{})", if more { "+" } else { "" });
                }
                next = nxt;
                8
            }
            next_header::NO_NEXT => {
                if out.verbose() {
                    out.str(" no next header");
                }
                return Ok(ChainEnd::Done);
            }
            _ => {
                // Not an extension header: end of chain.
                let consumed = offset - HEADER_LEN;
                if payload_len == 0 {
                    // Only legal with a Jumbo Payload option, handled above.
                    out.invalid();
                    return Ok(ChainEnd::Done);
                }
                if consumed > payload_len {
                    // The declared payload length ran out inside the chain.
                    return Err(Truncated);
                }
                return Ok(ChainEnd::Handoff {
                    next,
                    offset,
                    remaining_len: payload_len - consumed,
                });
            }
        };

        first = false;
        offset += advance;

        // Jumbo aside, the chain may not consume more than the declared
        // payload; payload_len can legitimately still be 0 here while a
        // Hop-by-Hop header is being scanned for the Jumbo option.
        if payload_len != 0 && offset - HEADER_LEN > payload_len {
            return Err(Truncated);
        }
    }
}

/// Print a routing header by routing type. Type 0 (deprecated source route)
/// and type 4 (segment routing) both carry a list of 16-byte addresses after
/// an 8-byte fixed part; other types get the generic summary. Returns false
/// when the header was Invalid and the chain must stop.
fn print_routing(
    cur: &PacketCursor<'_>,
    offset: usize,
    hlen: usize,
    out: &mut Emitter,
) -> DecodeResult<bool> {
    let rtype = cur.u8_at(offset + 2)?;
    let segs = cur.u8_at(offset + 3)?;

    match rtype {
        0 | 4 => {
            if (hlen - 8) % 16 != 0 {
                // Address-list forms must fill whole 16-byte slots.
                out.str(" RT");
                out.invalid();
                return Ok(false);
            }
            if out.verbose() {
                if rtype == 4 {
                    let tag = cur.be16_at(offset + 6)?;
                    crate::emit!(out, " SRH (segs left {segs}, tag {tag})");
                } else {
                    crate::emit!(out, " RT (type 0, segs left {segs})");
                }
                if out.verbosity() >= 2 {
                    let mut addr = [0u8; 16];
                    for i in 0..(hlen - 8) / 16 {
                        addr.copy_from_slice(cur.span(offset + 8 + i * 16, 16)?);
                        crate::emit!(out, " [{}]", Ipv6Addr::from(addr));
                    }
                }
            }
        }
        _ => {
            if out.verbose() {
                crate::emit!(out, " RT (type {rtype}, segs left {segs})");
            }
        }
    }
    Ok(true)
}

/// Scan the option area of a Hop-by-Hop or Destination Options header,
/// returning the Jumbo Payload value if present. The one-byte Pad1 option is
/// the only option without a length byte.
fn scan_options(
    cur: &PacketCursor<'_>,
    start: usize,
    end: usize,
    out: &mut Emitter,
) -> DecodeResult<Option<u32>> {
    let mut offset = start;
    let mut jumbo = None;

    while offset < end {
        let typ = cur.u8_at(offset)?;
        if typ == opt::PAD1 {
            offset += 1;
            continue;
        }
        let len = usize::from(cur.u8_at(offset + 1)?);
        if offset + 2 + len > end {
            // Option overruns its own header's declared area.
            out.invalid();
            return Ok(jumbo);
        }
        match typ {
            opt::PADN => {}
            opt::JUMBO => {
                if len != 4 {
                    out.invalid();
                    return Ok(jumbo);
                }
                jumbo = Some(cur.be32_at(offset + 2)?);
            }
            _ => {
                if out.verbosity() >= 2 {
                    crate::emit!(out, " (opt {typ:#x})");
                }
            }
        }
        offset += 2 + len;
    }

    Ok(jumbo)
}
