//! IPv4 printer.

use std::net::Ipv4Addr;

use smallvec::SmallVec;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::cache::FlowHash;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::token::Tokens;

/// IP protocol numbers shared by the v4 and v6 printers.
pub const PROTO_NAMES: Tokens = Tokens(&[
    (1, "ICMP"),
    (6, "TCP"),
    (17, "UDP"),
    (33, "DCCP"),
    (41, "IPv6"),
    (46, "RSVP"),
    (47, "GRE"),
    (50, "ESP"),
    (51, "AH"),
    (58, "ICMPv6"),
    (89, "OSPF"),
    (132, "SCTP"),
]);

const FRAG_FLAGS: Tokens = Tokens(&[(0x4000, "DF"), (0x2000, "MF")]);

/// IPv4 printer.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Printer;

impl Printer for Ipv4Printer {
    fn name(&self) -> &'static str {
        "ip"
    }

    fn display_name(&self) -> &'static str {
        "IPv4"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        // Raw-IP captures (linktype 101) start directly at the IP header.
        if context.is_root() && context.link_type == 101 {
            return Some(50);
        }
        match context.hint("ethertype") {
            Some(et) if et == u64::from(super::ethertype::IPV4) => Some(100),
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

        let ver_ihl = cur.u8_at(0)?;
        let version = ver_ihl >> 4;
        let ihl = usize::from(ver_ihl & 0x0f) * 4;

        out.str("IP");
        if version != 4 || ihl < 20 {
            out.invalid();
            return Ok(Printed::last());
        }

        let tos = cur.u8_at(1)?;
        let total_len = usize::from(cur.be16_at(2)?);
        let id = cur.be16_at(4)?;
        let frag = cur.be16_at(6)?;
        let ttl = cur.u8_at(8)?;
        let proto = cur.u8_at(9)?;
        let src = cur.span(12, 4)?;
        let dst = cur.span(16, 4)?;

        // The whole header, options included, must be captured before any
        // field is trusted.
        cur.span(0, ihl)?;

        let src_addr = Ipv4Addr::new(src[0], src[1], src[2], src[3]);
        let dst_addr = Ipv4Addr::new(dst[0], dst[1], dst[2], dst[3]);

        crate::emit!(out, " {src_addr} > {dst_addr}");

        if out.verbose() {
            crate::emit!(
                out,
                " (tos {:#x}, ttl {}, id {}, flags [{}], proto {} ({}), length {})",
                tos,
                ttl,
                id,
                FRAG_FLAGS.flags(u32::from(frag) & 0x6000),
                PROTO_NAMES.get(u32::from(proto)),
                proto,
                total_len
            );
        }

        // A total length smaller than the header contradicts the header.
        if total_len < ihl {
            out.invalid();
            return Ok(Printed::last());
        }

        let frag_offset = usize::from(frag & 0x1fff) * 8;
        if frag_offset > 0 {
            // Non-first fragment: the payload does not start with a header
            // any child printer understands.
            crate::emit!(out, " frag {id}:{}@{frag_offset}", total_len - ihl);
            return Ok(Printed::last());
        }

        // Clip the payload to the declared total length, but never past the
        // capture; the declared length is untrusted.
        let payload_end = total_len.min(data.len());
        let payload = &data[ihl.min(payload_end)..payload_end];

        let mut hints = SmallVec::new();
        hints.push(("ip_protocol", u64::from(proto)));
        hints.push(("ip_version", 4));

        Ok(Printed::next(payload, hints).with_flow(FlowHash::from_addrs(src, dst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(proto: u8, total_len: u16) -> Vec<u8> {
        let mut h = vec![
            0x45, 0x00, // version 4, ihl 5, tos
            0x00, 0x00, // total length (patched below)
            0x00, 0x2a, // id 42
            0x40, 0x00, // DF, offset 0
            0x40, proto, // ttl 64, protocol
            0x00, 0x00, // checksum
            192, 0, 2, 1, // src
            192, 0, 2, 2, // dst
        ];
        h[2..4].copy_from_slice(&total_len.to_be_bytes());
        h
    }

    #[test]
    fn test_basic_print_and_hints() {
        let mut data = header(17, 28);
        data.extend_from_slice(&[0u8; 8]);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = Ipv4Printer.print(&data, &ctx, &mut out).unwrap();

        assert_eq!(out.as_str(), "IP 192.0.2.1 > 192.0.2.2");
        assert_eq!(printed.hint("ip_protocol"), Some(17));
        assert_eq!(printed.remaining.len(), 8);
        assert!(printed.flow.is_some());
    }

    #[test]
    fn test_verbose_detail() {
        let data = header(6, 20);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(1);
        Ipv4Printer.print(&data, &ctx, &mut out).unwrap();
        assert!(out.as_str().contains("proto TCP (6)"));
        assert!(out.as_str().contains("flags [DF]"));
    }

    #[test]
    fn test_bad_version_is_invalid() {
        let mut data = header(17, 20);
        data[0] = 0x65; // version 6 in an IPv4 context
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = Ipv4Printer.print(&data, &ctx, &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
        assert!(printed.stop);
    }

    #[test]
    fn test_total_length_below_header_is_invalid() {
        let data = header(17, 12);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = Ipv4Printer.print(&data, &ctx, &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
        assert!(printed.stop);
    }

    #[test]
    fn test_truncated_header_unwinds() {
        let data = &header(17, 20)[..10];
        let ctx = PrintContext::new(1, 20);
        let mut out = Emitter::new(0);
        assert!(Ipv4Printer.print(data, &ctx, &mut out).is_err());
    }

    #[test]
    fn test_fragment_stops_chain() {
        let mut data = header(17, 28);
        data[6] = 0x00;
        data[7] = 0x02; // offset 16 bytes
        data.extend_from_slice(&[0u8; 8]);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = Ipv4Printer.print(&data, &ctx, &mut out).unwrap();
        assert!(printed.stop);
        assert!(out.as_str().contains("frag 42:8@16"));
    }

    #[test]
    fn test_payload_clipped_to_declared_length() {
        // 20-byte header + declared 4 payload bytes, but 12 captured.
        let mut data = header(17, 24);
        data.extend_from_slice(&[0u8; 12]);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = Ipv4Printer.print(&data, &ctx, &mut out).unwrap();
        assert_eq!(printed.remaining.len(), 4);
    }
}
