//! UDP printer.

use smallvec::SmallVec;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;

/// IP protocol number for UDP.
pub const IP_PROTO_UDP: u8 = 17;

/// UDP header length.
const HEADER_LEN: usize = 8;

/// UDP printer.
#[derive(Debug, Clone, Copy)]
pub struct UdpPrinter;

impl Printer for UdpPrinter {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn display_name(&self) -> &'static str {
        "UDP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        match context.hint("ip_protocol") {
            Some(proto) if proto == u64::from(IP_PROTO_UDP) => Some(100),
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
        let length = usize::from(cur.be16_at(4)?);
        let checksum = cur.be16_at(6)?;

        crate::emit!(out, "UDP {src_port} > {dst_port}");

        // The length field counts the header itself.
        if length < HEADER_LEN {
            crate::emit!(out, ", length {length}");
            out.invalid();
            return Ok(Printed::last());
        }

        crate::emit!(out, ", length {}", length - HEADER_LEN);
        if out.verbosity() >= 2 {
            crate::emit!(out, ", cksum {checksum:#06x}");
        }

        let payload_end = length.min(data.len());
        let payload = &data[HEADER_LEN.min(payload_end)..payload_end];

        let mut hints = SmallVec::new();
        hints.push(("src_port", u64::from(src_port)));
        hints.push(("dst_port", u64::from(dst_port)));

        Ok(Printed::next(payload, hints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datagram(src: u16, dst: u16, length: u16) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&src.to_be_bytes());
        d.extend_from_slice(&dst.to_be_bytes());
        d.extend_from_slice(&length.to_be_bytes());
        d.extend_from_slice(&[0, 0]); // checksum
        d
    }

    #[test]
    fn test_ports_and_payload() {
        let mut data = datagram(4500, 500, 12);
        data.extend_from_slice(&[1, 2, 3, 4]);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = UdpPrinter.print(&data, &ctx, &mut out).unwrap();
        assert_eq!(out.as_str(), "UDP 4500 > 500, length 4");
        assert_eq!(printed.hint("dst_port"), Some(500));
        assert_eq!(printed.remaining, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_length_below_header_is_invalid() {
        let data = datagram(1, 2, 7);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = UdpPrinter.print(&data, &ctx, &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
        assert!(printed.stop);
    }

    #[test]
    fn test_truncated_header_unwinds() {
        let data = [0u8; 5];
        let ctx = PrintContext::new(1, 8);
        let mut out = Emitter::new(0);
        assert!(UdpPrinter.print(&data, &ctx, &mut out).is_err());
    }

    #[test]
    fn test_payload_clipped_to_capture() {
        // Declares 100 payload bytes, only 2 captured past the header.
        let mut data = datagram(1, 2, 108);
        data.extend_from_slice(&[9, 9]);
        let ctx = PrintContext::new(1, data.len());
        let mut out = Emitter::new(0);
        let printed = UdpPrinter.print(&data, &ctx, &mut out).unwrap();
        assert_eq!(printed.remaining.len(), 2);
    }
}
