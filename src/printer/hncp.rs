//! HNCP printer.
//!
//! HNCP messages are a bare sequence of 32-bit-aligned TLVs: a 2-byte type,
//! a 2-byte length that counts only the value, then the value and padding.
//! Node State TLVs and External Connection TLVs carry nested TLV sequences
//! in the same encoding, walked recursively.

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::tlv::{self, Step, TlvRecord, TlvShape};
use crate::token::Tokens;

/// UDP port for HNCP.
pub const PORT_HNCP: u16 = 8231;

/// TLV header: 2-byte type, 2-byte value length, values padded to 4 bytes.
const TLV_SHAPE: TlvShape = TlvShape {
    type_width: 2,
    len_width: 2,
    length_first: false,
    length_includes_header: false,
    align: 4,
};

/// TLV types with structure the printer knows about.
mod tlv_type {
    pub const REQUEST_NODE_STATE: u32 = 2;
    pub const NODE_ENDPOINT: u32 = 3;
    pub const NETWORK_STATE: u32 = 4;
    pub const NODE_STATE: u32 = 5;
    pub const EXTERNAL_CONNECTION: u32 = 33;
}

const TLV_NAMES: Tokens = Tokens(&[
    (1, "request-network-state"),
    (2, "request-node-state"),
    (3, "node-endpoint"),
    (4, "network-state"),
    (5, "node-state"),
    (8, "peer"),
    (9, "keep-alive-interval"),
    (10, "trust-verdict"),
    (32, "hncp-version"),
    (33, "external-connection"),
    (34, "delegated-prefix"),
    (35, "assigned-prefix"),
    (36, "node-address"),
    (37, "dns-delegated-zone"),
    (38, "domain-name"),
    (39, "node-name"),
    (40, "managed-psk"),
    (41, "prefix-policy"),
]);

/// Node State fixed part: node id (4), sequence (4), age (4), hash (8).
const NODE_STATE_FIXED: usize = 20;

/// HNCP printer.
#[derive(Debug, Clone, Copy)]
pub struct HncpPrinter;

impl Printer for HncpPrinter {
    fn name(&self) -> &'static str {
        "hncp"
    }

    fn display_name(&self) -> &'static str {
        "HNCP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        let port = u64::from(PORT_HNCP);
        if context.hint("src_port") == Some(port) || context.hint("dst_port") == Some(port) {
            Some(100)
        } else {
            None
        }
    }

    fn print<'a>(
        &self,
        data: &'a [u8],
        _context: &PrintContext,
        out: &mut Emitter,
    ) -> DecodeResult<Printed<'a>> {
        let cur = PacketCursor::new(data);

        crate::emit!(out, "HNCP, length {}", data.len());

        tlv::walk(&cur, 0, data.len(), &TLV_SHAPE, 0, out, |out, rec| {
            print_tlv(&cur, rec, 0, out)
        })?;

        Ok(Printed::last())
    }
}

fn print_tlv(
    cur: &PacketCursor<'_>,
    rec: &TlvRecord,
    depth: usize,
    out: &mut Emitter,
) -> DecodeResult<Step> {
    out.indent(depth);
    crate::emit!(out, "{} length {}", TLV_NAMES.get(rec.typ), rec.value_len);

    match rec.typ {
        tlv_type::REQUEST_NODE_STATE | tlv_type::NODE_ENDPOINT => {
            if rec.value_len < 4 {
                out.invalid();
                return Ok(Step::Stop);
            }
            crate::emit!(out, ", node {:08x}", cur.be32_at(rec.value_off)?);
        }
        tlv_type::NETWORK_STATE => {
            if rec.value_len < 8 {
                out.invalid();
                return Ok(Step::Stop);
            }
            crate::emit!(out, ", hash {:016x}", cur.be64_at(rec.value_off)?);
        }
        tlv_type::NODE_STATE => {
            if rec.value_len < NODE_STATE_FIXED {
                out.invalid();
                return Ok(Step::Stop);
            }
            crate::emit!(
                out,
                ", node {:08x} seq {} age {}ms",
                cur.be32_at(rec.value_off)?,
                cur.be32_at(rec.value_off + 4)?,
                cur.be32_at(rec.value_off + 8)?
            );
            // The rest of the value is the node's own TLV set.
            tlv::walk(
                cur,
                rec.value_off + NODE_STATE_FIXED,
                rec.value_len - NODE_STATE_FIXED,
                &TLV_SHAPE,
                depth + 1,
                out,
                |out, sub| print_tlv(cur, sub, depth + 1, out),
            )?;
        }
        tlv_type::EXTERNAL_CONNECTION => {
            tlv::walk(
                cur,
                rec.value_off,
                rec.value_len,
                &TLV_SHAPE,
                depth + 1,
                out,
                |out, sub| print_tlv(cur, sub, depth + 1, out),
            )?;
        }
        _ => {}
    }

    Ok(Step::Continue)
}
