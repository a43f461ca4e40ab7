//! ISAKMP (IKEv1) printer.
//!
//! ISAKMP messages are a chain of payloads, each carrying the type of the
//! *next* payload in its generic header. Security Association payloads nest:
//! SA contains Proposals, Proposals contain Transforms, Transforms contain
//! attributes in a dual short/long encoding. The recursion is depth-capped
//! on top of the length accounting.
//!
//! The printer keeps the decoder's only cross-packet state: a small
//! round-robin cache of initiator cookies, used to annotate packets with an
//! `I`/`R` direction mark. The cache sits behind a mutex so the printer
//! stays shareable across threads; a missed or evicted entry only loses the
//! annotation.

use std::sync::Mutex;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::cache::{CookieCache, Direction};
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::tlv::MAX_NESTING;
use crate::token::Tokens;

/// UDP port for ISAKMP.
pub const PORT_ISAKMP: u16 = 500;

/// ISAKMP fixed header length.
const HEADER_LEN: usize = 28;

/// Generic payload header length.
const GENERIC_LEN: usize = 4;

/// Payload type values.
mod payload {
    pub const NONE: u8 = 0;
    pub const SA: u8 = 1;
    pub const PROPOSAL: u8 = 2;
    pub const TRANSFORM: u8 = 3;
}

const PAYLOAD_NAMES: Tokens = Tokens(&[
    (1, "sa"),
    (2, "proposal"),
    (3, "transform"),
    (4, "ke"),
    (5, "id"),
    (6, "cert"),
    (7, "cr"),
    (8, "hash"),
    (9, "sig"),
    (10, "nonce"),
    (11, "notification"),
    (12, "delete"),
    (13, "vid"),
]);

const EXCHANGE_NAMES: Tokens = Tokens(&[
    (0, "none"),
    (1, "base"),
    (2, "ident"),
    (3, "auth"),
    (4, "agg"),
    (5, "inf"),
]);

const FLAG_NAMES: Tokens = Tokens(&[(0x01, "encrypt"), (0x02, "commit"), (0x04, "auth")]);

/// ISAKMP printer.
#[derive(Debug)]
pub struct IsakmpPrinter {
    cookies: Mutex<CookieCache>,
}

impl IsakmpPrinter {
    pub fn new() -> Self {
        Self {
            cookies: Mutex::new(CookieCache::new()),
        }
    }
}

impl Default for IsakmpPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for IsakmpPrinter {
    fn name(&self) -> &'static str {
        "isakmp"
    }

    fn display_name(&self) -> &'static str {
        "ISAKMP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        let port = u64::from(PORT_ISAKMP);
        if context.hint("src_port") == Some(port) || context.hint("dst_port") == Some(port) {
            Some(100)
        } else {
            None
        }
    }

    fn print<'a>(
        &self,
        data: &'a [u8],
        context: &PrintContext,
        out: &mut Emitter,
    ) -> DecodeResult<Printed<'a>> {
        let cur = PacketCursor::new(data);

        let i_cookie = cur.be64_at(0)?;
        let r_cookie = cur.be64_at(8)?;
        let first_payload = cur.u8_at(16)?;
        let version = cur.u8_at(17)?;
        let exch_type = cur.u8_at(18)?;
        let flags = cur.u8_at(19)?;
        let msg_id = cur.be32_at(20)?;
        let length = cur.be32_at(24)? as usize;

        crate::emit!(out, "isakmp {}.{}", version >> 4, version & 0x0f);

        // Direction bookkeeping. A zero responder cookie marks the opening
        // message of an exchange, so the initiator cookie is recorded
        // against the current flow; later packets look it up.
        let direction = context.flow.map(|flow| {
            let mut cache = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
            if r_cookie == 0 {
                cache.record(i_cookie, flow);
            }
            cache.direction(i_cookie, flow)
        });

        crate::emit!(
            out,
            " {} {}",
            EXCHANGE_NAMES.get(u32::from(exch_type)),
            match direction {
                Some(Some(Direction::Initiator)) => "I",
                Some(Some(Direction::Responder)) => "R",
                _ => "?",
            }
        );

        if out.verbose() {
            crate::emit!(
                out,
                " cookie {i_cookie:016x}->{r_cookie:016x} msgid {msg_id:08x} length {length}"
            );
            if flags != 0 {
                crate::emit!(out, " flags [{}]", FLAG_NAMES.flags(u32::from(flags)));
            }
        }

        if length < HEADER_LEN {
            out.invalid();
            return Ok(Printed::last());
        }

        if flags & 0x01 != 0 {
            // Encrypted payloads: nothing more to decode.
            out.str(" [encrypted]");
            return Ok(Printed::last());
        }

        print_payload_chain(&cur, HEADER_LEN, length - HEADER_LEN, first_payload, 0, out)?;

        Ok(Printed::last())
    }
}

/// Walk one next-payload chain within `[start, start + total)`.
///
/// Each payload's generic header names the type of the *following* payload;
/// `first` is the type of the payload at `start`. Declared payload lengths
/// include the 4-byte generic header, so a length below 4 cannot make
/// progress and is Invalid, as is a length overrunning the container.
fn print_payload_chain(
    cur: &PacketCursor<'_>,
    start: usize,
    total: usize,
    first: u8,
    depth: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if depth > MAX_NESTING {
        out.invalid();
        return Ok(());
    }

    let mut np = first;
    let mut offset = start;
    let mut remaining = total;

    while np != payload::NONE {
        if remaining < GENERIC_LEN {
            out.invalid();
            return Ok(());
        }

        let next = cur.u8_at(offset)?;
        let len = usize::from(cur.be16_at(offset + 2)?);

        if len < GENERIC_LEN || len > remaining {
            crate::emit!(out, " ({}", PAYLOAD_NAMES.get(u32::from(np)));
            out.invalid();
            out.str(")");
            return Ok(());
        }

        crate::emit!(out, " ({}", PAYLOAD_NAMES.get(u32::from(np)));
        match np {
            payload::SA => print_sa(cur, offset, len, depth, out)?,
            payload::PROPOSAL => print_proposal(cur, offset, len, depth, out)?,
            payload::TRANSFORM => print_transform(cur, offset, len, out)?,
            _ => {
                if out.verbose() {
                    crate::emit!(out, " len {}", len - GENERIC_LEN);
                }
            }
        }
        out.str(")");

        np = next;
        offset += len;
        remaining -= len;
    }

    Ok(())
}

/// SA payload: DOI, situation, then a chain of Proposal payloads.
fn print_sa(
    cur: &PacketCursor<'_>,
    offset: usize,
    len: usize,
    depth: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if len < GENERIC_LEN + 8 {
        out.invalid();
        return Ok(());
    }
    let doi = cur.be32_at(offset + 4)?;
    let situation = cur.be32_at(offset + 8)?;
    if out.verbose() {
        crate::emit!(out, " doi {doi} situation {situation:#x}");
    }
    print_payload_chain(
        cur,
        offset + GENERIC_LEN + 8,
        len - GENERIC_LEN - 8,
        payload::PROPOSAL,
        depth + 1,
        out,
    )
}

/// Proposal payload: number, protocol id, SPI, then Transform payloads.
fn print_proposal(
    cur: &PacketCursor<'_>,
    offset: usize,
    len: usize,
    depth: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if len < GENERIC_LEN + 4 {
        out.invalid();
        return Ok(());
    }
    let number = cur.u8_at(offset + 4)?;
    let proto_id = cur.u8_at(offset + 5)?;
    let spi_size = usize::from(cur.u8_at(offset + 6)?);
    let transform_count = cur.u8_at(offset + 7)?;

    crate::emit!(out, " #{number} proto {proto_id} transforms {transform_count}");

    let body = len - GENERIC_LEN - 4;
    if spi_size > body {
        out.invalid();
        return Ok(());
    }
    if spi_size > 0 && out.verbose() {
        let spi = cur.span(offset + 8, spi_size)?;
        out.str(" spi 0x");
        for b in spi {
            crate::emit!(out, "{b:02x}");
        }
    }

    print_payload_chain(
        cur,
        offset + 8 + spi_size,
        body - spi_size,
        payload::TRANSFORM,
        depth + 1,
        out,
    )
}

/// Transform payload: number, transform id, then attributes.
fn print_transform(
    cur: &PacketCursor<'_>,
    offset: usize,
    len: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if len < GENERIC_LEN + 4 {
        out.invalid();
        return Ok(());
    }
    let number = cur.u8_at(offset + 4)?;
    let id = cur.u8_at(offset + 5)?;
    crate::emit!(out, " #{number} id {id}");

    print_attributes(cur, offset + GENERIC_LEN + 4, len - GENERIC_LEN - 4, out)
}

/// Transform attributes come in two encodings selected by the top bit of the
/// type: set means TV (a 2-byte immediate value), clear means TLV with an
/// explicit value length. Both record forms are at least 4 bytes, so the
/// walk always advances.
fn print_attributes(
    cur: &PacketCursor<'_>,
    start: usize,
    total: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    let mut offset = start;
    let mut remaining = total;

    while remaining > 0 {
        if remaining < 4 {
            out.invalid();
            return Ok(());
        }

        let typ = cur.be16_at(offset)?;
        if typ & 0x8000 != 0 {
            // TV form: the "length" field is the value.
            let value = cur.be16_at(offset + 2)?;
            if out.verbose() {
                crate::emit!(out, " attr {}={value}", typ & 0x7fff);
            }
            offset += 4;
            remaining -= 4;
        } else {
            let len = usize::from(cur.be16_at(offset + 2)?);
            if 4 + len > remaining {
                out.invalid();
                return Ok(());
            }
            if out.verbose() {
                crate::emit!(out, " attr {typ} len {len}");
            }
            offset += 4 + len;
            remaining -= 4 + len;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FlowHash;

    fn header(i_cookie: u64, r_cookie: u64, first_payload: u8, length: u32) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&i_cookie.to_be_bytes());
        d.extend_from_slice(&r_cookie.to_be_bytes());
        d.push(first_payload);
        d.push(0x10); // v1.0
        d.push(2); // ident exchange
        d.push(0); // flags
        d.extend_from_slice(&0u32.to_be_bytes()); // msgid
        d.extend_from_slice(&length.to_be_bytes());
        d
    }

    fn ctx_with_flow(flow: FlowHash) -> PrintContext {
        let mut ctx = PrintContext::new(1, 0);
        ctx.insert_hint("dst_port", u64::from(PORT_ISAKMP));
        ctx.flow = Some(flow);
        ctx
    }

    #[test]
    fn test_can_print_on_port_500() {
        let p = IsakmpPrinter::new();
        let mut ctx = PrintContext::new(1, 0);
        assert!(p.can_print(&ctx).is_none());
        ctx.insert_hint("src_port", 500);
        assert!(p.can_print(&ctx).is_some());
    }

    #[test]
    fn test_sa_proposal_transform_recursion() {
        // SA (len 40) > proposal (len 28) > transform (len 16) with one TV
        // and one TLV attribute.
        let mut d = header(0xaabb, 0, payload::SA, 68);
        // SA generic header: next none, len 40
        d.extend_from_slice(&[0, 0, 0, 40]);
        d.extend_from_slice(&1u32.to_be_bytes()); // doi ipsec
        d.extend_from_slice(&1u32.to_be_bytes()); // situation
        // proposal: next none, len 28
        d.extend_from_slice(&[0, 0, 0, 28]);
        d.extend_from_slice(&[1, 1, 4, 1]); // #1, proto 1, spi size 4, 1 transform
        d.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]); // spi
        // transform: next none, len 16
        d.extend_from_slice(&[0, 0, 0, 16]);
        d.extend_from_slice(&[1, 1, 0, 0]); // #1, id 1
        d.extend_from_slice(&[0x80, 0x01, 0x00, 0x05]); // TV attr 1 = 5
        d.extend_from_slice(&[0x00, 0x0b, 0x00, 0x00]); // TLV attr 11, len 0

        let flow = FlowHash::from_addrs(&[1, 1, 1, 1], &[2, 2, 2, 2]);
        let p = IsakmpPrinter::new();
        let mut out = Emitter::new(1);
        let printed = p.print(&d, &ctx_with_flow(flow), &mut out).unwrap();

        let text = out.as_str();
        assert!(text.contains("(sa"));
        assert!(text.contains("(proposal #1 proto 1 transforms 1"));
        assert!(text.contains("spi 0xdeadbeef"));
        assert!(text.contains("(transform #1 id 1 attr 1=5 attr 11 len 0"));
        assert!(!text.contains("invalid"));
        assert!(printed.stop);
    }

    #[test]
    fn test_direction_marks_across_packets() {
        let p = IsakmpPrinter::new();
        let flow = FlowHash::from_addrs(&[10, 0, 0, 1], &[10, 0, 0, 2]);
        let reply = FlowHash { fwd: flow.rev, rev: flow.fwd };

        // Initiator opens with a zero responder cookie.
        let first = header(0x1111, 0, payload::NONE, 28);
        let mut out = Emitter::new(0);
        p.print(&first, &ctx_with_flow(flow), &mut out).unwrap();
        assert!(out.as_str().contains(" I"));

        // The response carries the same initiator cookie on the reverse flow.
        let second = header(0x1111, 0x2222, payload::NONE, 28);
        let mut out = Emitter::new(0);
        p.print(&second, &ctx_with_flow(reply), &mut out).unwrap();
        assert!(out.as_str().contains(" R"));

        // An unknown cookie gets the unknown mark.
        let third = header(0x9999, 0x2222, payload::NONE, 28);
        let mut out = Emitter::new(0);
        p.print(&third, &ctx_with_flow(flow), &mut out).unwrap();
        assert!(out.as_str().contains(" ?"));
    }

    #[test]
    fn test_payload_length_overrun_is_invalid() {
        // One payload claiming 200 bytes inside a 50-byte message.
        let mut d = header(0xaabb, 0, 13, 50);
        d.extend_from_slice(&[0, 0, 0, 200]);
        d.extend_from_slice(&[0u8; 18]);
        let p = IsakmpPrinter::new();
        let mut out = Emitter::new(0);
        let flow = FlowHash::from_addrs(&[1, 0, 0, 1], &[1, 0, 0, 2]);
        p.print(&d, &ctx_with_flow(flow), &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_truncated_header_unwinds() {
        let d = &header(1, 2, 0, 28)[..20];
        let p = IsakmpPrinter::new();
        let mut out = Emitter::new(0);
        let mut ctx = PrintContext::new(1, 28);
        ctx.insert_hint("dst_port", 500);
        assert!(p.print(d, &ctx, &mut out).is_err());
    }

    #[test]
    fn test_encrypted_stops_payload_walk() {
        let mut d = header(0xaa, 0xbb, payload::SA, 60);
        d[19] = 0x01; // encrypt flag
        d.extend_from_slice(&[0u8; 32]);
        let p = IsakmpPrinter::new();
        let mut out = Emitter::new(0);
        let flow = FlowHash::from_addrs(&[1, 0, 0, 1], &[1, 0, 0, 2]);
        p.print(&d, &ctx_with_flow(flow), &mut out).unwrap();
        assert!(out.as_str().contains("[encrypted]"));
        assert!(!out.as_str().contains("(sa"));
    }
}
