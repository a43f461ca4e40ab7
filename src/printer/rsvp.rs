//! RSVP printer.
//!
//! RSVP messages are a fixed 8-byte common header followed by a sequence of
//! 32-bit-aligned objects. The object header is the odd one out among the
//! supported protocols: the 2-byte length comes *before* the tag, and the
//! tag itself is a class byte plus a class-type byte. Both bytes are packed
//! into the walker's type value, class high.
//!
//! Generalized UNI objects nest: their value is another sequence of objects
//! with the same header layout, walked recursively.

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::tlv::{self, Step, TlvRecord, TlvShape};
use crate::token::{TokenGroups, Tokens};

/// IP protocol number for RSVP.
pub const IP_PROTO_RSVP: u8 = 46;

/// Common header length.
const HEADER_LEN: usize = 8;

/// Object header: length (2 bytes) then class and class-type.
const OBJECT_SHAPE: TlvShape = TlvShape {
    type_width: 2,
    len_width: 2,
    length_first: true,
    length_includes_header: true,
    align: 4,
};

const MSG_TYPE_NAMES: Tokens = Tokens(&[
    (1, "path"),
    (2, "resv"),
    (3, "patherr"),
    (4, "resverr"),
    (5, "pathtear"),
    (6, "resvtear"),
    (7, "resvconf"),
    (12, "bundle"),
    (13, "ack"),
    (15, "srefresh"),
    (20, "hello"),
]);

/// Object classes.
mod class {
    pub const SESSION: u8 = 1;
    pub const TIME_VALUES: u8 = 5;
    pub const STYLE: u8 = 8;
    pub const LABEL: u8 = 16;
    pub const GENERALIZED_UNI: u8 = 229;
}

const CLASS_NAMES: Tokens = Tokens(&[
    (1, "session"),
    (3, "rsvp-hop"),
    (4, "integrity"),
    (5, "time-values"),
    (6, "error-spec"),
    (7, "scope"),
    (8, "style"),
    (9, "flowspec"),
    (10, "filterspec"),
    (11, "sender-template"),
    (12, "sender-tspec"),
    (13, "adspec"),
    (14, "policy-data"),
    (15, "resv-confirm"),
    (16, "label"),
    (19, "label-request"),
    (20, "explicit-route"),
    (21, "record-route"),
    (22, "hello"),
    (207, "session-attribute"),
    (229, "generalized-uni"),
]);

/// The meaning of the class-type byte depends on the class.
const CTYPE_NAMES: TokenGroups = TokenGroups(&[
    (
        class::SESSION as u32,
        class::SESSION as u32,
        Tokens(&[(1, "IPv4"), (2, "IPv6"), (7, "IPv4-LSP"), (8, "IPv6-LSP")]),
    ),
    (
        class::LABEL as u32,
        class::LABEL as u32,
        Tokens(&[(1, "label"), (2, "generalized"), (3, "waveband")]),
    ),
    (
        class::GENERALIZED_UNI as u32,
        class::GENERALIZED_UNI as u32,
        Tokens(&[(1, "generalized-uni")]),
    ),
]);

/// RSVP printer.
#[derive(Debug, Clone, Copy)]
pub struct RsvpPrinter;

impl Printer for RsvpPrinter {
    fn name(&self) -> &'static str {
        "rsvp"
    }

    fn display_name(&self) -> &'static str {
        "RSVP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        match context.hint("ip_protocol") {
            Some(proto) if proto == u64::from(IP_PROTO_RSVP) => Some(100),
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

        let vflags = cur.u8_at(0)?;
        let msg_type = cur.u8_at(1)?;
        let ttl = cur.u8_at(4)?;
        let length = usize::from(cur.be16_at(6)?);

        crate::emit!(out, "RSVP {}", MSG_TYPE_NAMES.get(u32::from(msg_type)));

        if vflags >> 4 != 1 {
            out.invalid();
            return Ok(Printed::last());
        }

        // The message length counts the common header.
        if length < HEADER_LEN {
            crate::emit!(out, ", length {length}");
            out.invalid();
            return Ok(Printed::last());
        }

        crate::emit!(out, ", length {length}");
        if out.verbose() {
            crate::emit!(out, ", ttl {ttl}");
            tlv::walk(
                &cur,
                HEADER_LEN,
                length - HEADER_LEN,
                &OBJECT_SHAPE,
                0,
                out,
                |out, rec| print_object(&cur, rec, 0, out),
            )?;
        }

        Ok(Printed::last())
    }
}

fn print_object(
    cur: &PacketCursor<'_>,
    rec: &TlvRecord,
    depth: usize,
    out: &mut Emitter,
) -> DecodeResult<Step> {
    let obj_class = (rec.typ >> 8) as u8;
    let ctype = (rec.typ & 0xff) as u8;

    out.indent(depth);
    crate::emit!(out, "{}", CLASS_NAMES.get(u32::from(obj_class)));
    match CTYPE_NAMES.table(u32::from(obj_class)) {
        Some(table) => crate::emit!(out, " ctype {} ({ctype})", table.get(u32::from(ctype))),
        None => crate::emit!(out, " ctype {ctype}"),
    }
    crate::emit!(out, " length {}", rec.declared_len);

    match obj_class {
        // IPv4 session: destination, protocol, destination port.
        class::SESSION if ctype == 1 => {
            if rec.value_len < 8 {
                out.invalid();
                return Ok(Step::Stop);
            }
            let dst = cur.span(rec.value_off, 4)?;
            let proto = cur.u8_at(rec.value_off + 4)?;
            let port = cur.be16_at(rec.value_off + 6)?;
            crate::emit!(
                out,
                ", dst {}.{}.{}.{} proto {proto} port {port}",
                dst[0],
                dst[1],
                dst[2],
                dst[3]
            );
        }
        class::TIME_VALUES => {
            if rec.value_len < 4 {
                out.invalid();
                return Ok(Step::Stop);
            }
            crate::emit!(out, ", refresh {}ms", cur.be32_at(rec.value_off)?);
        }
        class::STYLE => {
            if rec.value_len < 4 {
                out.invalid();
                return Ok(Step::Stop);
            }
            crate::emit!(out, ", vector {:#08x}", cur.be32_at(rec.value_off)? & 0x00ff_ffff);
        }
        class::LABEL => {
            let mut off = rec.value_off;
            let end = rec.value_off + rec.value_len;
            while off + 4 <= end {
                crate::emit!(out, ", label {}", cur.be32_at(off)?);
                off += 4;
            }
        }
        // Generalized UNI: the value is a nested object sequence with the
        // same header layout.
        class::GENERALIZED_UNI => {
            tlv::walk(
                cur,
                rec.value_off,
                rec.value_len,
                &OBJECT_SHAPE,
                depth + 1,
                out,
                |out, sub| print_object(cur, sub, depth + 1, out),
            )?;
        }
        _ => {}
    }

    Ok(Step::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(msg_type: u8, objects: &[u8]) -> Vec<u8> {
        let length = (HEADER_LEN + objects.len()) as u16;
        let mut d = vec![
            0x10, // version 1, no flags
            msg_type, 0x00, 0x00, // checksum
            64,   // ttl
            0x00, // reserved
        ];
        d.extend_from_slice(&length.to_be_bytes());
        d.extend_from_slice(objects);
        d
    }

    fn object(class: u8, ctype: u8, value: &[u8]) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&((value.len() + 4) as u16).to_be_bytes());
        d.push(class);
        d.push(ctype);
        d.extend_from_slice(value);
        d
    }

    fn ctx() -> PrintContext {
        let mut ctx = PrintContext::new(1, 0);
        ctx.insert_hint("ip_protocol", u64::from(IP_PROTO_RSVP));
        ctx
    }

    #[test]
    fn test_can_print_on_protocol_46() {
        assert!(RsvpPrinter.can_print(&ctx()).is_some());
        assert!(RsvpPrinter.can_print(&PrintContext::new(1, 0)).is_none());
    }

    #[test]
    fn test_path_with_session_and_label() {
        let mut objects = object(1, 1, &[10, 0, 0, 1, 17, 0, 0x01, 0xf4]);
        objects.extend_from_slice(&object(16, 1, &[0, 0, 0, 42]));
        let data = message(1, &objects);
        let mut out = Emitter::new(1);
        let printed = RsvpPrinter.print(&data, &ctx(), &mut out).unwrap();
        let text = out.as_str();
        assert!(text.contains("RSVP path, length 28"));
        assert!(text.contains("session ctype IPv4 (1) length 12, dst 10.0.0.1 proto 17 port 500"));
        assert!(text.contains("label ctype label (1) length 8, label 42"));
        assert!(printed.stop);
    }

    #[test]
    fn test_generalized_uni_nests() {
        let sub = object(1, 1, &[192, 0, 2, 1, 6, 0, 0, 80]);
        let data = message(2, &object(229, 1, &sub));
        let mut out = Emitter::new(1);
        RsvpPrinter.print(&data, &ctx(), &mut out).unwrap();
        let text = out.as_str();
        assert!(text.contains("generalized-uni ctype generalized-uni (1) length 16"));
        assert!(text.contains("\n\t\tsession ctype IPv4 (1) length 12, dst 192.0.2.1"));
    }

    #[test]
    fn test_bad_version_is_invalid() {
        let mut data = message(1, &[]);
        data[0] = 0x20;
        let mut out = Emitter::new(1);
        let printed = RsvpPrinter.print(&data, &ctx(), &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
        assert!(printed.stop);
    }

    #[test]
    fn test_object_overrun_is_invalid() {
        // Object claims 200 bytes inside a 12-byte message body.
        let mut objects = object(1, 1, &[10, 0, 0, 1, 17, 0, 0, 80]);
        objects[0..2].copy_from_slice(&200u16.to_be_bytes());
        let data = message(1, &objects);
        let mut out = Emitter::new(1);
        RsvpPrinter.print(&data, &ctx(), &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_short_session_value_is_invalid() {
        let data = message(1, &object(1, 1, &[10, 0]));
        // Align: value len 2 rounds the object to 8 bytes on the wire.
        let mut out = Emitter::new(1);
        RsvpPrinter.print(&data, &ctx(), &mut out).unwrap();
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_truncated_object_unwinds() {
        let objects = object(1, 1, &[10, 0, 0, 1, 17, 0, 0, 80]);
        let full = message(1, &objects);
        let data = &full[..12];
        let mut out = Emitter::new(1);
        assert!(RsvpPrinter.print(data, &ctx(), &mut out).is_err());
    }
}
