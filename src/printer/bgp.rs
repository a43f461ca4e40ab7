//! BGP printer.
//!
//! A TCP segment can carry several BGP messages back to back; each starts
//! with a 16-byte marker, a 2-byte length that counts the whole message, and
//! a type byte. UPDATE messages hold the interesting structure: withdrawn
//! prefixes, a path-attribute sequence whose length field widens to two
//! bytes when the extended-length flag is set, and announced prefixes.
//!
//! AS_PATH carries 2- or 4-byte AS numbers with nothing on the wire saying
//! which; whichever size walks the segment list to exactly its end wins.

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::tlv::{self, Step, TlvShape};
use crate::token::Tokens;

/// TCP port for BGP.
pub const PORT_BGP: u16 = 179;

/// Message header: marker (16), length (2), type (1).
const HEADER_LEN: usize = 19;

/// Upper bound on the message length field.
const MAX_MESSAGE_LEN: usize = 4096;

/// Attribute flag: the length field is two bytes.
const FLAG_EXTENDED_LENGTH: u8 = 0x10;

/// OPEN optional parameters and the capabilities inside them share a
/// (code, length, value) shape.
const PARAM_SHAPE: TlvShape = TlvShape {
    type_width: 1,
    len_width: 1,
    length_first: false,
    length_includes_header: false,
    align: 1,
};

mod msg {
    pub const OPEN: u8 = 1;
    pub const UPDATE: u8 = 2;
    pub const NOTIFICATION: u8 = 3;
    pub const ROUTE_REFRESH: u8 = 5;
}

const MSG_TYPE_NAMES: Tokens = Tokens(&[
    (1, "open"),
    (2, "update"),
    (3, "notification"),
    (4, "keepalive"),
    (5, "route-refresh"),
]);

/// Path attribute types.
mod attr {
    pub const ORIGIN: u8 = 1;
    pub const AS_PATH: u8 = 2;
    pub const NEXT_HOP: u8 = 3;
    pub const MED: u8 = 4;
    pub const LOCAL_PREF: u8 = 5;
    pub const COMMUNITIES: u8 = 8;
}

const ATTR_NAMES: Tokens = Tokens(&[
    (1, "origin"),
    (2, "as-path"),
    (3, "next-hop"),
    (4, "med"),
    (5, "local-pref"),
    (6, "atomic-aggregate"),
    (7, "aggregator"),
    (8, "communities"),
    (14, "mp-reach-nlri"),
    (15, "mp-unreach-nlri"),
]);

const ORIGIN_NAMES: Tokens = Tokens(&[(0, "igp"), (1, "egp"), (2, "incomplete")]);

const PARAM_NAMES: Tokens = Tokens(&[(1, "authentication"), (2, "capabilities")]);

const CAPABILITY_NAMES: Tokens = Tokens(&[
    (1, "multiprotocol"),
    (2, "route-refresh"),
    (64, "graceful-restart"),
    (65, "4-byte-as"),
]);

const NOTIFY_CODE_NAMES: Tokens = Tokens(&[
    (1, "message-header"),
    (2, "open"),
    (3, "update"),
    (4, "hold-timer"),
    (5, "fsm"),
    (6, "cease"),
]);

/// BGP printer.
#[derive(Debug, Clone, Copy)]
pub struct BgpPrinter;

impl Printer for BgpPrinter {
    fn name(&self) -> &'static str {
        "bgp"
    }

    fn display_name(&self) -> &'static str {
        "BGP"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        let port = u64::from(PORT_BGP);
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

        out.str("BGP");

        let mut offset = 0;
        while offset < data.len() {
            // The marker bytes are not interpreted; the length and type
            // reads cover the capture check for the header.
            let length = usize::from(cur.be16_at(offset + 16)?);
            let typ = cur.u8_at(offset + 18)?;

            crate::emit!(out, " ({}", MSG_TYPE_NAMES.get(u32::from(typ)));

            if length < HEADER_LEN || length > MAX_MESSAGE_LEN {
                out.invalid();
                out.str(")");
                return Ok(Printed::last());
            }

            if out.verbose() {
                match typ {
                    msg::OPEN => print_open(&cur, offset, length, out)?,
                    msg::UPDATE => print_update(&cur, offset, length, out)?,
                    msg::NOTIFICATION => print_notification(&cur, offset, length, out)?,
                    msg::ROUTE_REFRESH => print_route_refresh(&cur, offset, length, out)?,
                    _ => {}
                }
            }
            out.str(")");

            offset += length;
        }

        Ok(Printed::last())
    }
}

/// OPEN: version, AS, hold time, router id, then optional parameters.
fn print_open(
    cur: &PacketCursor<'_>,
    offset: usize,
    length: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if length < HEADER_LEN + 10 {
        out.invalid();
        return Ok(());
    }
    let version = cur.u8_at(offset + 19)?;
    let asn = cur.be16_at(offset + 20)?;
    let holdtime = cur.be16_at(offset + 22)?;
    let id = cur.span(offset + 24, 4)?;
    let opt_len = usize::from(cur.u8_at(offset + 28)?);

    crate::emit!(
        out,
        " v{version} as {asn} holdtime {holdtime} id {}.{}.{}.{}",
        id[0],
        id[1],
        id[2],
        id[3]
    );

    // The optional-parameter area must fill the rest of the message exactly.
    if opt_len != length - HEADER_LEN - 10 {
        out.invalid();
        return Ok(());
    }

    tlv::walk(cur, offset + 29, opt_len, &PARAM_SHAPE, 0, out, |out, rec| {
        crate::emit!(out, " {}", PARAM_NAMES.get(rec.typ));
        if rec.typ == 2 {
            tlv::walk(
                cur,
                rec.value_off,
                rec.value_len,
                &PARAM_SHAPE,
                1,
                out,
                |out, cap| {
                    crate::emit!(out, " <{}>", CAPABILITY_NAMES.get(cap.typ));
                    Ok(Step::Continue)
                },
            )?;
        }
        Ok(Step::Continue)
    })
}

/// UPDATE: withdrawn prefixes, path attributes, announced prefixes.
fn print_update(
    cur: &PacketCursor<'_>,
    offset: usize,
    length: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    let end = offset + length;
    let mut pos = offset + HEADER_LEN;

    if pos + 2 > end {
        out.invalid();
        return Ok(());
    }
    let withdrawn_len = usize::from(cur.be16_at(pos)?);
    pos += 2;
    if pos + withdrawn_len + 2 > end {
        out.invalid();
        return Ok(());
    }
    if withdrawn_len > 0 {
        out.str(" withdrawn");
        if !print_prefixes(cur, pos, withdrawn_len, out)? {
            return Ok(());
        }
    }
    pos += withdrawn_len;

    let attrs_len = usize::from(cur.be16_at(pos)?);
    pos += 2;
    if pos + attrs_len > end {
        out.invalid();
        return Ok(());
    }
    if !print_attributes(cur, pos, attrs_len, out)? {
        return Ok(());
    }
    pos += attrs_len;

    if pos < end {
        out.str(" nlri");
        print_prefixes(cur, pos, end - pos, out)?;
    }
    Ok(())
}

fn print_notification(
    cur: &PacketCursor<'_>,
    offset: usize,
    length: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if length < HEADER_LEN + 2 {
        out.invalid();
        return Ok(());
    }
    let code = cur.u8_at(offset + 19)?;
    let subcode = cur.u8_at(offset + 20)?;
    crate::emit!(
        out,
        " {} ({subcode})",
        NOTIFY_CODE_NAMES.get(u32::from(code))
    );
    Ok(())
}

fn print_route_refresh(
    cur: &PacketCursor<'_>,
    offset: usize,
    length: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if length < HEADER_LEN + 4 {
        out.invalid();
        return Ok(());
    }
    let afi = cur.be16_at(offset + 19)?;
    let safi = cur.u8_at(offset + 22)?;
    crate::emit!(out, " afi {afi} safi {safi}");
    Ok(())
}

/// Walk a prefix list: one length-in-bits byte, then just enough octets to
/// cover it. Returns false when the list was Invalid (marker already
/// emitted).
fn print_prefixes(
    cur: &PacketCursor<'_>,
    start: usize,
    total: usize,
    out: &mut Emitter,
) -> DecodeResult<bool> {
    let mut pos = start;
    let end = start + total;

    while pos < end {
        let plen = usize::from(cur.u8_at(pos)?);
        if plen > 32 {
            out.invalid();
            return Ok(false);
        }
        let nbytes = plen.div_ceil(8);
        if pos + 1 + nbytes > end {
            out.invalid();
            return Ok(false);
        }
        let mut octets = [0u8; 4];
        cur.copy_into(&mut octets[..nbytes], pos + 1)?;
        crate::emit!(
            out,
            " {}.{}.{}.{}/{plen}",
            octets[0],
            octets[1],
            octets[2],
            octets[3]
        );
        pos += 1 + nbytes;
    }
    Ok(true)
}

fn print_attributes(
    cur: &PacketCursor<'_>,
    start: usize,
    total: usize,
    out: &mut Emitter,
) -> DecodeResult<bool> {
    let mut pos = start;
    let end = start + total;

    while pos < end {
        if pos + 3 > end {
            out.invalid();
            return Ok(false);
        }
        let flags = cur.u8_at(pos)?;
        let typ = cur.u8_at(pos + 1)?;
        let extended = flags & FLAG_EXTENDED_LENGTH != 0;
        let header = if extended { 4 } else { 3 };
        if pos + header > end {
            out.invalid();
            return Ok(false);
        }
        let value_len = if extended {
            usize::from(cur.be16_at(pos + 2)?)
        } else {
            usize::from(cur.u8_at(pos + 2)?)
        };
        if pos + header + value_len > end {
            out.invalid();
            return Ok(false);
        }
        let value_off = pos + header;

        crate::emit!(out, " {}", ATTR_NAMES.get(u32::from(typ)));
        match typ {
            attr::ORIGIN if value_len == 1 => {
                crate::emit!(out, " {}", ORIGIN_NAMES.get(u32::from(cur.u8_at(value_off)?)));
            }
            attr::AS_PATH => print_as_path(cur, value_off, value_len, out)?,
            attr::NEXT_HOP if value_len == 4 => {
                let nh = cur.span(value_off, 4)?;
                crate::emit!(out, " {}.{}.{}.{}", nh[0], nh[1], nh[2], nh[3]);
            }
            attr::MED | attr::LOCAL_PREF if value_len == 4 => {
                crate::emit!(out, " {}", cur.be32_at(value_off)?);
            }
            attr::COMMUNITIES => {
                let mut o = value_off;
                while o + 4 <= value_off + value_len {
                    crate::emit!(out, " {}:{}", cur.be16_at(o)?, cur.be16_at(o + 2)?);
                    o += 4;
                }
            }
            _ => {}
        }

        pos += header + value_len;
    }
    Ok(true)
}

/// Segment list: (type, count, count ASes). AS_SET renders in braces.
fn print_as_path(
    cur: &PacketCursor<'_>,
    start: usize,
    len: usize,
    out: &mut Emitter,
) -> DecodeResult<()> {
    if len == 0 {
        out.str(" empty");
        return Ok(());
    }
    let as_width = as_size(cur, start, len)?;
    let end = start + len;
    let mut pos = start;

    while pos < end {
        if pos + 2 > end {
            out.invalid();
            return Ok(());
        }
        let seg_type = cur.u8_at(pos)?;
        let count = usize::from(cur.u8_at(pos + 1)?);
        if pos + 2 + count * as_width > end {
            out.invalid();
            return Ok(());
        }
        if seg_type == 1 {
            out.str(" {");
        }
        for i in 0..count {
            let o = pos + 2 + i * as_width;
            let asn = if as_width == 4 {
                u64::from(cur.be32_at(o)?)
            } else {
                u64::from(cur.be16_at(o)?)
            };
            crate::emit!(out, " {asn}");
        }
        if seg_type == 1 {
            out.str(" }");
        }
        pos += 2 + count * as_width;
    }
    Ok(())
}

/// Pick the AS number width by trial walk: the size whose segment list lands
/// exactly on the attribute end is the one on the wire.
fn as_size(cur: &PacketCursor<'_>, start: usize, len: usize) -> DecodeResult<usize> {
    let end = start + len;
    for width in [4usize, 2] {
        let mut pos = start;
        let mut fits = true;
        while pos < end {
            if pos + 2 > end {
                fits = false;
                break;
            }
            let count = usize::from(cur.u8_at(pos + 1)?);
            pos += 2 + count * width;
        }
        if fits && pos == end {
            return Ok(width);
        }
    }
    Ok(2)
}
