//! Generic walker for type-length-value record sequences.
//!
//! Most of the supported protocols carry variable-length, self-describing
//! records: ISAKMP transform attributes, RSVP objects, HNCP TLVs. The record
//! header shapes differ (one- or two-byte tags, length before or after the
//! tag, length with or without the header, 32-bit alignment), but the walk is
//! the same and so are the ways it can go wrong. This module centralizes the
//! walk so every consumer gets the same guarantees:
//!
//! - every header read is bounds-checked (truncation aborts the whole packet
//!   via `?`);
//! - a declared record length that cannot cover its own header, or that
//!   extends past the container, is Invalid: the marker is printed and the
//!   walk stops without resynchronizing;
//! - every iteration advances by at least the header size, so a crafted
//!   zero-length record cannot loop forever;
//! - nested containers recurse back into the walker with `depth + 1`, and
//!   [`MAX_NESTING`] caps the recursion independently of length accounting.
//!
//! The walker never interprets record values. The handler decides what a
//! record means; returning [`Step::Stop`] ends the walk early (terminator
//! records, or a handler that printed the invalid marker itself).

use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;

/// Hard cap on nested container recursion, independent of length accounting.
/// Deep nesting of near-zero-length containers must not exhaust the stack.
pub const MAX_NESTING: usize = 100;

/// Record header shape for one protocol's TLV encoding.
#[derive(Debug, Clone, Copy)]
pub struct TlvShape {
    /// Width of the type tag in bytes (1 or 2).
    pub type_width: usize,
    /// Width of the length field in bytes (1 or 2).
    pub len_width: usize,
    /// True when the length field precedes the type tag (RSVP objects).
    pub length_first: bool,
    /// True when the declared length counts the header too.
    pub length_includes_header: bool,
    /// Records are padded so each starts at a multiple of this (1 = packed).
    pub align: usize,
}

/// One record as seen by the walker. The value is described by offset and
/// length rather than borrowed, so an unknown-type record can be skipped
/// without requiring its bytes to have been captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord {
    /// Type tag.
    pub typ: u32,
    /// Raw declared length field, as found on the wire.
    pub declared_len: usize,
    /// Offset of the first value byte.
    pub value_off: usize,
    /// Value length in bytes (header already excluded).
    pub value_len: usize,
}

/// Handler verdict for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

fn round_up(n: usize, align: usize) -> usize {
    debug_assert!(align >= 1);
    n.div_ceil(align) * align
}

/// Walk the records in `[start, start + total)`, dispatching each to
/// `handle`. `total` comes from the container's declared length and is
/// untrusted; capture bounds are enforced by the cursor on every read.
///
/// `depth` is the current container nesting level; handlers that descend
/// into a nested container must pass `depth + 1`.
pub fn walk<F>(
    cur: &PacketCursor<'_>,
    start: usize,
    total: usize,
    shape: &TlvShape,
    depth: usize,
    out: &mut Emitter,
    mut handle: F,
) -> DecodeResult<()>
where
    F: FnMut(&mut Emitter, &TlvRecord) -> DecodeResult<Step>,
{
    if depth > MAX_NESTING {
        out.invalid();
        return Ok(());
    }

    let header = shape.type_width + shape.len_width;
    debug_assert!(header >= 1);

    let mut offset = start;
    let mut remaining = total;

    while remaining > 0 {
        if remaining < header {
            // Container claims leftover bytes too small for a record header.
            out.invalid();
            return Ok(());
        }

        let (type_off, len_off) = if shape.length_first {
            (offset + shape.len_width, offset)
        } else {
            (offset, offset + shape.type_width)
        };

        let typ = match shape.type_width {
            1 => u32::from(cur.u8_at(type_off)?),
            _ => u32::from(cur.be16_at(type_off)?),
        };
        let declared_len = match shape.len_width {
            1 => usize::from(cur.u8_at(len_off)?),
            _ => usize::from(cur.be16_at(len_off)?),
        };

        let total_len = if shape.length_includes_header {
            declared_len
        } else {
            declared_len + header
        };

        // A length that cannot cover its own header (the zero-length record
        // included) or that overruns the container is the packet lying about
        // its own structure: Invalid, and the walk stops here. Remaining
        // bytes are left undecoded, not misinterpreted.
        if total_len < header || total_len > remaining {
            out.invalid();
            return Ok(());
        }

        let record = TlvRecord {
            typ,
            declared_len,
            value_off: offset + header,
            value_len: total_len - header,
        };

        if handle(out, &record)? == Step::Stop {
            return Ok(());
        }

        let advance = round_up(total_len, shape.align).min(remaining);
        offset += advance;
        remaining -= advance;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKED: TlvShape = TlvShape {
        type_width: 1,
        len_width: 1,
        length_first: false,
        length_includes_header: false,
        align: 1,
    };

    const ALIGNED4: TlvShape = TlvShape {
        type_width: 2,
        len_width: 2,
        length_first: false,
        length_includes_header: false,
        align: 4,
    };

    const SELF_SIZED: TlvShape = TlvShape {
        type_width: 1,
        len_width: 1,
        length_first: false,
        length_includes_header: true,
        align: 1,
    };

    fn collect(data: &[u8], shape: &TlvShape) -> (Vec<TlvRecord>, String) {
        let cur = PacketCursor::new(data);
        let mut out = Emitter::new(0);
        let mut seen = Vec::new();
        walk(&cur, 0, data.len(), shape, 0, &mut out, |_, rec| {
            seen.push(*rec);
            Ok(Step::Continue)
        })
        .unwrap();
        (seen, out.finish())
    }

    #[test]
    fn test_walks_packed_records() {
        // (1, len 2, ab cd) (2, len 0) (3, len 1, ee)
        let data = [1, 2, 0xab, 0xcd, 2, 0, 3, 1, 0xee];
        let (seen, text) = collect(&data, &PACKED);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].typ, 1);
        assert_eq!(seen[0].value_len, 2);
        assert_eq!(seen[1].value_len, 0);
        assert_eq!(seen[2].value_off, 8);
        assert!(!text.contains("invalid"));
    }

    #[test]
    fn test_zero_total_length_stops_in_one_iteration() {
        // Self-sized record declaring length 0: cannot cover its own header.
        let data = [0, 0, 0, 0];
        let cur = PacketCursor::new(&data);
        let mut out = Emitter::new(0);
        let mut iterations = 0;
        walk(&cur, 0, data.len(), &SELF_SIZED, 0, &mut out, |_, _| {
            iterations += 1;
            Ok(Step::Continue)
        })
        .unwrap();
        assert_eq!(iterations, 0);
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_length_past_container_is_invalid_not_truncated() {
        // Record claims 200 value bytes inside a 50-byte container; all 50
        // bytes are captured, so this is the packet lying, not a short read.
        let mut data = vec![0u8; 50];
        data[0] = 7;
        data[1] = 200;
        let cur = PacketCursor::new(&data);
        let mut out = Emitter::new(0);
        let result = walk(&cur, 0, 50, &PACKED, 0, &mut out, |_, _| Ok(Step::Continue));
        assert!(result.is_ok());
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_truncated_header_unwinds() {
        // Container says 8 bytes remain but only 1 was captured: the header
        // read fails and the Truncated error propagates.
        let data = [1u8];
        let cur = PacketCursor::new(&data);
        let mut out = Emitter::new(0);
        let result = walk(&cur, 0, 8, &PACKED, 0, &mut out, |_, _| Ok(Step::Continue));
        assert!(result.is_err());
    }

    #[test]
    fn test_alignment_advance() {
        // 4-byte-aligned records: value len 1 pads to the next boundary.
        let data = [
            0, 1, 0, 1, 0xaa, 0, 0, 0, // type 1, len 1, 3 pad bytes
            0, 2, 0, 0, // type 2, len 0
        ];
        let (seen, text) = collect(&data, &ALIGNED4);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].typ, 2);
        assert_eq!(seen[1].value_off, 12);
        assert!(!text.contains("invalid"));
    }

    #[test]
    fn test_handler_stop_ends_walk() {
        let data = [1, 0, 2, 0, 3, 0];
        let cur = PacketCursor::new(&data);
        let mut out = Emitter::new(0);
        let mut seen = Vec::new();
        walk(&cur, 0, data.len(), &PACKED, 0, &mut out, |_, rec| {
            seen.push(rec.typ);
            Ok(if rec.typ == 2 { Step::Stop } else { Step::Continue })
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_depth_cap() {
        let data = [1u8, 0];
        let cur = PacketCursor::new(&data);
        let mut out = Emitter::new(0);
        walk(
            &cur,
            0,
            data.len(),
            &PACKED,
            MAX_NESTING + 1,
            &mut out,
            |_, _| panic!("handler must not run past the nesting cap"),
        )
        .unwrap();
        assert!(out.as_str().contains("(invalid)"));
    }

    #[test]
    fn test_trailing_sliver_is_invalid() {
        // One good record, then a single leftover byte the container claims.
        let data = [1, 1, 0xaa, 9];
        let (seen, text) = collect(&data, &PACKED);
        assert_eq!(seen.len(), 1);
        assert!(text.contains("(invalid)"));
    }
}
