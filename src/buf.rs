//! Bounds-checked field extraction from captured packet data.
//!
//! [`PacketCursor`] wraps the captured bytes of one packet. Every multi-byte
//! read funnels through [`PacketCursor::span`], which checks the requested
//! range against the end of the capture and fails with [`Truncated`] instead
//! of returning a partial value. Centralizing the check here is what keeps
//! the individually-authored printers memory-safe as a set: a printer that
//! forgets to validate a length can print garbage field values, but it can
//! never read outside the capture.
//!
//! The cursor is positionless: callers pass absolute offsets. Offsets are
//! packet-relative, so an attacker-supplied length can at worst send an
//! offset past the end, which `checked_add` turns into a clean `Truncated`.
//!
//! All multi-byte integers are unsigned; no implicit sign extension. 24- and
//! 48-bit widths are first-class because several protocols (DCCP sequence
//! numbers among them) carry them natively.

use crate::error::{DecodeResult, Truncated};

/// A read-only view of one packet's captured bytes.
///
/// The slice end is the snapshot end: the sole trustworthy bound. Declared
/// on-wire lengths are tracked separately by the printers and never used to
/// justify a read.
#[derive(Debug, Clone, Copy)]
pub struct PacketCursor<'a> {
    data: &'a [u8],
}

impl<'a> PacketCursor<'a> {
    /// Wrap captured packet data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Number of captured bytes.
    pub fn caplen(&self) -> usize {
        self.data.len()
    }

    /// True iff `[offset, offset + width)` lies entirely within the capture.
    /// Pure; never fails. Use this to test for optional trailing data.
    pub fn ok(&self, offset: usize, width: usize) -> bool {
        offset
            .checked_add(width)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Borrow `width` bytes starting at `offset`.
    pub fn span(&self, offset: usize, width: usize) -> DecodeResult<&'a [u8]> {
        let end = offset.checked_add(width).ok_or(Truncated)?;
        if end > self.data.len() {
            return Err(Truncated);
        }
        Ok(&self.data[offset..end])
    }

    /// Borrow everything from `offset` to the snapshot end.
    pub fn tail(&self, offset: usize) -> DecodeResult<&'a [u8]> {
        if offset > self.data.len() {
            return Err(Truncated);
        }
        Ok(&self.data[offset..])
    }

    /// Copy `dest.len()` bytes starting at `offset` into `dest`.
    pub fn copy_into(&self, dest: &mut [u8], offset: usize) -> DecodeResult<()> {
        dest.copy_from_slice(self.span(offset, dest.len())?);
        Ok(())
    }

    pub fn u8_at(&self, offset: usize) -> DecodeResult<u8> {
        Ok(self.span(offset, 1)?[0])
    }

    pub fn be16_at(&self, offset: usize) -> DecodeResult<u16> {
        let b = self.span(offset, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn be24_at(&self, offset: usize) -> DecodeResult<u32> {
        let b = self.span(offset, 3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn be32_at(&self, offset: usize) -> DecodeResult<u32> {
        let b = self.span(offset, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn be48_at(&self, offset: usize) -> DecodeResult<u64> {
        let b = self.span(offset, 6)?;
        Ok(u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]]))
    }

    pub fn be64_at(&self, offset: usize) -> DecodeResult<u64> {
        let b = self.span(offset, 8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn le16_at(&self, offset: usize) -> DecodeResult<u16> {
        let b = self.span(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn le24_at(&self, offset: usize) -> DecodeResult<u32> {
        let b = self.span(offset, 3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn le32_at(&self, offset: usize) -> DecodeResult<u32> {
        let b = self.span(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn le48_at(&self, offset: usize) -> DecodeResult<u64> {
        let b = self.span(offset, 6)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], 0, 0]))
    }

    pub fn le64_at(&self, offset: usize) -> DecodeResult<u64> {
        let b = self.span(offset, 8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn test_scalar_widths_big_endian() {
        let cur = PacketCursor::new(DATA);
        assert_eq!(cur.u8_at(0).unwrap(), 0x01);
        assert_eq!(cur.be16_at(0).unwrap(), 0x0102);
        assert_eq!(cur.be24_at(0).unwrap(), 0x010203);
        assert_eq!(cur.be32_at(0).unwrap(), 0x01020304);
        assert_eq!(cur.be48_at(0).unwrap(), 0x010203040506);
        assert_eq!(cur.be64_at(0).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_scalar_widths_little_endian() {
        let cur = PacketCursor::new(DATA);
        assert_eq!(cur.le16_at(0).unwrap(), 0x0201);
        assert_eq!(cur.le24_at(0).unwrap(), 0x030201);
        assert_eq!(cur.le32_at(0).unwrap(), 0x04030201);
        assert_eq!(cur.le48_at(0).unwrap(), 0x060504030201);
        assert_eq!(cur.le64_at(0).unwrap(), 0x0807060504030201);
    }

    #[test]
    fn test_read_at_exact_boundary() {
        let cur = PacketCursor::new(DATA);
        assert_eq!(cur.be32_at(4).unwrap(), 0x05060708);
        assert_eq!(cur.u8_at(7).unwrap(), 0x08);
    }

    #[test]
    fn test_read_past_end_is_truncated() {
        let cur = PacketCursor::new(DATA);
        assert_eq!(cur.be32_at(5), Err(Truncated));
        assert_eq!(cur.u8_at(8), Err(Truncated));
        assert_eq!(cur.be64_at(1), Err(Truncated));
    }

    #[test]
    fn test_partial_field_is_truncated_not_partial() {
        // 3 of 4 bytes present: must be Truncated, never a 3-byte value.
        let cur = PacketCursor::new(&DATA[..3]);
        assert_eq!(cur.be32_at(0), Err(Truncated));
        assert_eq!(cur.be24_at(0).unwrap(), 0x010203);
    }

    #[test]
    fn test_offset_overflow_is_truncated() {
        let cur = PacketCursor::new(DATA);
        assert_eq!(cur.u8_at(usize::MAX), Err(Truncated));
        assert_eq!(cur.span(usize::MAX, 8), Err(Truncated));
        assert!(!cur.ok(usize::MAX, 8));
    }

    #[test]
    fn test_ok_is_pure_bounds_test() {
        let cur = PacketCursor::new(DATA);
        assert!(cur.ok(0, 8));
        assert!(cur.ok(8, 0));
        assert!(!cur.ok(8, 1));
        assert!(!cur.ok(5, 4));
    }

    #[test]
    fn test_copy_into() {
        let cur = PacketCursor::new(DATA);
        let mut buf = [0u8; 4];
        cur.copy_into(&mut buf, 2).unwrap();
        assert_eq!(buf, [0x03, 0x04, 0x05, 0x06]);
        assert_eq!(cur.copy_into(&mut buf, 6), Err(Truncated));
    }

    #[test]
    fn test_empty_capture() {
        let cur = PacketCursor::new(&[]);
        assert_eq!(cur.caplen(), 0);
        assert_eq!(cur.u8_at(0), Err(Truncated));
        assert_eq!(cur.tail(0).unwrap(), &[] as &[u8]);
        assert_eq!(cur.tail(1), Err(Truncated));
    }
}
