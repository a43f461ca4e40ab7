//! Token tables: numeric protocol codes to display names.
//!
//! Every printer carries static tables mapping wire values to names. Lookups
//! never fail: an unmatched value renders through a fallback that keeps the
//! numeric value visible. Tables also drive control flow (payload-type
//! dispatch) where a match arm would be unwieldy.

use std::borrow::Cow;

/// A static value-to-name table.
///
/// Entries need not be sorted; lookup is a linear scan (tables are small and
/// lookups happen once per printed field).
#[derive(Debug, Clone, Copy)]
pub struct Tokens(pub &'static [(u32, &'static str)]);

impl Tokens {
    /// Exact lookup.
    pub fn find(&self, value: u32) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, name)| *name)
    }

    /// Lookup with the standard `unknown-<value>` fallback. Never fails.
    pub fn get(&self, value: u32) -> Cow<'static, str> {
        match self.find(value) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("unknown-{value}")),
        }
    }

    /// Lookup with a caller-supplied fallback prefix, rendering unmatched
    /// values as `<prefix><value>` (e.g. `opt-77`).
    pub fn get_or(&self, prefix: &str, value: u32) -> Cow<'static, str> {
        match self.find(value) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("{prefix}{value}")),
        }
    }

    /// Decompose `value` into OR'd flag names joined by `|`.
    ///
    /// Bits with no table entry are collected into a trailing hex residue;
    /// a zero value renders as `none`.
    pub fn flags(&self, value: u32) -> String {
        if value == 0 {
            return "none".to_string();
        }
        let mut out = String::new();
        let mut residue = value;
        for (bit, name) in self.0 {
            if *bit != 0 && value & *bit == *bit {
                if !out.is_empty() {
                    out.push('|');
                }
                out.push_str(name);
                residue &= !*bit;
            }
        }
        if residue != 0 {
            if !out.is_empty() {
                out.push('|');
            }
            out.push_str(&format!("{residue:#x}"));
        }
        out
    }
}

/// Selects one of several token tables by key range, for fields whose meaning
/// depends on a preceding field's value. Entries are `(lo, hi, table)` with
/// inclusive bounds, scanned in order.
#[derive(Debug, Clone, Copy)]
pub struct TokenGroups(pub &'static [(u32, u32, Tokens)]);

impl TokenGroups {
    /// Table for `key`, if any range covers it.
    pub fn table(&self, key: u32) -> Option<&Tokens> {
        self.0
            .iter()
            .find(|(lo, hi, _)| (*lo..=*hi).contains(&key))
            .map(|(_, _, t)| t)
    }

    /// Two-level lookup: pick the table by `key`, then resolve `value` with
    /// the standard fallback. A key outside every range also falls back.
    pub fn get(&self, key: u32, value: u32) -> Cow<'static, str> {
        match self.table(key) {
            Some(table) => table.get(value),
            None => Cow::Owned(format!("unknown-{value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: Tokens = Tokens(&[(1, "red"), (2, "green"), (3, "blue")]);
    const FLAGS: Tokens = Tokens(&[(0x01, "syn"), (0x02, "ack"), (0x08, "push")]);

    #[test]
    fn test_lookup_hit() {
        assert_eq!(COLORS.get(2), "green");
        assert_eq!(COLORS.find(3), Some("blue"));
    }

    #[test]
    fn test_lookup_fallback_verbatim() {
        assert_eq!(COLORS.get(999), "unknown-999");
        assert_eq!(COLORS.get_or("color#", 7), "color#7");
        assert_eq!(COLORS.find(0), None);
    }

    #[test]
    fn test_lookup_is_idempotent() {
        assert_eq!(COLORS.get(999), COLORS.get(999));
        assert_eq!(COLORS.get(1), COLORS.get(1));
    }

    #[test]
    fn test_flags_decomposition() {
        assert_eq!(FLAGS.flags(0x03), "syn|ack");
        assert_eq!(FLAGS.flags(0x08), "push");
        assert_eq!(FLAGS.flags(0), "none");
    }

    #[test]
    fn test_flags_residue() {
        assert_eq!(FLAGS.flags(0x41), "syn|0x40");
        assert_eq!(FLAGS.flags(0x40), "0x40");
    }

    #[test]
    fn test_token_groups() {
        const LOW: Tokens = Tokens(&[(1, "lo-one")]);
        const HIGH: Tokens = Tokens(&[(1, "hi-one")]);
        const GROUPS: TokenGroups = TokenGroups(&[(0, 9, LOW), (10, 19, HIGH)]);

        assert_eq!(GROUPS.get(5, 1), "lo-one");
        assert_eq!(GROUPS.get(12, 1), "hi-one");
        assert_eq!(GROUPS.get(12, 2), "unknown-2");
        assert_eq!(GROUPS.get(50, 1), "unknown-1");
        assert!(GROUPS.table(50).is_none());
    }
}
