//! Bounded caches that outlive a single packet.
//!
//! The only cross-packet state in the decoder: a small ring remembering which
//! ISAKMP initiator cookies were first seen on which flow, so later packets
//! in the exchange can be annotated with an `I`/`R` direction mark. The cache
//! is best-effort and non-authoritative; a stale or evicted entry only costs
//! the cosmetic annotation.

/// Order-sensitive flow identity, derived from the IP source/destination
/// pair. `fwd` hashes (src, dst) and `rev` hashes (dst, src), so a reply
/// packet's `fwd` equals the request packet's `rev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowHash {
    pub fwd: u64,
    pub rev: u64,
}

impl FlowHash {
    /// Build from raw source/destination address bytes (4 or 16 each).
    pub fn from_addrs(src: &[u8], dst: &[u8]) -> Self {
        Self {
            fwd: hash_pair(src, dst),
            rev: hash_pair(dst, src),
        }
    }
}

fn hash_pair(a: &[u8], b: &[u8]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    a.hash(&mut h);
    b.hash(&mut h);
    h.finish()
}

/// Which side of the recorded exchange a packet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Initiator,
    Responder,
}

/// Number of remembered initiator cookies.
const COOKIE_SLOTS: usize = 20;

/// Fixed-capacity, round-robin cookie cache.
///
/// `record` overwrites the oldest slot once all slots are full; lookups scan
/// only written slots, so an unwritten slot is never read.
#[derive(Debug)]
pub struct CookieCache {
    slots: [Option<(u64, u64)>; COOKIE_SLOTS],
    next: usize,
}

impl CookieCache {
    pub fn new() -> Self {
        Self {
            slots: [None; COOKIE_SLOTS],
            next: 0,
        }
    }

    /// Remember `cookie` as first seen on the initiator side of `flow`.
    /// Re-recording a known cookie refreshes its flow in place.
    pub fn record(&mut self, cookie: u64, flow: FlowHash) {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .flatten()
            .find(|(c, _)| *c == cookie)
        {
            slot.1 = flow.fwd;
            return;
        }
        self.slots[self.next] = Some((cookie, flow.fwd));
        self.next = (self.next + 1) % COOKIE_SLOTS;
    }

    /// Direction of a packet carrying `cookie` on `flow`, if the cookie is
    /// still cached and the flow matches either side.
    pub fn direction(&self, cookie: u64, flow: FlowHash) -> Option<Direction> {
        let (_, recorded) = self
            .slots
            .iter()
            .flatten()
            .find(|(c, _)| *c == cookie)?;
        if *recorded == flow.fwd {
            Some(Direction::Initiator)
        } else if *recorded == flow.rev {
            Some(Direction::Responder)
        } else {
            None
        }
    }
}

impl Default for CookieCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(n: u8) -> FlowHash {
        FlowHash::from_addrs(&[n, 0, 0, 1], &[n, 0, 0, 2])
    }

    #[test]
    fn test_direction_marks() {
        let mut cache = CookieCache::new();
        let f = flow(1);
        cache.record(0xdead, f);

        assert_eq!(cache.direction(0xdead, f), Some(Direction::Initiator));

        // The reply travels the reversed flow.
        let reply = FlowHash { fwd: f.rev, rev: f.fwd };
        assert_eq!(cache.direction(0xdead, reply), Some(Direction::Responder));

        assert_eq!(cache.direction(0xbeef, f), None);
        assert_eq!(cache.direction(0xdead, flow(9)), None);
    }

    #[test]
    fn test_round_robin_eviction() {
        let mut cache = CookieCache::new();
        for i in 0..25u64 {
            cache.record(i, flow(i as u8));
        }
        // The 5 oldest cookies were overwritten in insertion order.
        for i in 0..5u64 {
            assert_eq!(cache.direction(i, flow(i as u8)), None);
        }
        for i in 5..25u64 {
            assert_eq!(
                cache.direction(i, flow(i as u8)),
                Some(Direction::Initiator)
            );
        }
    }

    #[test]
    fn test_rerecord_updates_in_place() {
        let mut cache = CookieCache::new();
        cache.record(7, flow(1));
        cache.record(7, flow(2));
        assert_eq!(cache.direction(7, flow(2)), Some(Direction::Initiator));
        assert_eq!(cache.direction(7, flow(1)), None);
    }
}
