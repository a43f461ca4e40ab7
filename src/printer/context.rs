//! Print context and per-layer result types.

use smallvec::SmallVec;

use crate::cache::FlowHash;

/// Hint entry for child printer selection: (hint_name, value).
pub type HintEntry = (&'static str, u64);

/// Context passed down the layer chain.
#[derive(Debug, Clone)]
pub struct PrintContext {
    /// Link type from the capture header (e.g. 1 = Ethernet).
    pub link_type: u16,

    /// Printer that identified this layer.
    pub parent: Option<&'static str>,

    /// Hints from the parent layer (ethertype, IP protocol number, ports).
    /// Linear scan; typically 2-4 entries.
    pub hints: SmallVec<[HintEntry; 4]>,

    /// Byte offset of this layer's data in the original packet.
    pub offset: usize,

    /// On-wire length the capture header claimed for the whole packet.
    /// Untrusted; reads are bounded by the captured data alone.
    pub on_wire_len: usize,

    /// Flow identity set by the IP printers, consumed by ISAKMP's cookie
    /// cache for direction annotation.
    pub flow: Option<FlowHash>,
}

impl PrintContext {
    pub fn new(link_type: u16, on_wire_len: usize) -> Self {
        Self {
            link_type,
            parent: None,
            hints: SmallVec::new(),
            offset: 0,
            on_wire_len,
            flow: None,
        }
    }

    /// Get a hint value by key.
    #[inline]
    pub fn hint(&self, key: &str) -> Option<u64> {
        self.hints.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// Append a hint value.
    #[inline]
    pub fn insert_hint(&mut self, key: &'static str, value: u64) {
        self.hints.push((key, value));
    }

    /// True at the outermost layer (nothing printed above this one).
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Result of printing one protocol layer.
#[derive(Debug, Clone)]
pub struct Printed<'a> {
    /// Unconsumed bytes (payload for the next layer).
    pub remaining: &'a [u8],

    /// Hints for child printer selection.
    pub child_hints: SmallVec<[HintEntry; 4]>,

    /// Flow identity to propagate, if this layer established one.
    pub flow: Option<FlowHash>,

    /// True when the chain must not descend further (fragment payloads,
    /// structures this layer already fully decoded, invalid structure).
    pub stop: bool,
}

impl<'a> Printed<'a> {
    /// Continue the chain with `remaining` bytes and these hints.
    pub fn next(remaining: &'a [u8], child_hints: SmallVec<[HintEntry; 4]>) -> Self {
        Self {
            remaining,
            child_hints,
            flow: None,
            stop: false,
        }
    }

    /// This layer was the last one worth decoding.
    pub fn last() -> Self {
        Self {
            remaining: &[],
            child_hints: SmallVec::new(),
            flow: None,
            stop: true,
        }
    }

    pub fn with_flow(mut self, flow: FlowHash) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Get a child hint value by name.
    pub fn hint(&self, name: &str) -> Option<u64> {
        self.child_hints
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
    }
}
