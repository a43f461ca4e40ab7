//! Ethernet link-layer printer.

use smallvec::SmallVec;

use super::{PrintContext, Printed, Printer};
use crate::buf::PacketCursor;
use crate::emit::Emitter;
use crate::error::DecodeResult;
use crate::token::Tokens;

/// Ethernet header length (no VLAN tag).
const HEADER_LEN: usize = 14;

/// Well-known ethertype values.
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
}

const ETHERTYPE_NAMES: Tokens = Tokens(&[
    (ethertype::IPV4 as u32, "IPv4"),
    (ethertype::ARP as u32, "ARP"),
    (ethertype::VLAN as u32, "802.1Q"),
    (ethertype::IPV6 as u32, "IPv6"),
]);

fn format_mac(b: &[u8]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5]
    )
}

/// Ethernet printer.
#[derive(Debug, Clone, Copy)]
pub struct EthernetPrinter;

impl Printer for EthernetPrinter {
    fn name(&self) -> &'static str {
        "ether"
    }

    fn display_name(&self) -> &'static str {
        "Ethernet"
    }

    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        if context.is_root() && context.link_type == 1 {
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

        let dst = cur.span(0, 6)?;
        let src = cur.span(6, 6)?;
        let mut ethertype = cur.be16_at(12)?;
        let mut header_len = HEADER_LEN;

        // Single 802.1Q tag: print the VLAN id and dispatch on the inner type.
        let mut vlan = None;
        if ethertype == ethertype::VLAN {
            let tci = cur.be16_at(14)?;
            vlan = Some(tci & 0x0fff);
            ethertype = cur.be16_at(16)?;
            header_len += 4;
        }

        // The link header is noise at the default verbosity.
        if out.verbose() {
            crate::emit!(
                out,
                "{} > {}",
                format_mac(src),
                format_mac(dst)
            );
            if let Some(id) = vlan {
                crate::emit!(out, ", vlan {id}");
            }
            crate::emit!(
                out,
                ", ethertype {} ({:#06x}), length {}",
                ETHERTYPE_NAMES.get(u32::from(ethertype)),
                ethertype,
                context.on_wire_len
            );
        }

        let mut hints = SmallVec::new();
        hints.push(("ethertype", u64::from(ethertype)));

        Ok(Printed::next(&data[header_len..], hints))
    }
}
