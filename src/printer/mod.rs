//! Per-protocol printers and the layer-chaining loop.
//!
//! This module provides:
//! - [`Printer`] trait for implementing printers
//! - [`PrinterRegistry`] for priority-based printer selection
//! - Built-in printers for the supported protocols
//! - [`print_packet`], the per-packet driver holding the single truncation
//!   recovery point
//!
//! ## Supported protocols
//!
//! | Layer | Printers |
//! |-------|----------|
//! | Link | Ethernet |
//! | Network | IPv4, IPv6 (with extension-header chain) |
//! | Transport | TCP, UDP, DCCP |
//! | Application | ISAKMP, RSVP, HNCP, BGP |

mod context;
mod registry;

// Printer implementations
mod bgp;
mod dccp;
mod ethernet;
mod hncp;
mod ipv4;
mod ipv6;
mod isakmp;
mod rsvp;
mod tcp;
mod udp;

pub use context::{HintEntry, PrintContext, Printed};
pub use registry::{BuiltinPrinter, Printer, PrinterRegistry};

pub use bgp::BgpPrinter;
pub use dccp::DccpPrinter;
pub use ethernet::EthernetPrinter;
pub use hncp::HncpPrinter;
pub use ipv4::Ipv4Printer;
pub use ipv6::Ipv6Printer;
pub use isakmp::IsakmpPrinter;
pub use rsvp::RsvpPrinter;
pub use tcp::TcpPrinter;
pub use udp::UdpPrinter;

// Re-export protocol constants used by tests and the CLI
pub use ethernet::ethertype;
pub use ipv6::next_header;

use crate::emit::Emitter;

/// Create a registry with all built-in printers.
pub fn default_registry() -> PrinterRegistry {
    let mut registry = PrinterRegistry::new();

    // Layer 2
    registry.register(EthernetPrinter);

    // Layer 3
    registry.register(Ipv4Printer);
    registry.register(Ipv6Printer);

    // Layer 4
    registry.register(TcpPrinter);
    registry.register(UdpPrinter);
    registry.register(DccpPrinter);

    // Application layer
    registry.register(IsakmpPrinter::new());
    registry.register(RsvpPrinter);
    registry.register(HncpPrinter);
    registry.register(BgpPrinter);

    registry
}

/// Decode one packet through all recognized layers, appending text to `out`.
///
/// This is the truncation recovery point: when any read below runs past the
/// captured bytes, the `Truncated` error unwinds to here, the `[|proto]`
/// marker is emitted, and the rest of the packet is abandoned. A malformed
/// or truncated packet never affects any other packet.
pub fn print_packet(
    registry: &PrinterRegistry,
    link_type: u16,
    data: &[u8],
    on_wire_len: usize,
    out: &mut Emitter,
) {
    let mut context = PrintContext::new(link_type, on_wire_len);
    let mut remaining = data;
    let mut printed_any = false;

    while !remaining.is_empty() {
        let Some(printer) = registry.find_printer(&context) else {
            break;
        };

        if printed_any {
            out.str(": ");
        }
        let before = out.as_str().len();

        match printer.print(remaining, &context, out) {
            Ok(printed) => {
                printed_any |= out.as_str().len() > before;

                if let Some(flow) = printed.flow {
                    context.flow = Some(flow);
                }
                context.parent = Some(printer.name());
                context.offset += remaining.len() - printed.remaining.len();

                // A printer that consumed nothing cannot be re-dispatched
                // with the same context without looping.
                let no_progress = printed.remaining.len() == remaining.len();

                context.hints = printed.child_hints;
                remaining = printed.remaining;

                if printed.stop || no_progress {
                    break;
                }
            }
            Err(_) => {
                out.truncated(printer.name());
                break;
            }
        }
    }
}
