//! Printer registry with priority-based selection.

use super::{
    BgpPrinter, DccpPrinter, EthernetPrinter, HncpPrinter, IsakmpPrinter, Ipv4Printer,
    Ipv6Printer, PrintContext, Printed, RsvpPrinter, TcpPrinter, UdpPrinter,
};
use crate::emit::Emitter;
use crate::error::DecodeResult;

/// Core trait all protocol printers implement.
///
/// `print` returns `Err(Truncated)` when the captured bytes ran out; the
/// error unwinds through the layer loop to the single per-packet recovery
/// point. In-bounds malformed structure is reported through the emitter's
/// invalid marker and a normal return with `stop` set.
pub trait Printer: Send + Sync {
    /// Unique identifier for this printer (e.g. "tcp", "isakmp").
    fn name(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Check if this printer can handle the given context.
    /// Returns a priority score (higher = more specific match), or `None`
    /// if this printer cannot handle the context.
    fn can_print(&self, context: &PrintContext) -> Option<u32>;

    /// Decode `data` and append text to `out`.
    fn print<'a>(
        &self,
        data: &'a [u8],
        context: &PrintContext,
        out: &mut Emitter,
    ) -> DecodeResult<Printed<'a>>;
}

/// Enum of all built-in printers.
///
/// Static dispatch: the layer loop runs per packet, and a match compiles
/// tighter than a vtable call.
#[derive(Debug)]
pub enum BuiltinPrinter {
    Ethernet(EthernetPrinter),
    Ipv4(Ipv4Printer),
    Ipv6(Ipv6Printer),
    Tcp(TcpPrinter),
    Udp(UdpPrinter),
    Dccp(DccpPrinter),
    Isakmp(IsakmpPrinter),
    Rsvp(RsvpPrinter),
    Hncp(HncpPrinter),
    Bgp(BgpPrinter),
}

/// Delegate Printer trait methods to inner types.
macro_rules! delegate_printer {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            BuiltinPrinter::Ethernet(p) => p.$method($($arg),*),
            BuiltinPrinter::Ipv4(p) => p.$method($($arg),*),
            BuiltinPrinter::Ipv6(p) => p.$method($($arg),*),
            BuiltinPrinter::Tcp(p) => p.$method($($arg),*),
            BuiltinPrinter::Udp(p) => p.$method($($arg),*),
            BuiltinPrinter::Dccp(p) => p.$method($($arg),*),
            BuiltinPrinter::Isakmp(p) => p.$method($($arg),*),
            BuiltinPrinter::Rsvp(p) => p.$method($($arg),*),
            BuiltinPrinter::Hncp(p) => p.$method($($arg),*),
            BuiltinPrinter::Bgp(p) => p.$method($($arg),*),
        }
    };
}

impl Printer for BuiltinPrinter {
    #[inline]
    fn name(&self) -> &'static str {
        delegate_printer!(self, name)
    }

    #[inline]
    fn display_name(&self) -> &'static str {
        delegate_printer!(self, display_name)
    }

    #[inline]
    fn can_print(&self, context: &PrintContext) -> Option<u32> {
        delegate_printer!(self, can_print, context)
    }

    #[inline]
    fn print<'a>(
        &self,
        data: &'a [u8],
        context: &PrintContext,
        out: &mut Emitter,
    ) -> DecodeResult<Printed<'a>> {
        delegate_printer!(self, print, data, context, out)
    }
}

impl From<EthernetPrinter> for BuiltinPrinter {
    fn from(p: EthernetPrinter) -> Self {
        BuiltinPrinter::Ethernet(p)
    }
}

impl From<Ipv4Printer> for BuiltinPrinter {
    fn from(p: Ipv4Printer) -> Self {
        BuiltinPrinter::Ipv4(p)
    }
}

impl From<Ipv6Printer> for BuiltinPrinter {
    fn from(p: Ipv6Printer) -> Self {
        BuiltinPrinter::Ipv6(p)
    }
}

impl From<TcpPrinter> for BuiltinPrinter {
    fn from(p: TcpPrinter) -> Self {
        BuiltinPrinter::Tcp(p)
    }
}

impl From<UdpPrinter> for BuiltinPrinter {
    fn from(p: UdpPrinter) -> Self {
        BuiltinPrinter::Udp(p)
    }
}

impl From<DccpPrinter> for BuiltinPrinter {
    fn from(p: DccpPrinter) -> Self {
        BuiltinPrinter::Dccp(p)
    }
}

impl From<IsakmpPrinter> for BuiltinPrinter {
    fn from(p: IsakmpPrinter) -> Self {
        BuiltinPrinter::Isakmp(p)
    }
}

impl From<RsvpPrinter> for BuiltinPrinter {
    fn from(p: RsvpPrinter) -> Self {
        BuiltinPrinter::Rsvp(p)
    }
}

impl From<HncpPrinter> for BuiltinPrinter {
    fn from(p: HncpPrinter) -> Self {
        BuiltinPrinter::Hncp(p)
    }
}

impl From<BgpPrinter> for BuiltinPrinter {
    fn from(p: BgpPrinter) -> Self {
        BuiltinPrinter::Bgp(p)
    }
}

/// Registry of printers with priority-based selection.
pub struct PrinterRegistry {
    printers: Vec<BuiltinPrinter>,
}

impl PrinterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            printers: Vec::new(),
        }
    }

    /// Register a printer.
    pub fn register<P: Into<BuiltinPrinter>>(&mut self, printer: P) {
        self.printers.push(printer.into());
    }

    /// Find the best printer for the given context.
    #[inline]
    pub fn find_printer(&self, context: &PrintContext) -> Option<&BuiltinPrinter> {
        self.printers
            .iter()
            .filter_map(|p| p.can_print(context).map(|priority| (p, priority)))
            .max_by_key(|(_, priority)| *priority)
            .map(|(printer, _)| printer)
    }

    /// All registered printers.
    pub fn all_printers(&self) -> impl Iterator<Item = &BuiltinPrinter> {
        self.printers.iter()
    }

    /// Get a printer by name.
    pub fn get_printer(&self, name: &str) -> Option<&BuiltinPrinter> {
        self.printers.iter().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }
}

impl Default for PrinterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
