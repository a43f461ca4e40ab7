//! pktdump CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pktdump::cli::Args;
use pktdump::emit::Emitter;
use pktdump::pcap::PcapReader;
use pktdump::printer::{default_registry, print_packet, Printer};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    if args.list_printers {
        list_printers();
        return Ok(());
    }

    let file = args
        .file
        .context("capture file required. Use --help for usage.")?;

    let mut reader = PcapReader::open(&file)
        .with_context(|| format!("failed to open capture file: {}", file.display()))?;

    let registry = default_registry();
    let mut decoded: u64 = 0;

    while let Some(packet) = reader.next_packet()? {
        let mut line = String::new();

        if !args.no_timestamp {
            let secs = packet.timestamp_us / 1_000_000;
            let micros = packet.timestamp_us % 1_000_000;
            line.push_str(&format!("{secs}.{micros:06} "));
        }

        let mut out = Emitter::new(args.verbose);
        print_packet(
            &registry,
            packet.link_type,
            &packet.data,
            packet.original_length as usize,
            &mut out,
        );
        let text = out.finish();

        if text.is_empty() {
            tracing::debug!(
                frame = packet.frame_number,
                link_type = packet.link_type,
                "no printer matched"
            );
            line.push_str(&format!(
                "linktype {} length {}",
                packet.link_type, packet.original_length
            ));
        } else {
            line.push_str(&text);
        }

        println!("{line}");

        decoded += 1;
        if args.count.is_some_and(|limit| decoded >= limit) {
            break;
        }
    }

    tracing::info!(frames = reader.frame_count(), "done");
    Ok(())
}

fn list_printers() {
    let registry = default_registry();

    println!("Registered printers:");
    for printer in registry.all_printers() {
        println!("  {} ({})", printer.display_name(), printer.name());
    }
}
