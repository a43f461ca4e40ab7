//! PCAP and PCAPNG file reader, with optional gzip decompression.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader};

use crate::error::{Error, PcapError as OurPcapError};

/// Read buffer size (64KB).
const BUFFER_SIZE: usize = 65536;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

type Source = BufReader<Box<dyn Read + Send>>;

/// One packet as read from a capture file, with the file-level fields the
/// decode loop needs: the link type picks the first printer, and the
/// captured/original length pair tells it how much of the wire it can trust.
#[derive(Debug, Clone)]
pub struct RawPacket {
    /// Frame number (1-indexed).
    pub frame_number: u64,

    /// Timestamp in microseconds since epoch.
    pub timestamp_us: i64,

    /// Original length on the wire; `data` may hold fewer bytes.
    pub original_length: u32,

    /// Link layer type (e.g. 1 = Ethernet, 101 = raw IP).
    pub link_type: u16,

    /// Captured bytes.
    pub data: Vec<u8>,
}

impl RawPacket {
    /// Captured byte count, sized for slicing and cursor offsets.
    pub fn caplen(&self) -> usize {
        self.data.len()
    }

    /// True when the capture cut the packet short of its on-wire length.
    pub fn is_truncated(&self) -> bool {
        self.caplen() < self.original_length as usize
    }
}

/// Reader yielding [`RawPacket`]s from a capture file.
///
/// The format (legacy pcap vs pcapng, gzipped or not) is detected from the
/// file's magic bytes. The link type comes from the file header (legacy) or
/// the interface description block (pcapng).
pub struct PcapReader {
    inner: ReaderInner,
    frame_number: u64,
    link_type: u16,
}

impl std::fmt::Debug for PcapReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapReader")
            .field(
                "inner",
                match &self.inner {
                    ReaderInner::Legacy(_) => &"Legacy",
                    ReaderInner::Ng(_) => &"Ng",
                },
            )
            .field("frame_number", &self.frame_number)
            .field("link_type", &self.link_type)
            .finish()
    }
}

enum ReaderInner {
    Legacy(LegacyPcapReader<Source>),
    Ng(PcapNGReader<Source>),
}

impl PcapReader {
    /// Open a capture file, decompressing gzip transparently.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let gzipped = is_gzip_file(path)?;
        tracing::debug!(path = %path.display(), gzipped, "opening capture");

        // The magic bytes pick the parser; the stream is reopened afterwards
        // so the parser sees the file from the start.
        let mut magic = [0u8; 4];
        open_source(path, gzipped)?
            .read_exact(&mut magic)
            .map_err(|_| {
                Error::Pcap(OurPcapError::InvalidFormat {
                    reason: "file too short to read magic number".to_string(),
                })
            })?;
        let source = open_source(path, gzipped)?;

        let inner = match &magic {
            // Legacy pcap, either endianness, micro- or nanosecond.
            [0xd4, 0xc3, 0xb2, 0xa1]
            | [0xa1, 0xb2, 0xc3, 0xd4]
            | [0x4d, 0x3c, 0xb2, 0xa1]
            | [0xa1, 0xb2, 0x3c, 0x4d] => {
                ReaderInner::Legacy(LegacyPcapReader::new(BUFFER_SIZE, source).map_err(|e| {
                    Error::Pcap(OurPcapError::InvalidFormat {
                        reason: format!("failed to parse pcap header: {e}"),
                    })
                })?)
            }
            [0x0a, 0x0d, 0x0d, 0x0a] => {
                ReaderInner::Ng(PcapNGReader::new(BUFFER_SIZE, source).map_err(|e| {
                    Error::Pcap(OurPcapError::InvalidFormat {
                        reason: format!("failed to parse pcapng header: {e}"),
                    })
                })?)
            }
            _ => {
                return Err(Error::Pcap(OurPcapError::InvalidFormat {
                    reason: format!("unknown magic number: {magic:02x?}"),
                }))
            }
        };

        Ok(Self {
            inner,
            frame_number: 0,
            link_type: 1, // updated from the file's own header blocks
        })
    }

    /// Link type of the capture.
    pub fn link_type(&self) -> u16 {
        self.link_type
    }

    /// Frames read so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Read the next packet, skipping non-packet blocks.
    pub fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        match self.inner {
            ReaderInner::Legacy(_) => self.next_legacy(),
            ReaderInner::Ng(_) => self.next_ng(),
        }
    }

    fn next_legacy(&mut self) -> Result<Option<RawPacket>, Error> {
        let ReaderInner::Legacy(reader) = &mut self.inner else {
            unreachable!()
        };
        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    match block {
                        PcapBlockOwned::Legacy(packet) => {
                            self.frame_number += 1;
                            let timestamp_us =
                                i64::from(packet.ts_sec) * 1_000_000 + i64::from(packet.ts_usec);
                            let raw = RawPacket {
                                frame_number: self.frame_number,
                                timestamp_us,
                                original_length: packet.origlen,
                                link_type: self.link_type,
                                data: packet.data.to_vec(),
                            };
                            reader.consume(offset);
                            return Ok(Some(raw));
                        }
                        PcapBlockOwned::LegacyHeader(header) => {
                            self.link_type = header.network.0 as u16;
                            reader.consume(offset);
                        }
                        _ => reader.consume(offset),
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader.refill().map_err(|e| {
                        Error::Pcap(OurPcapError::InvalidFormat {
                            reason: format!("refill error: {e}"),
                        })
                    })?;
                }
                Err(e) => {
                    return Err(Error::Pcap(OurPcapError::InvalidFormat {
                        reason: format!("parse error: {e}"),
                    }))
                }
            }
        }
    }

    fn next_ng(&mut self) -> Result<Option<RawPacket>, Error> {
        let ReaderInner::Ng(reader) = &mut self.inner else {
            unreachable!()
        };
        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    use pcap_parser::pcapng::Block;

                    match block {
                        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                            self.link_type = idb.linktype.0 as u16;
                            reader.consume(offset);
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                            self.frame_number += 1;
                            let timestamp_us =
                                (i64::from(epb.ts_high) << 32) | i64::from(epb.ts_low);
                            let raw = RawPacket {
                                frame_number: self.frame_number,
                                timestamp_us,
                                original_length: epb.origlen,
                                link_type: self.link_type,
                                data: epb.data.to_vec(),
                            };
                            reader.consume(offset);
                            return Ok(Some(raw));
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                            self.frame_number += 1;
                            let raw = RawPacket {
                                frame_number: self.frame_number,
                                timestamp_us: 0, // simple packets carry no timestamp
                                original_length: spb.origlen,
                                link_type: self.link_type,
                                data: spb.data.to_vec(),
                            };
                            reader.consume(offset);
                            return Ok(Some(raw));
                        }
                        _ => reader.consume(offset),
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader.refill().map_err(|e| {
                        Error::Pcap(OurPcapError::InvalidFormat {
                            reason: format!("refill error: {e}"),
                        })
                    })?;
                }
                Err(e) => {
                    return Err(Error::Pcap(OurPcapError::InvalidFormat {
                        reason: format!("parse error: {e}"),
                    }))
                }
            }
        }
    }
}

impl Iterator for PcapReader {
    type Item = Result<RawPacket, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

fn open_source(path: &Path, gzipped: bool) -> Result<Source, Error> {
    let file = File::open(path).map_err(|_| {
        Error::Pcap(OurPcapError::FileNotFound {
            path: path.display().to_string(),
        })
    })?;
    let reader: Box<dyn Read + Send> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::with_capacity(BUFFER_SIZE, reader))
}

/// Gzip detection by extension or magic bytes.
fn is_gzip_file(path: &Path) -> Result<bool, Error> {
    if let Some(name) = path.file_name().and_then(|f| f.to_str()) {
        if name.to_lowercase().ends_with(".gz") {
            return Ok(true);
        }
    }

    let mut file = File::open(path).map_err(|_| {
        Error::Pcap(OurPcapError::FileNotFound {
            path: path.display().to_string(),
        })
    })?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == GZIP_MAGIC),
        Err(_) => Ok(false), // too short to be gzipped
    }
}
