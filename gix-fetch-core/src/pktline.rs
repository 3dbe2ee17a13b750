//! pkt-line re-exports and helpers for client usage.

use std::io::{self, Read, Write};

use gix_packetline_blocking as pkt;

pub use pkt::{decode, BandRef, Channel as SidebandChannel, PacketLineRef, StreamingPeekableIter as PktIter};

/// The error returned when reading pkt-lines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying reader failed, which includes hitting the end of the stream.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The bytes on the wire are not a valid pkt-line.
    #[error("Packetline decode error: {0}")]
    Decode(#[from] decode::Error),
    /// A delimiter or response-end packet showed up, which protocol v0 and v1 never send.
    #[error("unexpected {kind} packet")]
    UnexpectedPacket {
        /// The kind of packet that was received.
        kind: &'static str,
    },
}

/// Write `text` as a data packet, appending the newline the protocol expects.
pub fn write_text_line(text: impl AsRef<[u8]>, mut out: impl Write) -> io::Result<usize> {
    let text = text.as_ref();
    let mut line = Vec::with_capacity(text.len() + 1);
    line.extend_from_slice(text);
    line.push(b'\n');
    pkt::encode::data_to_write(&line, &mut out)
}

/// Write a flush packet.
pub fn write_flush(mut out: impl Write) -> io::Result<usize> {
    pkt::encode::flush_to_write(&mut out)
}

/// Write `data` into `channel` of a sideband stream.
pub fn write_band(channel: SidebandChannel, data: &[u8], mut out: impl Write) -> io::Result<usize> {
    pkt::encode::band_to_write(channel, data, &mut out)
}

/// Reads pkt-lines one at a time and stops at flush packets.
///
/// The reader never consumes more bytes than the line it returns, so whatever follows
/// the last line, for instance a raw pack, stays readable from [`into_inner()`](Self::into_inner).
pub struct LineReader<R> {
    lines: PktIter<R>,
}

impl<R: Read> LineReader<R> {
    /// Create a reader over `read`.
    pub fn new(read: R) -> Self {
        Self {
            lines: PktIter::new(read, &[PacketLineRef::Flush], false),
        }
    }

    /// Read the next line as returned by the underlying [`PktIter`].
    ///
    /// `None` means a flush packet was read; call [`reset()`](Self::reset) to read past it.
    pub fn read_line(&mut self) -> Option<io::Result<Result<PacketLineRef<'_>, decode::Error>>> {
        self.lines.read_line()
    }

    /// Read the next data line, or `None` if a flush packet was read instead.
    pub fn read_data_line(&mut self) -> Result<Option<&[u8]>, Error> {
        match self.lines.read_line() {
            None => Ok(None),
            Some(Err(err)) => Err(Error::Io(err)),
            Some(Ok(Err(err))) => Err(Error::Decode(err)),
            Some(Ok(Ok(line))) => match line {
                PacketLineRef::Data(data) => Ok(Some(data)),
                PacketLineRef::Flush => Ok(None),
                PacketLineRef::Delimiter => Err(Error::UnexpectedPacket { kind: "delimiter" }),
                PacketLineRef::ResponseEnd => Err(Error::UnexpectedPacket { kind: "response-end" }),
            },
        }
    }

    /// Continue reading after a flush packet.
    pub fn reset(&mut self) {
        self.lines.reset();
    }

    /// Get the underlying reader back.
    pub fn into_inner(self) -> R {
        self.lines.into_inner()
    }
}
