//! Demultiplexing of a sideband stream into pack data, progress and errors.

use std::io::{self, BufRead, Read};

use bstr::{BString, ByteSlice};

use crate::{
    pktline::{decode, BandRef, LineReader},
    progress::ProgressMonitor,
};

/// The error carried inside the [`io::Error`] returned by [`SidebandReader`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote sent a message on the error channel.
    #[error("remote error: {message}")]
    Remote {
        /// The message, without trailing newline.
        message: BString,
    },
    /// The progress monitor asked to stop.
    #[error("the operation was cancelled")]
    Cancelled,
    /// A pkt-line could not be decoded.
    #[error("Packetline decode error: {0}")]
    Decode(#[from] decode::Error),
    /// A line did not carry a valid channel tag.
    #[error("invalid sideband line: {0}")]
    Band(#[from] decode::band::Error),
}

/// Why a [`SidebandReader`] stopped delivering data, if it stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Channel 3 delivered this message.
    Remote(BString),
    /// The monitor reported cancellation.
    Cancelled,
}

/// Reads pack data from a sideband stream, forwarding progress to a [`ProgressMonitor`].
///
/// Channel 1 is passed through, channel 2 goes to the monitor and channel 3 fails the read.
/// The stream ends at the next flush packet.
pub struct SidebandReader<'a, R> {
    lines: &'a mut LineReader<R>,
    monitor: &'a mut dyn ProgressMonitor,
    buf: Vec<u8>,
    pos: usize,
    failure: Option<Failure>,
}

impl<'a, R: Read> SidebandReader<'a, R> {
    /// Demultiplex the lines of `lines`.
    pub fn new(lines: &'a mut LineReader<R>, monitor: &'a mut dyn ProgressMonitor) -> Self {
        Self {
            lines,
            monitor,
            buf: Vec::new(),
            pos: 0,
            failure: None,
        }
    }

    /// The reason reading stopped early, if it did.
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    fn fail(&mut self, failure: Failure) -> io::Error {
        let err = match &failure {
            Failure::Remote(message) => Error::Remote {
                message: message.clone(),
            },
            Failure::Cancelled => Error::Cancelled,
        };
        self.failure = Some(failure);
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl<R: Read> BufRead for SidebandReader<'_, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.pos == self.buf.len() {
            if let Some(failure) = self.failure.clone() {
                return Err(self.fail(failure));
            }
            if self.monitor.is_cancelled() {
                return Err(self.fail(Failure::Cancelled));
            }
            let line = match self.lines.read_line() {
                None => return Ok(&[]),
                Some(Err(err)) => return Err(err),
                Some(Ok(Err(err))) => return Err(io::Error::new(io::ErrorKind::InvalidData, Error::Decode(err))),
                Some(Ok(Ok(line))) => line,
            };
            match line.decode_band() {
                Ok(BandRef::Data(data)) => {
                    self.buf.clear();
                    self.buf.extend_from_slice(data);
                    self.pos = 0;
                }
                Ok(BandRef::Progress(text)) => {
                    tracing::trace!(len = text.len(), "sideband progress");
                    self.monitor.on_progress_text(text);
                }
                Ok(BandRef::Error(text)) => {
                    let end = text.iter().rposition(|b| !matches!(*b, b'\r' | b'\n')).map_or(0, |pos| pos + 1);
                    let message = text[..end].as_bstr().to_owned();
                    return Err(self.fail(Failure::Remote(message)));
                }
                Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, Error::Band(err))),
            }
        }
        Ok(&self.buf[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.buf.len());
    }
}

impl<R: Read> Read for SidebandReader<'_, R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = available.len().min(out.len());
        out[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pktline::{write_band, write_flush, SidebandChannel};

    #[derive(Default)]
    struct Recorder {
        progress: Vec<String>,
        cancel: bool,
    }

    impl ProgressMonitor for Recorder {
        fn is_cancelled(&self) -> bool {
            self.cancel
        }

        fn on_progress_text(&mut self, text: &[u8]) {
            self.progress.push(text.to_str_lossy().into_owned());
        }
    }

    fn stream(parts: &[(SidebandChannel, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (channel, data) in parts {
            write_band(*channel, data, &mut out).unwrap();
        }
        write_flush(&mut out).unwrap();
        out
    }

    #[test]
    fn data_passes_through_and_progress_goes_to_the_monitor() {
        let input = stream(&[
            (SidebandChannel::Data, b"PACK"),
            (SidebandChannel::Progress, b"Counting objects: 3\r"),
            (SidebandChannel::Data, b"\x00\x00\x00\x02"),
        ]);
        let mut lines = LineReader::new(input.as_slice());
        let mut monitor = Recorder::default();
        let mut pack = Vec::new();
        SidebandReader::new(&mut lines, &mut monitor).read_to_end(&mut pack).unwrap();
        assert_eq!(pack, b"PACK\x00\x00\x00\x02");
        assert_eq!(monitor.progress, ["Counting objects: 3\r"]);
    }

    #[test]
    fn error_channel_fails_the_read() {
        let input = stream(&[(SidebandChannel::Data, b"PA"), (SidebandChannel::Error, b"fatal: bad object\n")]);
        let mut lines = LineReader::new(input.as_slice());
        let mut monitor = Recorder::default();
        let mut reader = SidebandReader::new(&mut lines, &mut monitor);
        let mut pack = Vec::new();
        let err = reader.read_to_end(&mut pack).unwrap_err();
        assert_eq!(pack, b"PA");
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(reader.failure(), Some(&Failure::Remote("fatal: bad object".into())));
    }

    #[test]
    fn cancellation_is_checked_per_line() {
        let input = stream(&[(SidebandChannel::Data, b"PACK")]);
        let mut lines = LineReader::new(input.as_slice());
        let mut monitor = Recorder {
            cancel: true,
            ..Default::default()
        };
        let mut reader = SidebandReader::new(&mut lines, &mut monitor);
        assert!(reader.read_to_end(&mut Vec::new()).is_err());
        assert_eq!(reader.failure(), Some(&Failure::Cancelled));
    }
}
