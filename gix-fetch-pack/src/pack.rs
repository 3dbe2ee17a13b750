//! Handing the pack that follows a negotiation to its consumer.

use std::io::{self, BufRead, BufReader, Read};

use gix_fetch_core::{
    pktline::LineReader,
    progress::ProgressMonitor,
    sideband::{Failure, SidebandReader},
};

use crate::{Error, Result, SideBandMode};

/// Consumes a pack stream, for instance by indexing it into an object database.
pub trait PackReceiver {
    /// What the receiver returns once the pack is stored, like a lock keeping it from being collected.
    type Lock;

    /// Read the whole pack from `pack`.
    fn consume(&mut self, pack: &mut dyn BufRead) -> io::Result<Self::Lock>;
}

impl<T: PackReceiver + ?Sized> PackReceiver for &mut T {
    type Lock = T::Lock;

    fn consume(&mut self, pack: &mut dyn BufRead) -> io::Result<Self::Lock> {
        (**self).consume(pack)
    }
}

/// Feed the pack that follows the negotiation on `lines` to `receiver`.
///
/// With a sideband, progress goes to `monitor`, and whatever follows the pack up to the final
/// flush packet is drained. Without one, the rest of the stream is the pack.
pub(crate) fn receive<R, P>(
    mut lines: LineReader<R>,
    side_band: SideBandMode,
    monitor: &mut dyn ProgressMonitor,
    receiver: &mut P,
) -> Result<P::Lock>
where
    R: Read,
    P: PackReceiver + ?Sized,
{
    if monitor.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if side_band == SideBandMode::None {
        tracing::debug!("receiving pack without sideband");
        let mut pack = BufReader::new(lines.into_inner());
        return receiver.consume(&mut pack).map_err(Error::PackReceive);
    }

    tracing::debug!(?side_band, "receiving pack");
    let mut pack = SidebandReader::new(&mut lines, monitor);
    let consumed = receiver
        .consume(&mut pack)
        .and_then(|lock| io::copy(&mut pack, &mut io::sink()).map(|_| lock));
    match (consumed, pack.failure()) {
        (_, Some(Failure::Remote(message))) => Err(Error::Remote {
            message: message.clone(),
        }),
        (_, Some(Failure::Cancelled)) => Err(Error::Cancelled),
        (Ok(lock), None) => Ok(lock),
        (Err(err), None) => Err(Error::PackReceive(err)),
    }
}
