//! Choosing the capabilities to request from what the remote advertised.

use std::fmt;

use gix_fetch_core::{capabilities::Capabilities, protocol::ConnectionMode};

use crate::{config::Options, Error, MultiAckMode, Result, SideBandMode};

/// The capabilities both sides agreed on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Enabled {
    /// How the remote acknowledges common commits.
    pub multi_ack: MultiAckMode,
    /// Skip `done` after `ACK <id> ready`.
    pub no_done: bool,
    /// The pack may reference objects it doesn't contain.
    pub thin_pack: bool,
    /// How pack data and progress are multiplexed.
    pub side_band: SideBandMode,
    /// The pack may contain offset deltas.
    pub ofs_delta: bool,
    /// Annotated tags pointing into the pack are sent along.
    pub include_tag: bool,
    /// The remote is asked not to send progress.
    pub no_progress: bool,
    /// The agent announced to the remote.
    pub agent: Option<String>,
}

/// Enable each capability that `options` want and `remote` advertises.
///
/// Fails if `mode` is stateless and the remote can't do `multi_ack_detailed`, as nothing could
/// be negotiated then.
pub fn negotiate(remote: &Capabilities, options: &Options, mode: ConnectionMode) -> Result<Enabled> {
    let multi_ack = if remote.contains("multi_ack_detailed") {
        MultiAckMode::Detailed
    } else if remote.contains("multi_ack") {
        MultiAckMode::Continue
    } else {
        MultiAckMode::Off
    };
    if mode.is_stateless() && multi_ack != MultiAckMode::Detailed {
        return Err(Error::StatelessRequiresDetailedAcks { mode: multi_ack });
    }

    let side_band = if !options.side_band {
        SideBandMode::None
    } else if remote.contains("side-band-64k") {
        SideBandMode::SideBand64k
    } else if remote.contains("side-band") {
        SideBandMode::Basic
    } else {
        SideBandMode::None
    };

    let enabled = Enabled {
        multi_ack,
        no_done: mode.is_stateless()
            && multi_ack == MultiAckMode::Detailed
            && options.no_done
            && remote.contains("no-done"),
        thin_pack: options.thin_pack && remote.contains("thin-pack"),
        side_band,
        ofs_delta: options.ofs_delta && remote.contains("ofs-delta"),
        include_tag: options.include_tag && remote.contains("include-tag"),
        no_progress: !options.progress && remote.contains("no-progress"),
        agent: options.agent.clone().filter(|_| remote.contains("agent")),
    };
    tracing::debug!(capabilities = %enabled, "negotiated capabilities");
    Ok(enabled)
}

impl fmt::Display for Enabled {
    /// The space separated tokens to send with the first `want` line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.no_done, "no-done"),
            (self.thin_pack, "thin-pack"),
        ];
        let more = [
            (self.ofs_delta, "ofs-delta"),
            (self.include_tag, "include-tag"),
            (self.no_progress, "no-progress"),
        ];
        let tokens = self
            .multi_ack
            .as_capability()
            .into_iter()
            .chain(flags.iter().filter(|(on, _)| *on).map(|(_, name)| *name))
            .chain(self.side_band.as_capability())
            .chain(more.iter().filter(|(on, _)| *on).map(|(_, name)| *name));

        let mut first = true;
        for token in tokens {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(token)?;
            first = false;
        }
        if let Some(agent) = &self.agent {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "agent={agent}")?;
        }
        Ok(())
    }
}
