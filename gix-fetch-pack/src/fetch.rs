//! One fetch, from the want block to the received pack.

use std::io::{Read, Write};

use gix_fetch_core::{pktline::LineReader, progress::ProgressMonitor, protocol::Connection};
use gix_hash::ObjectId;

use crate::{
    advertisement::Advertisement,
    capabilities,
    config::Options,
    graph::ObjectGraphView,
    negotiation::{Negotiation, Statistics},
    pack::{self, PackReceiver},
    reachability::ReachabilityMarker,
    walk::Graph,
    wants, Error, MultiAckMode, Ref, Result,
};

/// The result of [`Fetch::fetch()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<L> {
    /// Everything wanted exists locally already, nothing was sent.
    NoChange,
    /// A pack was received.
    Pack {
        /// What the [`PackReceiver`] returned.
        lock: L,
        /// How the negotiation went.
        statistics: Statistics,
    },
}

/// Fetches from a remote whose references were advertised into a local graph.
pub struct Fetch<'a, G> {
    graph: &'a G,
    advertisement: &'a Advertisement,
    options: Options,
    multi_ack: MultiAckMode,
}

impl<'a, G: ObjectGraphView> Fetch<'a, G> {
    /// Prepare fetching from the remote that sent `advertisement`.
    pub fn new(graph: &'a G, advertisement: &'a Advertisement, options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Fetch {
            graph,
            advertisement,
            options,
            multi_ack: MultiAckMode::Off,
        })
    }

    /// The options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The acknowledgement mode agreed on by the last call to [`fetch()`](Self::fetch()).
    pub fn did_use_multi_ack(&self) -> MultiAckMode {
        self.multi_ack
    }

    /// Fetch `wanted`, telling the remote about the local references and `have`.
    ///
    /// `connection` is used up by this call, whatever the outcome.
    pub fn fetch<R, W, P>(
        &mut self,
        connection: Connection<R, W>,
        wanted: &[Ref],
        have: &[ObjectId],
        monitor: &mut dyn ProgressMonitor,
        receiver: &mut P,
    ) -> Result<Outcome<P::Lock>>
    where
        R: Read,
        W: Write,
        P: PackReceiver + ?Sized,
    {
        let Connection {
            input,
            mut output,
            mode,
        } = connection;
        if monitor.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let enabled = capabilities::negotiate(&self.advertisement.capabilities, &self.options, mode)?;
        self.multi_ack = enabled.multi_ack;

        let mut graph = Graph::new(self.graph);
        let mut marker = ReachabilityMarker::new(self.options.walk_margin_secs);
        marker.mark_advertised(&self.advertisement.refs, &mut graph);
        let max_wanted_time = wants::max_wanted_time(&mut graph, wanted);
        marker.mark_reachable(have, max_wanted_time, &mut graph);

        let mut want_block = Vec::new();
        let written = wants::write_wants(wanted, graph.marks(), &enabled.to_string(), &mut want_block)?;
        if written.is_empty() {
            tracing::debug!(wanted = wanted.len(), "all wanted objects exist locally");
            return Ok(Outcome::NoChange);
        }
        tracing::debug!(wants = written.len(), ?mode, "sending wants");

        let replay = if mode.is_stateless() {
            Some(want_block)
        } else {
            output.write_all(&want_block)?;
            output.flush()?;
            None
        };
        let mut lines = LineReader::new(input);
        let mut negotiation = Negotiation::new(&self.options, &enabled, marker.reachable(), replay, &mut graph);
        let statistics = negotiation.run(&mut graph, &mut lines, &mut output, monitor)?;
        drop(output);

        let lock = pack::receive(lines, enabled.side_band, monitor, receiver)?;
        Ok(Outcome::Pack { lock, statistics })
    }
}
