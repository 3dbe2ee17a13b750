//! The exchange of `have` lines and acknowledgements that finds common commits.

use std::{
    collections::HashSet,
    io::{Read, Write},
};

use bstr::ByteSlice;
use gix_fetch_core::{
    pktline::{write_flush, write_text_line, LineReader},
    progress::ProgressMonitor,
};
use gix_hash::ObjectId;

use crate::{
    capabilities::Enabled,
    config::Options,
    flags::Flags,
    graph::ObjectGraphView,
    reachability::ReachableList,
    walk::{Graph, Walk},
    Acknowledgement, Error, MultiAckMode, Result,
};

/// Where a negotiation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Writing `have` lines.
    SendHaves,
    /// Reading the result of a block of haves.
    AwaitResult,
    /// `done` was sent.
    DoneSent,
    /// Reading the remaining results before the pack.
    AwaitFinal,
    /// The remote is about to send the pack.
    Complete,
    /// An error ended the negotiation.
    Aborted,
}

/// What happened during a negotiation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// The amount of `have` lines sent, not counting those replayed on stateless connections.
    pub haves_sent: usize,
    /// The amount of flushed blocks of haves.
    pub rounds: usize,
    /// The amount of `ACK` lines received.
    pub acks: usize,
    /// Whether `done` was sent.
    pub done_sent: bool,
    /// The multi-ack mode agreed on with the remote.
    pub multi_ack: MultiAckMode,
}

pub(crate) struct Negotiation {
    walk: Walk,
    /// Advertised commits marked common before the remote heard of them, so they are still sent once.
    unannounced: HashSet<ObjectId>,
    multi_ack: MultiAckMode,
    stateless: bool,
    no_done: bool,
    block_size: usize,
    max_haves: usize,
    pipeline_first_block: bool,
    /// What every stateless request starts with.
    replay: Vec<u8>,
    /// The bytes of the request being assembled.
    request: Vec<u8>,
    results_pending: usize,
    haves_since_last_continue: usize,
    received_ack: bool,
    received_continue: bool,
    received_ready: bool,
    state: State,
    stats: Statistics,
}

impl Negotiation {
    /// Prepare a negotiation starting at `reachable`.
    ///
    /// `replay` is the want block on stateless connections, and `None` on stateful ones.
    pub(crate) fn new<G: ObjectGraphView>(
        options: &Options,
        enabled: &Enabled,
        reachable: &ReachableList,
        replay: Option<Vec<u8>>,
        graph: &mut Graph<'_, G>,
    ) -> Self {
        let mut walk = Walk::default();
        let mut unannounced = HashSet::new();
        for id in reachable.iter() {
            if graph.marks().contains(id, Flags::ADVERTISED | Flags::COMMON) {
                unannounced.insert(*id);
            }
            if let Some(commit) = graph.resolve(id) {
                walk.push(commit);
            }
        }
        let stateless = replay.is_some();
        let replay = replay.unwrap_or_default();
        Negotiation {
            walk,
            unannounced,
            multi_ack: enabled.multi_ack,
            stateless,
            no_done: enabled.no_done,
            block_size: options.block_size,
            max_haves: options.max_haves,
            pipeline_first_block: options.pipeline_first_block,
            request: replay.clone(),
            replay,
            results_pending: 0,
            haves_since_last_continue: 0,
            received_ack: false,
            received_continue: false,
            received_ready: false,
            state: State::SendHaves,
            stats: Statistics {
                multi_ack: enabled.multi_ack,
                ..Default::default()
            },
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    /// Negotiate until the remote is ready to send a pack.
    pub(crate) fn run<G, R, W>(
        &mut self,
        graph: &mut Graph<'_, G>,
        lines: &mut LineReader<R>,
        out: &mut W,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<Statistics>
    where
        G: ObjectGraphView,
        R: Read,
        W: Write,
    {
        match self.negotiate(graph, lines, out, monitor) {
            Ok(()) => {
                self.state = State::Complete;
                tracing::debug!(
                    haves = self.stats.haves_sent,
                    rounds = self.stats.rounds,
                    acks = self.stats.acks,
                    "negotiation complete"
                );
                Ok(self.stats)
            }
            Err(err) => {
                tracing::debug!(state = ?self.state, %err, "negotiation aborted");
                self.state = State::Aborted;
                Err(err)
            }
        }
    }

    fn negotiate<G, R, W>(
        &mut self,
        graph: &mut Graph<'_, G>,
        lines: &mut LineReader<R>,
        out: &mut W,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<()>
    where
        G: ObjectGraphView,
        R: Read,
        W: Write,
    {
        'send_haves: loop {
            if !self.received_continue && self.stats.haves_sent >= self.max_haves {
                tracing::debug!(haves = self.stats.haves_sent, "no common commits found, giving up");
                break;
            }
            let Some(id) = self.next_have(graph) else {
                break;
            };
            write_text_line(format!("have {id}"), &mut self.request)?;
            tracing::trace!(%id, "have");
            self.stats.haves_sent += 1;
            self.haves_since_last_continue += 1;
            if self.stats.haves_sent % self.block_size != 0 {
                continue;
            }

            write_flush(&mut self.request)?;
            self.send(out)?;
            self.results_pending += 1;
            self.stats.rounds += 1;
            check_cancelled(monitor)?;

            if self.pipeline_first_block && !self.stateless && self.stats.haves_sent == self.block_size {
                // stay a block ahead of the remote
                continue;
            }

            self.state = State::AwaitResult;
            loop {
                let ack = read_ack(lines)?;
                check_cancelled(monitor)?;
                match ack {
                    Acknowledgement::Nak => {
                        self.results_pending = self.results_pending.saturating_sub(1);
                        break;
                    }
                    Acknowledgement::Ack(id) => {
                        tracing::debug!(%id, "remote found a common base");
                        self.stats.acks += 1;
                        self.multi_ack = MultiAckMode::Off;
                        self.results_pending = 0;
                        self.received_ack = true;
                        if self.stateless {
                            self.request.extend_from_slice(&self.replay);
                        }
                        break 'send_haves;
                    }
                    Acknowledgement::Continue(id) | Acknowledgement::Common(id) | Acknowledgement::Ready(id) => {
                        if self.multi_ack == MultiAckMode::Off {
                            return Err(Error::UnexpectedResponse {
                                line: format!("ACK {id} without multi_ack").into(),
                            });
                        }
                        self.stats.acks += 1;
                        self.mark_common(id, &ack, graph)?;
                        self.received_ack = true;
                        self.received_continue = true;
                        self.haves_since_last_continue = 0;
                        if matches!(ack, Acknowledgement::Ready(_)) {
                            self.received_ready = true;
                        }
                    }
                }
            }
            self.state = State::SendHaves;

            if self.no_done && self.received_ready {
                break;
            }
            if self.stateless {
                self.request.extend_from_slice(&self.replay);
            }
            if self.received_continue && self.haves_since_last_continue > self.max_haves {
                tracing::debug!(
                    since_last_common = self.haves_since_last_continue,
                    "histories diverged, giving up"
                );
                break;
            }
        }

        check_cancelled(monitor)?;
        if !(self.no_done && self.received_ready) {
            write_text_line("done", &mut self.request)?;
            self.send(out)?;
            self.stats.done_sent = true;
            self.state = State::DoneSent;
            tracing::debug!(haves = self.stats.haves_sent, "sent done");
        }
        if !self.received_ack {
            // the remote answers `done` itself if it never acknowledged anything
            self.multi_ack = MultiAckMode::Off;
            self.results_pending += 1;
        }

        self.state = State::AwaitFinal;
        while self.results_pending > 0 || self.multi_ack != MultiAckMode::Off {
            let ack = read_ack(lines)?;
            check_cancelled(monitor)?;
            self.results_pending = self.results_pending.saturating_sub(1);
            match ack {
                Acknowledgement::Nak => {}
                Acknowledgement::Ack(_) => {
                    self.stats.acks += 1;
                    break;
                }
                Acknowledgement::Continue(_) | Acknowledgement::Common(_) | Acknowledgement::Ready(_) => {
                    self.stats.acks += 1;
                    self.multi_ack = MultiAckMode::Continue;
                }
            }
        }
        Ok(())
    }

    /// Pop commits until one is found that the remote doesn't know we have.
    fn next_have<G: ObjectGraphView>(&mut self, graph: &mut Graph<'_, G>) -> Option<ObjectId> {
        while let Some(id) = self.walk.pop() {
            let flags = graph.marks().get(&id);
            let remote_knows = flags.contains(Flags::COMMON) && !self.unannounced.remove(&id);
            if flags.contains(Flags::ADVERTISED) {
                graph.marks_mut().insert(id, Flags::COMMON);
            }
            self.walk.expand(&id, graph);
            if !remote_knows {
                return Some(id);
            }
        }
        None
    }

    fn mark_common<G: ObjectGraphView>(
        &mut self,
        id: ObjectId,
        ack: &Acknowledgement,
        graph: &mut Graph<'_, G>,
    ) -> Result<()> {
        if self.stateless && matches!(ack, Acknowledgement::Common(_)) && !graph.marks().contains(&id, Flags::STATE) {
            write_text_line(format!("have {id}"), &mut self.replay)?;
            graph.marks_mut().insert(id, Flags::STATE);
        }
        if !graph.marks().get(&id).intersects(Flags::REACHABLE | Flags::ADVERTISED) {
            graph.marks_mut().insert(id, Flags::ADVERTISED);
        }
        graph.marks_mut().insert(id, Flags::COMMON);
        graph.carry(&id, Flags::COMMON);
        self.unannounced.remove(&id);
        tracing::trace!(%id, "common");
        Ok(())
    }

    fn send<W: Write>(&mut self, out: &mut W) -> Result<()> {
        out.write_all(&self.request)?;
        out.flush()?;
        self.request.clear();
        Ok(())
    }
}

fn read_ack<R: Read>(lines: &mut LineReader<R>) -> Result<Acknowledgement> {
    match lines.read_data_line()? {
        Some(line) => {
            tracing::trace!(line = ?line.as_bstr(), "received");
            Acknowledgement::from_line(line)
        }
        None => Err(Error::protocol("expected ACK or NAK, got a flush packet")),
    }
}

fn check_cancelled(monitor: &dyn ProgressMonitor) -> Result<()> {
    if monitor.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
