#![allow(dead_code)]

use std::{
    cell::Cell,
    io::{self, BufRead, Write},
};

use gix_fetch_core::pktline::{write_band, write_flush, write_text_line, SidebandChannel};
use gix_fetch_pack::{graph::InMemory, CommitNode, PackReceiver, ProgressMonitor, Ref};
use gix_hash::ObjectId;

pub const PACK: &[u8] = b"PACK\x00\x00\x00\x02\x00\x00\x00\x00";

pub fn id(n: u32) -> ObjectId {
    ObjectId::from_hex(format!("{n:040x}").as_bytes()).unwrap()
}

/// Add commits `ids` as a line, each the parent of the next, with times from `time_of`.
/// A reference called `name` points at the last one.
pub fn chain(graph: &mut InMemory, name: &str, ids: impl IntoIterator<Item = u32>, time_of: impl Fn(u32) -> i64) {
    let mut parent: Option<ObjectId> = None;
    for n in ids {
        let parents: Vec<ObjectId> = parent.into_iter().collect();
        graph.insert_commit(CommitNode::new(id(n), time_of(n), &parents));
        parent = Some(id(n));
    }
    if let Some(tip) = parent {
        graph.insert_ref(Ref::new(name, tip));
    }
}

/// Scripted responses of a remote.
#[derive(Default)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn line(mut self, text: impl AsRef<[u8]>) -> Self {
        write_text_line(text, &mut self.0).unwrap();
        self
    }

    pub fn nak(self) -> Self {
        self.line("NAK")
    }

    pub fn naks(mut self, count: usize) -> Self {
        for _ in 0..count {
            self = self.nak();
        }
        self
    }

    pub fn ack(self, n: u32, status: &str) -> Self {
        if status.is_empty() {
            self.line(format!("ACK {}", id(n)))
        } else {
            self.line(format!("ACK {} {status}", id(n)))
        }
    }

    pub fn band(mut self, channel: SidebandChannel, data: &[u8]) -> Self {
        write_band(channel, data, &mut self.0).unwrap();
        self
    }

    pub fn flush(mut self) -> Self {
        write_flush(&mut self.0).unwrap();
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

/// Decode pkt-lines written by the client, without trailing newlines, with flush packets as `0000`.
pub fn transcript(mut bytes: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let len = usize::from_str_radix(std::str::from_utf8(&bytes[..4]).unwrap(), 16).unwrap();
        if len == 0 {
            out.push("0000".to_string());
            bytes = &bytes[4..];
            continue;
        }
        let text = std::str::from_utf8(&bytes[4..len]).unwrap();
        out.push(text.trim_end_matches('\n').to_string());
        bytes = &bytes[len..];
    }
    out
}

pub fn count_haves(lines: &[String]) -> usize {
    lines.iter().filter(|line| line.starts_with("have ")).count()
}

/// Keeps each flushed part of the output as one request.
#[derive(Default)]
pub struct Requests {
    pub sent: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl Write for Requests {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.current.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.current.is_empty() {
            self.sent.push(std::mem::take(&mut self.current));
        }
        Ok(())
    }
}

/// Collects the pack into memory.
pub struct Collect;

impl PackReceiver for Collect {
    type Lock = Vec<u8>;

    fn consume(&mut self, pack: &mut dyn BufRead) -> io::Result<Self::Lock> {
        let mut buf = Vec::new();
        pack.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Records progress and cancels once asked more than `limit` times.
pub struct Monitor {
    pub progress: Vec<String>,
    asked: Cell<usize>,
    limit: usize,
}

impl Monitor {
    pub fn new() -> Self {
        Self::cancel_after(usize::MAX)
    }

    pub fn cancel_after(limit: usize) -> Self {
        Monitor {
            progress: Vec::new(),
            asked: Cell::new(0),
            limit,
        }
    }
}

impl ProgressMonitor for Monitor {
    fn is_cancelled(&self) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.asked.get() > self.limit
    }

    fn on_progress_text(&mut self, text: &[u8]) {
        self.progress.push(String::from_utf8_lossy(text).into_owned());
    }
}
