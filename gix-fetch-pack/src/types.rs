//! Common types used throughout the fetch negotiation

use bstr::BString;
use gix_hash::ObjectId;
use smallvec::SmallVec;

use crate::{Error, Result};

/// A reference as advertised by the remote or known locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// The full name, like `refs/heads/main`.
    pub name: BString,
    /// The object the reference points to.
    pub object_id: ObjectId,
    /// The object an annotated tag ultimately points to, if `object_id` is a tag.
    pub peeled_object_id: Option<ObjectId>,
}

impl Ref {
    /// A reference pointing directly at `object_id`.
    pub fn new(name: impl Into<BString>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            peeled_object_id: None,
        }
    }

    /// Set the peeled object.
    pub fn with_peeled(mut self, peeled: ObjectId) -> Self {
        self.peeled_object_id = Some(peeled);
        self
    }

    /// The peeled object if known, or the object pointed to otherwise.
    pub fn peeled_or_object_id(&self) -> ObjectId {
        self.peeled_object_id.unwrap_or(self.object_id)
    }
}

/// A commit as seen by the negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    /// The id of the commit.
    pub id: ObjectId,
    /// The committer time in seconds since the epoch.
    pub commit_time: i64,
    /// The ids of all parents, in order.
    pub parents: SmallVec<[ObjectId; 2]>,
}

impl CommitNode {
    /// Create a commit with `parents`.
    pub fn new(id: ObjectId, commit_time: i64, parents: &[ObjectId]) -> Self {
        Self {
            id,
            commit_time,
            parents: SmallVec::from_slice(parents),
        }
    }
}

/// Multi-ack modes for negotiation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MultiAckMode {
    /// No multi-ack support, the remote only acknowledges once
    #[default]
    Off,
    /// `multi_ack`, acknowledgements carry `continue`
    Continue,
    /// `multi_ack_detailed`, acknowledgements carry `common` or `ready`
    Detailed,
}

impl MultiAckMode {
    /// The capability token requesting this mode.
    pub fn as_capability(&self) -> Option<&'static str> {
        match self {
            Self::Off => None,
            Self::Continue => Some("multi_ack"),
            Self::Detailed => Some("multi_ack_detailed"),
        }
    }
}

/// Side-band modes for multiplexed communication
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SideBandMode {
    /// No side-band, the pack follows the negotiation directly
    #[default]
    None,
    /// Basic side-band (up to 1000 bytes)
    Basic,
    /// Side-band 64k (up to 65520 bytes)
    SideBand64k,
}

impl SideBandMode {
    /// The capability token requesting this mode.
    pub fn as_capability(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Basic => Some("side-band"),
            Self::SideBand64k => Some("side-band-64k"),
        }
    }
}

/// A response of the remote to a block of `have` lines, or to `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// `NAK`, nothing new is common.
    Nak,
    /// `ACK <id>`, the final acknowledgement.
    Ack(ObjectId),
    /// `ACK <id> continue`, the object is common and negotiation goes on.
    Continue(ObjectId),
    /// `ACK <id> common`, the object is common and negotiation goes on.
    Common(ObjectId),
    /// `ACK <id> ready`, the remote could produce a pack now.
    Ready(ObjectId),
}

impl Acknowledgement {
    /// Parse a single response line, with or without trailing newline.
    ///
    /// An `ERR` line is returned as [`Error::Remote`].
    pub fn from_line(line: &[u8]) -> Result<Self> {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        if let Some(message) = line.strip_prefix(b"ERR ") {
            return Err(Error::Remote {
                message: message.into(),
            });
        }
        if line == b"NAK" {
            return Ok(Self::Nak);
        }
        let unexpected = || Error::UnexpectedResponse { line: line.into() };
        let rest = line.strip_prefix(b"ACK ").ok_or_else(unexpected)?;
        let mut tokens = rest.splitn(2, |b| *b == b' ');
        let id = tokens
            .next()
            .and_then(|hex| ObjectId::from_hex(hex).ok())
            .ok_or_else(unexpected)?;
        Ok(match tokens.next() {
            None => Self::Ack(id),
            Some(b"continue") => Self::Continue(id),
            Some(b"common") => Self::Common(id),
            Some(b"ready") => Self::Ready(id),
            Some(_) => return Err(unexpected()),
        })
    }
}
