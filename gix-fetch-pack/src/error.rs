//! Error types for fetch negotiation

use bstr::BString;
use gix_fetch_core::pktline;

use crate::MultiAckMode;

/// Result type alias for fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// The error returned by [`Fetch::fetch()`](crate::Fetch::fetch()) and its building blocks.
///
/// Any error aborts the negotiation. The connection is left in an undefined state and must be dropped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading from or writing to the remote failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote sent bytes that are not a valid pkt-line
    #[error("Packetline decode error: {0}")]
    PacketlineDecode(#[from] pktline::decode::Error),

    /// The remote broke the protocol in a way that isn't tied to a single line
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A line arrived that is not valid at this point of the conversation
    #[error("Unexpected response from remote: {line:?}")]
    UnexpectedResponse { line: BString },

    /// The remote reported an error, either as `ERR` line or on the sideband error channel
    #[error("Remote error: {message}")]
    Remote { message: BString },

    /// Stateless transports replay their state and can only work with detailed acknowledgements
    #[error("Stateless transports require multi_ack_detailed, but the remote only supports {mode:?}")]
    StatelessRequiresDetailedAcks { mode: MultiAckMode },

    /// The options can't be used for a fetch
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The progress monitor asked to stop
    #[error("The fetch was cancelled")]
    Cancelled,

    /// The pack receiver failed to consume the pack
    #[error("Failed to receive pack: {0}")]
    PackReceive(#[source] std::io::Error),
}

/// The stable category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The transport or the local pack receiver failed.
    Io,
    /// The remote violated the protocol or reported an error itself.
    Protocol,
    /// The options are invalid.
    Config,
    /// The operation was stopped by the caller.
    Cancelled,
}

impl Error {
    /// Create a protocol error with a message
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Return the category of this error.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Io(_) | Self::PackReceive(_) => Kind::Io,
            Self::PacketlineDecode(_)
            | Self::Protocol { .. }
            | Self::UnexpectedResponse { .. }
            | Self::Remote { .. }
            | Self::StatelessRequiresDetailedAcks { .. } => Kind::Protocol,
            Self::Config { .. } => Kind::Config,
            Self::Cancelled => Kind::Cancelled,
        }
    }

    /// Check if retrying the fetch on a new connection might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<pktline::Error> for Error {
    fn from(err: pktline::Error) -> Self {
        match err {
            pktline::Error::Io(err) => Error::Io(err),
            pktline::Error::Decode(err) => Error::PacketlineDecode(err),
            pktline::Error::UnexpectedPacket { kind } => Error::Protocol {
                message: format!("unexpected {kind} packet"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(Error::Cancelled.kind(), Kind::Cancelled);
        assert_eq!(Error::protocol("bad").kind(), Kind::Protocol);
        assert_eq!(
            Error::StatelessRequiresDetailedAcks {
                mode: MultiAckMode::Continue
            }
            .kind(),
            Kind::Protocol
        );
        assert_eq!(Error::Config { message: "x".into() }.kind(), Kind::Config);
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(Error::PackReceive(io).kind(), Kind::Io);
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(Error::Io(std::io::ErrorKind::ConnectionReset.into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(!Error::Remote { message: "nope".into() }.is_retryable());
    }

    #[test]
    fn unexpected_packets_become_protocol_errors() {
        let err: Error = pktline::Error::UnexpectedPacket { kind: "delimiter" }.into();
        assert_eq!(err.to_string(), "Protocol error: unexpected delimiter packet");
    }
}
