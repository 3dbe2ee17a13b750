//! Connection types shared by the fetch client.

/// How requests reach the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// A persistent bidirectional stream, like SSH or `git://`.
    Stateful,
    /// Independent request/response round trips, like smart HTTP.
    StatelessRpc,
}

impl ConnectionMode {
    /// Return `true` for [`ConnectionMode::StatelessRpc`].
    pub fn is_stateless(self) -> bool {
        matches!(self, ConnectionMode::StatelessRpc)
    }
}

/// The two halves of a connection to the remote, owned by exactly one fetch.
///
/// In [`ConnectionMode::StatelessRpc`], calling `flush()` on `output` completes the current
/// request, and its response becomes readable from `input`. In [`ConnectionMode::Stateful`]
/// mode `flush()` only pushes buffered bytes to the peer.
pub struct Connection<R, W> {
    /// Bytes sent by the remote.
    pub input: R,
    /// Bytes sent to the remote.
    pub output: W,
    /// Whether the transport keeps state between round trips.
    pub mode: ConnectionMode,
}

impl<R, W> Connection<R, W> {
    /// A connection over a persistent stream.
    pub fn stateful(input: R, output: W) -> Self {
        Self {
            input,
            output,
            mode: ConnectionMode::Stateful,
        }
    }

    /// A connection where each flush of `output` is one request.
    pub fn stateless_rpc(input: R, output: W) -> Self {
        Self {
            input,
            output,
            mode: ConnectionMode::StatelessRpc,
        }
    }
}
