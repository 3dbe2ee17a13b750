//! Client side fetch negotiation for the git pack protocol, versions 0 and 1.
//!
//! Given the references a remote advertised and a view onto the local commit graph, this crate
//! decides which objects to ask for, finds the commits both sides have by exchanging `have`
//! lines and acknowledgements, and passes the pack the remote sends to a [`PackReceiver`].
//!
//! # Features
//!
//! - `multi_ack` and `multi_ack_detailed` negotiation, with a fallback for remotes without either
//! - Stateful and stateless RPC connections, the latter replaying their state with every request
//! - `side-band` and `side-band-64k` demultiplexing with progress and cancellation
//! - `thin-pack`, `ofs-delta`, `include-tag`, `no-progress`, `no-done` and `agent`
//!
//! # Example Usage
//!
//! ```no_run
//! use gix_fetch_pack::{graph::InMemory, Advertisement, Connection, Fetch, Options, Outcome, PackReceiver};
//! use gix_fetch_core::progress::Discard;
//! use std::io::BufRead;
//! # fn connect() -> (std::net::TcpStream, std::net::TcpStream) { unimplemented!() }
//!
//! struct Store;
//!
//! impl PackReceiver for Store {
//!     type Lock = ();
//!
//!     fn consume(&mut self, pack: &mut dyn BufRead) -> std::io::Result<()> {
//!         std::io::copy(pack, &mut std::io::sink()).map(|_| ())
//!     }
//! }
//!
//! let (mut input, output) = connect();
//! let advertisement = Advertisement::parse(&mut input)?;
//! let local = InMemory::new();
//! let wanted = advertisement.refs.clone();
//!
//! let mut fetch = Fetch::new(&local, &advertisement, Options::default())?;
//! match fetch.fetch(Connection::stateful(input, output), &wanted, &[], &mut Discard, &mut Store)? {
//!     Outcome::NoChange => {}
//!     Outcome::Pack { statistics, .. } => println!("sent {} haves", statistics.haves_sent),
//! }
//! # Ok::<(), gix_fetch_pack::Error>(())
//! ```

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod advertisement;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod flags;
pub mod graph;
pub mod negotiation;
pub mod pack;
pub mod reachability;
pub mod walk;
pub mod wants;

mod fetch;
mod types;

pub use advertisement::Advertisement;
pub use config::Options;
pub use error::{Error, Kind, Result};
pub use fetch::{Fetch, Outcome};
pub use gix_fetch_core::{
    capabilities::Capabilities,
    interrupt::CancellationFlag,
    progress::ProgressMonitor,
    protocol::{Connection, ConnectionMode},
};
pub use graph::ObjectGraphView;
pub use pack::PackReceiver;
pub use types::*;

/// The version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
