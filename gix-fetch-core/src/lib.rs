//! gix-fetch-core: Shared client-side protocol primitives for gitoxide fetch negotiation.
//!
//! This crate provides the small, reusable building blocks used by `gix-fetch-pack`:
//! pkt-line reading and writing, the sideband demultiplexer, the progress and
//! cancellation hooks and the capability token list as advertised by a remote.
//!
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod capabilities;
pub mod interrupt;
pub mod pktline;
pub mod progress;
pub mod protocol;
pub mod sideband;
