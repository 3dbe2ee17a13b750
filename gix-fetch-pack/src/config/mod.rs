//! Configuration of a fetch negotiation

use crate::{Error, Result};

/// The amount of `have` lines sent before a flush packet asks the remote for a result.
pub const BLOCK_SIZE: usize = 32;

/// The amount of `have` lines sent without progress before the client gives up and sends `done`.
pub const MAX_HAVES: usize = 256;

/// Options controlling which capabilities are requested and how haves are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Ask for a thin pack if the remote supports it
    pub thin_pack: bool,

    /// Accept offset deltas if the remote supports them
    pub ofs_delta: bool,

    /// Ask for annotated tags pointing into the pack
    pub include_tag: bool,

    /// Use a sideband if the remote supports one, preferring `side-band-64k`
    pub side_band: bool,

    /// Whether progress messages are wanted. If not, `no-progress` is requested.
    pub progress: bool,

    /// The `agent=` value to announce, if the remote announces its own
    pub agent: Option<String>,

    /// Skip `done` once the remote said it is ready, on stateless connections with detailed acks
    pub no_done: bool,

    /// `have` lines per flush
    pub block_size: usize,

    /// `have` lines to send without a new common commit before giving up
    pub max_haves: usize,

    /// Send the second block of haves before reading the result of the first one on stateful connections
    pub pipeline_first_block: bool,

    /// Seconds subtracted from the newest wanted commit time when marking reachable commits
    pub walk_margin_secs: i64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            thin_pack: true,
            ofs_delta: true,
            include_tag: true,
            side_band: true,
            progress: true,
            agent: Some(format!("git/gitoxide-{}", crate::VERSION)),
            no_done: true,
            block_size: BLOCK_SIZE,
            max_haves: MAX_HAVES,
            pipeline_first_block: true,
            walk_margin_secs: 0,
        }
    }
}

impl Options {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Request thin packs
    pub fn with_thin_pack(mut self, thin_pack: bool) -> Self {
        self.thin_pack = thin_pack;
        self
    }

    /// Accept offset deltas
    pub fn with_ofs_delta(mut self, ofs_delta: bool) -> Self {
        self.ofs_delta = ofs_delta;
        self
    }

    /// Request tags pointing into the pack
    pub fn with_include_tag(mut self, include_tag: bool) -> Self {
        self.include_tag = include_tag;
        self
    }

    /// Use a sideband
    pub fn with_side_band(mut self, side_band: bool) -> Self {
        self.side_band = side_band;
        self
    }

    /// Receive progress messages
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Set the agent string, or `None` to not announce one
    pub fn with_agent(mut self, agent: Option<impl Into<String>>) -> Self {
        self.agent = agent.map(Into::into);
        self
    }

    /// Use `no-done` where possible
    pub fn with_no_done(mut self, no_done: bool) -> Self {
        self.no_done = no_done;
        self
    }

    /// Set the amount of haves per flush
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the give-up threshold
    pub fn with_max_haves(mut self, max_haves: usize) -> Self {
        self.max_haves = max_haves;
        self
    }

    /// Pipeline the first block on stateful connections
    pub fn with_pipeline_first_block(mut self, pipeline: bool) -> Self {
        self.pipeline_first_block = pipeline;
        self
    }

    /// Set the clock skew tolerance of the reachability walk
    pub fn with_walk_margin_secs(mut self, margin: i64) -> Self {
        self.walk_margin_secs = margin;
        self
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::Config {
                message: "Block size cannot be zero".to_string(),
            });
        }

        if self.max_haves == 0 {
            return Err(Error::Config {
                message: "The maximum amount of haves cannot be zero".to_string(),
            });
        }

        if self.walk_margin_secs < 0 {
            return Err(Error::Config {
                message: "The walk margin cannot be negative".to_string(),
            });
        }

        if let Some(agent) = &self.agent {
            if agent.is_empty() || agent.bytes().any(|b| b.is_ascii_whitespace()) {
                return Err(Error::Config {
                    message: format!("Agent {agent:?} must be non-empty and free of whitespace"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = Options::default();
        assert_eq!(options.block_size, 32);
        assert_eq!(options.max_haves, 256);
        assert!(options.agent.as_deref().is_some_and(|agent| agent.starts_with("git/gitoxide-")));
        options.validate().unwrap();
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            Options::new().with_block_size(0).validate(),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            Options::new().with_max_haves(0).validate(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn agent_must_be_a_single_token() {
        assert!(Options::new().with_agent(Some("my agent")).validate().is_err());
        Options::new().with_agent(None::<String>).validate().unwrap();
    }
}
