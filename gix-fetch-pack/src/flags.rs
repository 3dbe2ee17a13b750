//! Per-session marks on commits, kept apart from the graph.

use std::collections::HashMap;

use gix_hash::{oid, ObjectId};

bitflags::bitflags! {
    /// What the negotiation knows about a commit.
    ///
    /// Flags are only ever added during a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// The commit is known locally to be reachable from what we have.
        const REACHABLE = 1 << 0;
        /// The commit is reachable from a reference the remote advertised.
        const ADVERTISED = 1 << 1;
        /// Both sides have the commit.
        const COMMON = 1 << 2;
        /// The commit was added to the replay buffer of a stateless connection.
        const STATE = 1 << 3;

        /// The flags copied from a commit to its parents while walking.
        const CARRY = Self::REACHABLE.bits() | Self::ADVERTISED.bits() | Self::COMMON.bits();
    }
}

/// The side table holding [`Flags`] for every commit the session touched.
#[derive(Debug, Default, Clone)]
pub struct Marks {
    table: HashMap<ObjectId, Flags>,
}

impl Marks {
    /// The flags of `id`, empty if it was never marked.
    pub fn get(&self, id: &oid) -> Flags {
        self.table.get(id).copied().unwrap_or(Flags::empty())
    }

    /// Return `true` if `id` has all of `flags`.
    pub fn contains(&self, id: &oid, flags: Flags) -> bool {
        self.get(id).contains(flags)
    }

    /// Add `flags` to `id` and return `true` if any of them was new.
    pub fn insert(&mut self, id: ObjectId, flags: Flags) -> bool {
        if flags.is_empty() {
            return false;
        }
        let current = self.table.entry(id).or_insert(Flags::empty());
        let added = !current.contains(flags);
        current.insert(flags);
        added
    }

    /// The amount of marked objects.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Return `true` if nothing was marked yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
