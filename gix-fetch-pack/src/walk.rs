//! Commit-time ordered traversal with explicit flag propagation.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
};

use gix_hash::{oid, ObjectId};

use crate::{
    flags::{Flags, Marks},
    graph::ObjectGraphView,
    CommitNode,
};

/// An [`ObjectGraphView`] with a cache of resolved commits and the [`Marks`] of one session.
pub struct Graph<'a, G> {
    view: &'a G,
    lookups: HashMap<ObjectId, Option<ObjectId>>,
    commits: HashMap<ObjectId, CommitNode>,
    marks: Marks,
}

impl<'a, G: ObjectGraphView> Graph<'a, G> {
    /// Wrap `view`, with nothing marked yet.
    pub fn new(view: &'a G) -> Self {
        Self {
            view,
            lookups: HashMap::new(),
            commits: HashMap::new(),
            marks: Marks::default(),
        }
    }

    /// The wrapped view.
    pub fn view(&self) -> &'a G {
        self.view
    }

    /// Resolve `id` to a commit once, and answer further requests from the cache.
    pub fn resolve(&mut self, id: &oid) -> Option<&CommitNode> {
        let commit_id = match self.lookups.get(id).copied() {
            Some(known) => known,
            None => {
                let resolved = self.view.resolve_commit(id);
                let commit_id = resolved.as_ref().map(|commit| commit.id);
                self.lookups.insert(id.to_owned(), commit_id);
                if let Some(commit) = resolved {
                    self.commits.entry(commit.id).or_insert(commit);
                }
                commit_id
            }
        }?;
        self.commits.get(&commit_id)
    }

    /// The flags of all commits touched so far.
    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    /// Mutable access to the flags.
    pub fn marks_mut(&mut self) -> &mut Marks {
        &mut self.marks
    }

    /// Add `flags` to all ancestors of `id` that were resolved already.
    ///
    /// Propagation stops at commits that have all of `flags`.
    pub(crate) fn carry(&mut self, id: &oid, flags: Flags) {
        if flags.is_empty() {
            return;
        }
        let mut stack: Vec<ObjectId> = self.resolved_parents(id).collect();
        while let Some(parent) = stack.pop() {
            if self.marks.contains(&parent, flags) {
                continue;
            }
            self.marks.insert(parent, flags);
            stack.extend(self.resolved_parents(&parent));
        }
    }

    fn resolved_parents(&self, id: &oid) -> impl Iterator<Item = ObjectId> + '_ {
        self.commits
            .get(id)
            .into_iter()
            .flat_map(|commit| commit.parents.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    time: i64,
    order: Reverse<u64>,
    id: ObjectId,
}

/// A queue producing commits newest first, and in insertion order among equal commit times.
///
/// Every commit is queued at most once.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    queue: BinaryHeap<Entry>,
    seq: u64,
    seen: HashSet<ObjectId>,
}

impl Walk {
    /// Queue `commit` unless it was queued before.
    pub(crate) fn push(&mut self, commit: &CommitNode) -> bool {
        if !self.seen.insert(commit.id) {
            return false;
        }
        self.queue.push(Entry {
            time: commit.commit_time,
            order: Reverse(self.seq),
            id: commit.id,
        });
        self.seq += 1;
        true
    }

    pub(crate) fn peek_time(&self) -> Option<i64> {
        self.queue.peek().map(|entry| entry.time)
    }

    pub(crate) fn pop(&mut self) -> Option<ObjectId> {
        self.queue.pop().map(|entry| entry.id)
    }

    /// Queue the parents of the popped commit `id` and carry its flags to them.
    pub(crate) fn expand<G: ObjectGraphView>(&mut self, id: &oid, graph: &mut Graph<'_, G>) {
        let parents = match graph.commits.get(id) {
            Some(commit) => commit.parents.clone(),
            None => return,
        };
        for parent in &parents {
            if let Some(commit) = graph.resolve(parent) {
                self.push(commit);
            }
        }
        let carried = graph.marks.get(id) & Flags::CARRY;
        graph.carry(id, carried);
    }
}
