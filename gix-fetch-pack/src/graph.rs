//! The view onto the local object database the negotiator needs.

use std::collections::HashMap;

use gix_hash::{oid, ObjectId};

use crate::{CommitNode, Ref};

/// Read-only access to local commits and references.
///
/// Implementations must be consistent for the duration of a fetch.
pub trait ObjectGraphView {
    /// Resolve `id` to a commit, peeling annotated tags.
    ///
    /// Return `None` if the object doesn't exist locally or doesn't lead to a commit.
    fn resolve_commit(&self, id: &oid) -> Option<CommitNode>;

    /// All local references, with peeled ids where known.
    fn local_refs(&self) -> Vec<Ref>;
}

impl<T: ObjectGraphView + ?Sized> ObjectGraphView for &T {
    fn resolve_commit(&self, id: &oid) -> Option<CommitNode> {
        (**self).resolve_commit(id)
    }

    fn local_refs(&self) -> Vec<Ref> {
        (**self).local_refs()
    }
}

/// A graph held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemory {
    commits: HashMap<ObjectId, CommitNode>,
    tags: HashMap<ObjectId, ObjectId>,
    refs: Vec<Ref>,
}

impl InMemory {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `commit`, replacing a previous one with the same id.
    pub fn insert_commit(&mut self, commit: CommitNode) -> &mut Self {
        self.commits.insert(commit.id, commit);
        self
    }

    /// Add an annotated tag `id` pointing at `target`.
    pub fn insert_tag(&mut self, id: ObjectId, target: ObjectId) -> &mut Self {
        self.tags.insert(id, target);
        self
    }

    /// Add a local reference.
    pub fn insert_ref(&mut self, reference: Ref) -> &mut Self {
        self.refs.push(reference);
        self
    }

    /// The amount of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Return `true` if there are no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

impl ObjectGraphView for InMemory {
    fn resolve_commit(&self, id: &oid) -> Option<CommitNode> {
        let mut id = id.to_owned();
        // tag chains are short, cycles are broken after a fixed amount of hops
        for _ in 0..=self.tags.len() {
            if let Some(commit) = self.commits.get(&id) {
                return Some(commit.clone());
            }
            id = *self.tags.get(&id)?;
        }
        None
    }

    fn local_refs(&self) -> Vec<Ref> {
        self.refs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ObjectId {
        ObjectId::from_hex(format!("{n:040x}").as_bytes()).unwrap()
    }

    #[test]
    fn tags_are_peeled() {
        let mut graph = InMemory::new();
        graph
            .insert_commit(CommitNode::new(id(1), 10, &[]))
            .insert_tag(id(2), id(1))
            .insert_tag(id(3), id(2));
        assert_eq!(graph.resolve_commit(&id(3)).map(|c| c.id), Some(id(1)));
        assert_eq!(graph.resolve_commit(&id(4)), None);
    }

    #[test]
    fn tag_cycles_end() {
        let mut graph = InMemory::new();
        graph.insert_tag(id(1), id(2)).insert_tag(id(2), id(1));
        assert_eq!(graph.resolve_commit(&id(1)), None);
    }
}
