//! Marking what we have locally before talking to the remote.

use gix_hash::ObjectId;

use crate::{
    flags::Flags,
    graph::ObjectGraphView,
    walk::{Graph, Walk},
    Ref,
};

/// Commits known to be reachable locally, in the order they were found.
///
/// A commit may appear more than once if it was found to be common after it was first added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReachableList {
    ids: Vec<ObjectId>,
}

impl ReachableList {
    /// Append `id`.
    pub fn push(&mut self, id: ObjectId) {
        self.ids.push(id);
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectId> + '_ {
        self.ids.iter()
    }

    /// The amount of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Return `true` if nothing is reachable.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Flags local commits as reachable or advertised and collects the starting points of the negotiation.
#[derive(Debug, Default, Clone)]
pub struct ReachabilityMarker {
    margin_secs: i64,
    reachable: ReachableList,
}

impl ReachabilityMarker {
    /// Create a marker that walks `margin_secs` past the newest wanted commit time.
    pub fn new(margin_secs: i64) -> Self {
        Self {
            margin_secs,
            reachable: ReachableList::default(),
        }
    }

    /// Flag every advertised object, and its peeled object, that exists locally as `ADVERTISED`.
    pub fn mark_advertised<G: ObjectGraphView>(&mut self, refs: &[Ref], graph: &mut Graph<'_, G>) {
        for reference in refs {
            for id in std::iter::once(reference.object_id).chain(reference.peeled_object_id) {
                let Some(commit_id) = graph.resolve(&id).map(|commit| commit.id) else {
                    continue;
                };
                graph.marks_mut().insert(id, Flags::ADVERTISED);
                graph.marks_mut().insert(commit_id, Flags::ADVERTISED);
            }
        }
    }

    /// Flag the tips of all local references and `haves` as `REACHABLE`.
    ///
    /// With a `max_wanted_time`, walk back from these tips until commits are older than it, and
    /// mark advertised commits on the way as `COMMON` as the remote has them too.
    pub fn mark_reachable<G: ObjectGraphView>(
        &mut self,
        haves: &[ObjectId],
        max_wanted_time: Option<i64>,
        graph: &mut Graph<'_, G>,
    ) {
        let tips: Vec<ObjectId> = graph
            .view()
            .local_refs()
            .iter()
            .map(Ref::peeled_or_object_id)
            .chain(haves.iter().copied())
            .collect();
        for id in &tips {
            self.parse_reachable(*id, graph);
        }

        let Some(max_wanted_time) = max_wanted_time.filter(|time| *time > 0) else {
            return;
        };
        let not_before = max_wanted_time.saturating_sub(self.margin_secs);
        let mut walk = Walk::default();
        for id in self.reachable.iter() {
            if let Some(commit) = graph.resolve(id) {
                walk.push(commit);
            }
        }
        while walk.peek_time().is_some_and(|time| time >= not_before) {
            let Some(id) = walk.pop() else { break };
            let flags = graph.marks().get(&id);
            if flags.contains(Flags::ADVERTISED) && !flags.contains(Flags::COMMON) {
                graph.marks_mut().insert(id, Flags::COMMON);
                self.reachable.push(id);
            }
            walk.expand(&id, graph);
        }
        tracing::debug!(
            reachable = self.reachable.len(),
            not_before,
            "marked reachable commits"
        );
    }

    fn parse_reachable<G: ObjectGraphView>(&mut self, id: ObjectId, graph: &mut Graph<'_, G>) {
        let Some(commit_id) = graph.resolve(&id).map(|commit| commit.id) else {
            tracing::trace!(%id, "ignoring local tip that isn't a commit");
            return;
        };
        if commit_id != id {
            graph.marks_mut().insert(id, Flags::REACHABLE);
        }
        if graph.marks_mut().insert(commit_id, Flags::REACHABLE) {
            self.reachable.push(commit_id);
        }
    }

    /// The commits found so far.
    pub fn reachable(&self) -> &ReachableList {
        &self.reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::InMemory, CommitNode};

    fn id(n: u8) -> ObjectId {
        ObjectId::from_hex(format!("{n:040x}").as_bytes()).unwrap()
    }

    /// A line 1 <- 2 <- ... <- n, with commit k at time k * 10, `refs/heads/main` at n.
    fn line(n: u8) -> InMemory {
        let mut graph = InMemory::new();
        for k in 1..=n {
            let parents: &[ObjectId] = if k == 1 { &[] } else { &[id(k - 1)] };
            graph.insert_commit(CommitNode::new(id(k), i64::from(k) * 10, parents));
        }
        graph.insert_ref(Ref::new("refs/heads/main", id(n)));
        graph
    }

    #[test]
    fn tips_and_haves_are_reachable_once() {
        let view = line(3);
        let mut graph = Graph::new(&view);
        let mut marker = ReachabilityMarker::new(0);
        marker.mark_reachable(&[id(3), id(1), id(99)], None, &mut graph);
        assert_eq!(marker.reachable().iter().copied().collect::<Vec<_>>(), [id(3), id(1)]);
        assert!(!graph.marks().contains(&id(99), Flags::REACHABLE), "unknown objects are skipped");
        assert!(!graph.marks().contains(&id(2), Flags::REACHABLE), "no walk without wanted time");
    }

    #[test]
    fn bounded_walk_finds_advertised_commits() {
        let view = line(5);
        let mut graph = Graph::new(&view);
        let mut marker = ReachabilityMarker::new(0);
        marker.mark_advertised(&[Ref::new("refs/heads/main", id(3))], &mut graph);
        marker.mark_reachable(&[], Some(30), &mut graph);

        assert!(graph.marks().contains(&id(3), Flags::COMMON | Flags::REACHABLE));
        assert!(graph.marks().contains(&id(2), Flags::COMMON), "carried to ancestors");
        assert!(!graph.marks().contains(&id(4), Flags::COMMON));
        assert_eq!(
            marker.reachable().iter().copied().collect::<Vec<_>>(),
            [id(5), id(3)],
            "common commits are added once more"
        );
    }

    #[test]
    fn walk_stops_before_old_commits() {
        let view = line(5);
        let mut graph = Graph::new(&view);
        let mut marker = ReachabilityMarker::new(0);
        marker.mark_advertised(&[Ref::new("refs/heads/other", id(1))], &mut graph);
        marker.mark_reachable(&[], Some(40), &mut graph);
        assert!(
            !graph.marks().contains(&id(1), Flags::COMMON),
            "1 is older than the newest wanted commit"
        );
        assert!(graph.marks().contains(&id(3), Flags::REACHABLE));
    }

    #[test]
    fn unknown_advertised_objects_are_ignored() {
        let view = line(1);
        let mut graph = Graph::new(&view);
        let mut marker = ReachabilityMarker::new(0);
        marker.mark_advertised(&[Ref::new("refs/heads/main", id(42)).with_peeled(id(1))], &mut graph);
        assert!(!graph.marks().contains(&id(42), Flags::ADVERTISED));
        assert!(graph.marks().contains(&id(1), Flags::ADVERTISED));
    }
}
