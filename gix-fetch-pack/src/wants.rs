//! The `want` block opening every fetch request.

use std::{collections::HashSet, io::Write};

use gix_fetch_core::pktline::{write_flush, write_text_line};
use gix_hash::ObjectId;

use crate::{
    flags::{Flags, Marks},
    graph::ObjectGraphView,
    walk::Graph,
    Ref,
};

/// The newest commit time among the `wanted` objects we happen to have locally.
pub fn max_wanted_time<G: ObjectGraphView>(graph: &mut Graph<'_, G>, wanted: &[Ref]) -> Option<i64> {
    wanted
        .iter()
        .filter_map(|reference| graph.resolve(&reference.object_id).map(|commit| commit.commit_time))
        .max()
}

/// Write one `want` line for each object in `wanted` that isn't known to be reachable, followed by a flush.
///
/// The first line carries `capabilities`. Nothing is written if nothing is wanted.
/// Return the ids that were written, without duplicates.
pub fn write_wants(
    wanted: &[Ref],
    marks: &Marks,
    capabilities: &str,
    mut out: impl Write,
) -> std::io::Result<Vec<ObjectId>> {
    let mut written = Vec::new();
    let mut seen = HashSet::new();
    for reference in wanted {
        let id = reference.object_id;
        if marks.contains(&id, Flags::REACHABLE) {
            tracing::trace!(%id, name = %reference.name, "already have wanted object");
            continue;
        }
        if !seen.insert(id) {
            continue;
        }
        if written.is_empty() && !capabilities.is_empty() {
            write_text_line(format!("want {id} {capabilities}"), &mut out)?;
        } else {
            write_text_line(format!("want {id}"), &mut out)?;
        }
        written.push(id);
    }
    if !written.is_empty() {
        write_flush(&mut out)?;
    }
    Ok(written)
}
