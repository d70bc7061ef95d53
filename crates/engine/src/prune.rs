// TraceLens - Execution Trace Visualizer
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Dependency pruning.
//!
//! After every visibility change, an event whose data dependencies are no
//! longer on screen is dropped - unless something still on screen depends on
//! it in turn. One pass per recomputation, evaluated against the pre-pass
//! set, matching the reference frontend's behavior.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;
use tracelens_common::{Event, EventId};

/// Derive the displayable set from the counter-reachable one.
///
/// An entry is removed iff both hold:
/// (a) at least one of its dependencies names a known event that is not
///     currently reachable, and
/// (b) no currently-reachable event lists it as a dependency.
///
/// Dependency ids that match no event in the log are ignored; the dependency
/// map comes from a less trusted process than the event log.
///
/// A dependency whose source shares the dependent's offset never counts as
/// invisible. The display holds one event per offset, so such a source is
/// hidden by construction (an initial value overwritten by the binding the
/// same instruction produced, or the previous iteration's binding in
/// `x = x + 1`), and the dependent is exactly the event a user expects to
/// keep seeing there. Runs in O(V + E) over the reachable subgraph.
pub(crate) fn prune_dangling(
    events: &[Event],
    reachable: &BTreeMap<i64, usize>,
    event_index: &HashMap<EventId, usize>,
    dependencies: &HashMap<EventId, Vec<EventId>>,
) -> BTreeMap<i64, usize> {
    let reachable_ids: HashSet<&EventId> =
        reachable.values().map(|&index| &events[index].id).collect();

    // Ids some reachable event depends on; anything in here must stay.
    let mut consumed: HashSet<&EventId> = HashSet::new();
    for &index in reachable.values() {
        if let Some(sources) = dependencies.get(&events[index].id) {
            consumed.extend(sources.iter());
        }
    }

    let visible: BTreeMap<i64, usize> = reachable
        .iter()
        .filter(|&(_, &index)| {
            let event = &events[index];
            let dangling = dependencies.get(&event.id).is_some_and(|sources| {
                sources.iter().any(|source| match event_index.get(source) {
                    Some(&source_index) => {
                        events[source_index].offset != event.offset
                            && !reachable_ids.contains(source)
                    }
                    None => false,
                })
            });
            !dangling || consumed.contains(&event.id)
        })
        .map(|(&offset, &index)| (offset, index))
        .collect();

    let pruned = reachable.len() - visible.len();
    if pruned > 0 {
        debug!(pruned, "dropped events with off-screen dependencies");
    }

    visible
}
