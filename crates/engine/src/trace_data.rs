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

//! The per-frame aggregate owning the event log, the indexed loops, and the
//! currently visible event set.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};
use tracelens_common::{Event, EventId, FrameMetadata, Loop, LoopArena, LoopId, TracePayload};

use crate::{builder, error::EngineError, prune};

/// One displayed frame: the immutable event log, the loop forest with its
/// iteration tables, the dependency map, and the visible event set.
///
/// All mutation goes through [`Self::set_loop_counter`], one counter at a
/// time, on the thread that owns the frame. A failed update leaves the
/// previously valid visible set untouched: recomputation builds the next
/// set aside and swaps it in only on success.
#[derive(Debug, Clone)]
pub struct TraceData {
    metadata: FrameMetadata,
    events: Vec<Event>,
    loops: LoopArena,
    tracing_result: HashMap<EventId, Vec<EventId>>,
    /// Event id to log index, for resolving dependency edges.
    event_index: HashMap<EventId, usize>,
    lineno_ranking: BTreeMap<u32, u32>,
    /// Offset to event index under the current counters, before pruning.
    /// Kept separately so counter round-trips restore the exact set.
    reachable: BTreeMap<i64, usize>,
    /// The published set: `reachable` minus dependency-pruned entries.
    visible: BTreeMap<i64, usize>,
}

impl TraceData {
    /// Index a tracer payload into a displayable frame.
    ///
    /// Fails on malformed input (non-dense event indices, inverted or
    /// unsorted loop ranges); nothing partially indexed is ever returned.
    pub fn from_payload(payload: TracePayload) -> Result<Self, EngineError> {
        let TracePayload { metadata, events, loops, tracing_result } = payload;

        let outcome = builder::build_index(&events, &loops)?;

        let mut event_index = HashMap::with_capacity(events.len());
        for event in &events {
            if event_index.insert(event.id.clone(), event.index).is_some() {
                warn!(id = %event.id, "duplicate event id in log; keeping the later event");
            }
        }

        let unknown_ids = tracing_result
            .iter()
            .flat_map(|(id, sources)| std::iter::once(id).chain(sources.iter()))
            .filter(|id| !event_index.contains_key(*id))
            .count();
        if unknown_ids > 0 {
            // The dependency map comes from a less trusted process; unknown
            // ids are treated as if the dependency did not exist.
            warn!(unknown_ids, "dependency map references event ids absent from the log");
        }

        let mut data = Self {
            metadata,
            events,
            loops: outcome.arena,
            tracing_result,
            event_index,
            lineno_ranking: outcome.lineno_ranking,
            reachable: outcome.reachable,
            visible: BTreeMap::new(),
        };
        let visible = data.pruned_view(&data.reachable);
        data.visible = visible;

        debug!(
            frame = %data.metadata.frame_name,
            events = data.events.len(),
            loops = data.loops.len(),
            visible = data.visible.len(),
            "frame loaded"
        );

        Ok(data)
    }

    /// Set a loop's iteration counter and recompute the visible set.
    ///
    /// Rejected without touching any state if the loop is unknown, the
    /// counter exceeds the loop's `max_counter`, or no iteration was
    /// recorded under the enclosing loops' current counters. The UI is
    /// expected to clamp input to `0..=max_counter`; anything out of range
    /// here is a caller contract violation, surfaced as an error rather
    /// than applied.
    pub fn set_loop_counter(&mut self, loop_id: LoopId, counter: u64) -> Result<(), EngineError> {
        let lp = self.loops.get(loop_id).ok_or(EngineError::UnknownLoop { loop_id })?;
        if counter > lp.max_counter {
            return Err(EngineError::CounterOutOfRange {
                loop_id,
                counter,
                max_counter: lp.max_counter,
            });
        }

        let previous = lp.counter;
        self.loops[loop_id].counter = counter;
        match self.recompute_reachable(Some(loop_id)) {
            Ok(next) => {
                let visible = self.pruned_view(&next);
                self.reachable = next;
                self.visible = visible;
                debug!(%loop_id, counter, visible = self.visible.len(), "counter applied");
                Ok(())
            }
            Err(err) => {
                self.loops[loop_id].counter = previous;
                Err(err)
            }
        }
    }

    /// Recompute the visible set from the loops' current counters.
    ///
    /// [`Self::set_loop_counter`] does this on every successful change, so
    /// calling it directly is only ever a refresh; it never alters counters.
    pub fn update_visible_events(&mut self) -> Result<(), EngineError> {
        let next = self.recompute_reachable(None)?;
        let visible = self.pruned_view(&next);
        self.reachable = next;
        self.visible = visible;
        Ok(())
    }

    /// Build the next reachable map from the current counters, leaving the
    /// published state untouched.
    ///
    /// Loops are walked in ascending start-offset order, so an inner loop's
    /// iteration overwrites the offset entries contributed by its enclosing
    /// loop: the inner context wins at shared offsets.
    ///
    /// A loop whose current counter path has no recorded iteration is an
    /// error when it is the loop the caller just changed (`changed`): the
    /// requested iteration never ran under the enclosing counters. Any other
    /// loop in that situation was skipped entirely under the current outer
    /// configuration and simply contributes no events.
    fn recompute_reachable(
        &self,
        changed: Option<LoopId>,
    ) -> Result<BTreeMap<i64, usize>, EngineError> {
        let mut next = self.reachable.clone();
        for (loop_id, lp) in self.loops.iter() {
            let path = self.loops.counter_path(loop_id);
            let (start, end) = match (lp.iteration_start(&path), lp.iteration_end(&path)) {
                (Some(start), Some(end)) => (start, end),
                _ if changed == Some(loop_id) => {
                    return Err(EngineError::MissingIteration { loop_id, path });
                }
                _ => {
                    debug!(%loop_id, %path, "loop did not run under current counters");
                    continue;
                }
            };
            for event in &self.events[start..=end] {
                if !event.is_control_marker() {
                    next.insert(event.offset, event.index);
                }
            }
        }
        Ok(next)
    }

    /// Apply dependency pruning to a reachable map.
    fn pruned_view(&self, reachable: &BTreeMap<i64, usize>) -> BTreeMap<i64, usize> {
        prune::prune_dangling(&self.events, reachable, &self.event_index, &self.tracing_result)
    }

    /// Identification of the traced invocation.
    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    /// The full chronological event log.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The loop forest, with counters and iteration tables.
    pub fn loops(&self) -> &LoopArena {
        &self.loops
    }

    /// The loop at `id`, if any.
    pub fn loop_info(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id)
    }

    /// The currently visible events, ordered by offset.
    ///
    /// At most one event per offset; control markers never appear.
    pub fn visible_events(&self) -> impl Iterator<Item = &Event> {
        self.visible.values().map(|&index| &self.events[index])
    }

    /// The visible event at `offset`, if any.
    pub fn visible_event_at(&self, offset: i64) -> Option<&Event> {
        self.visible.get(&offset).map(|&index| &self.events[index])
    }

    /// Number of currently visible events.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// The event a given id names, if it exists in the log.
    pub fn event_by_id(&self, id: &EventId) -> Option<&Event> {
        self.event_index.get(id).map(|&index| &self.events[index])
    }

    /// Dependency sources of an event, as delivered by the tracer.
    pub fn dependencies(&self, id: &EventId) -> &[EventId] {
        self.tracing_result.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The display rank of a source line, if any event or loop header
    /// occurred on it. Ranks start at 1.
    pub fn lineno_rank(&self, lineno: u32) -> Option<u32> {
        self.lineno_ranking.get(&lineno).copied()
    }

    /// The full line-number ranking table for vertical layout.
    pub fn lineno_ranking(&self) -> &BTreeMap<u32, u32> {
        &self.lineno_ranking
    }
}
