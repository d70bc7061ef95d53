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

//! Loop index construction.
//!
//! One forward pass over the event log discovers, for every lexical loop,
//! the first and last event index of each runtime iteration (keyed by
//! counter path), the loop nesting forest, the initially visible event set,
//! and the line-number ranking used for vertical layout.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, trace};
use tracelens_common::{CounterPath, Event, LoopArena, LoopId, LoopSpec};

use crate::error::EngineError;

/// Everything the indexing pass produces.
#[derive(Debug)]
pub(crate) struct IndexOutcome {
    /// The loops, with iteration tables and nesting links filled in and all
    /// counters back at 0.
    pub(crate) arena: LoopArena,
    /// The initially visible set: offset to event index, every counter at 0.
    pub(crate) reachable: BTreeMap<i64, usize>,
    /// Line number to display rank, starting at 1.
    pub(crate) lineno_ranking: BTreeMap<u32, u32>,
}

/// Index the event log against the frame's loops.
///
/// Fails on malformed input (non-dense event indices, inverted or unsorted
/// loop ranges); a partial index must never be produced.
pub(crate) fn build_index(
    events: &[Event],
    specs: &[LoopSpec],
) -> Result<IndexOutcome, EngineError> {
    validate(events, specs)?;

    let mut arena = LoopArena::from_specs(specs);
    let mut stack: Vec<LoopId> = Vec::new();
    let mut reachable = BTreeMap::new();
    // Highest offset seen while candidate-scanning for initial visibility.
    let mut max_reached_offset = i64::MIN;
    // Offset of the prior event, kept below any valid offset initially.
    let mut previous_offset = i64::MIN;
    let mut seen_linenos = BTreeSet::new();

    for event in events {
        let offset = event.offset;
        seen_linenos.insert(event.lineno);

        // With all counters at 0, the visible events form a sequence whose
        // offsets never decrease. `>=` rather than `>`: two events may share
        // an offset (an initial value and a binding triggered by the same
        // instruction), and the later one in log order must win.
        if offset >= max_reached_offset {
            max_reached_offset = offset;
            if !event.is_control_marker() {
                reachable.insert(offset, event.index);
            }
        }

        // Pop every loop the log has moved past. The previous event was the
        // last event of the popped loop's final iteration. Counters are
        // reset on the way out so the scan leaves a clean state.
        while let Some(&top) = stack.last() {
            if arena[top].end_offset >= offset {
                break;
            }
            let path = stack_path(&arena, &stack);
            arena[top].add_iteration_end(path, event.index.saturating_sub(1));
            stack.pop();
            arena[top].counter = 0;
        }

        // A loop end can also be the last event in a frame, so an iteration
        // end is recorded the moment the end offset itself is reached. This
        // must come after popping, so it applies to the loop still on the
        // stack. Re-recording the same end later is harmless.
        if let Some(&top) = stack.last() {
            if arena[top].end_offset == offset {
                let path = stack_path(&arena, &stack);
                arena[top].add_iteration_end(path, event.index);
            }
        }

        // An early return leaves every loop on the stack at once; each of
        // them has its current iteration end at the returning event.
        if event.is_return() {
            for depth in 0..stack.len() {
                let path = stack_path(&arena, &stack[..=depth]);
                arena[stack[depth]].add_iteration_end(path, event.index);
            }
        }

        // A jump-back marker only represents a real new iteration if the
        // next event's offset is smaller than the current one; otherwise the
        // loop is exiting and no iteration boundary is crossed.
        if event.is_control_marker() {
            if let (Some(&top), Some(next)) = (stack.last(), events.get(event.index + 1)) {
                if next.offset < offset {
                    let path = stack_path(&arena, &stack);
                    arena[top].add_iteration_end(path, event.index);
                    arena[top].increment_counter();
                    let path = stack_path(&arena, &stack);
                    trace!(loop_id = %top, path = %path, "opening iteration");
                    // The event following the marker starts the next iteration.
                    arena[top].add_iteration_start(path, next.index);
                }
            }
        }

        // Push every loop this event just entered. The nesting forest is
        // discovered here: the stack top at first entry is the parent, and a
        // parent once set is never overwritten.
        for idx in 0..arena.len() {
            let id = LoopId::from_index(idx);
            let (start, end, parent_unset) = {
                let lp = &arena[id];
                (lp.start_offset, lp.end_offset, lp.parent.is_none())
            };
            if previous_offset < start && start <= offset && offset <= end {
                if let Some(&top) = stack.last() {
                    if parent_unset {
                        arena[id].parent = Some(top);
                        if !arena[top].children.contains(&id) {
                            arena[top].children.push(id);
                        }
                    }
                }
                stack.push(id);
                let path = stack_path(&arena, &stack);
                arena[id].add_iteration_start(path, event.index);
            }
        }

        previous_offset = offset;
    }

    // A log can end while iterations are still open (e.g. truncated inside a
    // loop body). Close them at the final event so the boundary tables stay
    // total over every counter path that was opened.
    if let Some(last) = events.last() {
        while let Some(&top) = stack.last() {
            let path = stack_path(&arena, &stack);
            arena[top].close_iteration_if_open(path, last.index);
            stack.pop();
        }
    }

    // Restore the initial display state.
    arena.reset_counters();

    // Loop headers get a rank even when no event was recorded on them
    // (a `while` header line produces no event of its own).
    for (_, lp) in arena.iter() {
        seen_linenos.insert(lp.start_lineno);
    }
    // Rank 1 upward; rank 0 is reserved for initial-value display rows.
    let lineno_ranking = seen_linenos
        .into_iter()
        .enumerate()
        .map(|(rank, lineno)| (lineno, rank as u32 + 1))
        .collect();

    debug!(
        events = events.len(),
        loops = arena.len(),
        initially_visible = reachable.len(),
        "indexed frame"
    );

    Ok(IndexOutcome { arena, reachable, lineno_ranking })
}

/// The counter path of the innermost loop on `stack`: the counters of every
/// stacked loop, outermost first.
fn stack_path(arena: &LoopArena, stack: &[LoopId]) -> CounterPath {
    CounterPath::new(stack.iter().map(|&id| arena[id].counter).collect())
}

fn validate(events: &[Event], specs: &[LoopSpec]) -> Result<(), EngineError> {
    for (position, event) in events.iter().enumerate() {
        if event.index != position {
            return Err(EngineError::NonDenseEventIndex {
                position,
                found: event.index,
                expected: position,
            });
        }
    }

    for spec in specs {
        if spec.start_offset >= spec.end_offset {
            return Err(EngineError::InvalidLoopRange {
                start_offset: spec.start_offset,
                end_offset: spec.end_offset,
            });
        }
    }

    if let Some(position) =
        specs.iter().tuple_windows().position(|(a, b)| b.start_offset <= a.start_offset)
    {
        return Err(EngineError::UnsortedLoops {
            position: position + 1,
            start_offset: specs[position + 1].start_offset,
        });
    }

    Ok(())
}
