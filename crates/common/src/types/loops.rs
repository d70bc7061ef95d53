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

use std::{
    collections::HashMap,
    fmt::Display,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

/// Identifier of a loop: a dense index into the frame's [`LoopArena`].
///
/// Loops reference each other (parent/children) through ids instead of
/// owning pointers, so the lexical nesting forest needs no reference cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopId(u32);

impl LoopId {
    /// Create an id from an arena slot index.
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The arena slot index.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for LoopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loop#{}", self.0)
    }
}

/// The ordered iteration counters of a loop and all its lexical ancestors,
/// outermost first.
///
/// Counter paths key the per-iteration boundary tables. They compare and
/// hash structurally; there is no string rendering involved in lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CounterPath(Vec<u64>);

impl CounterPath {
    /// Build a path from counters ordered outermost first.
    pub fn new(counters: Vec<u64>) -> Self {
        Self(counters)
    }

    /// The counters, outermost first.
    pub fn counters(&self) -> &[u64] {
        &self.0
    }

    /// Number of loops the path spans.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Display for CounterPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, counter) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{counter}")?;
        }
        write!(f, "]")
    }
}

/// A lexical loop of the traced function, as delivered by the tracer.
///
/// Only the offset range and the header line are known up front; iteration
/// boundaries, nesting and counters are discovered by the index builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSpec {
    /// First offset of the loop body's range.
    pub start_offset: i64,
    /// Last offset of the loop body's range. Always greater than `start_offset`.
    pub end_offset: i64,
    /// Source line of the loop header.
    pub start_lineno: u32,
}

/// A lexical loop tracked across its runtime iterations.
///
/// Constructed once per frame with `counter == 0`; the index builder fills
/// the iteration tables and the nesting links, and the user-facing API moves
/// `counter` within `0..=max_counter`.
#[derive(Debug, Clone)]
pub struct Loop {
    /// First offset of the loop body's range.
    pub start_offset: i64,
    /// Last offset of the loop body's range.
    pub end_offset: i64,
    /// Source line of the loop header.
    pub start_lineno: u32,
    /// The user-selected iteration index. 0 is the initial state.
    pub counter: u64,
    /// Highest iteration index observed while indexing; the upper bound for
    /// `counter`.
    ///
    /// Note that the number of iterations executed is not `max_counter`: an
    /// inner loop running twice inside each of two outer iterations performs
    /// four iterations but has `max_counter == 1`.
    pub max_counter: u64,
    /// The lexically enclosing loop, once discovered. Never reassigned.
    pub parent: Option<LoopId>,
    /// Loops nested directly inside this one.
    pub children: Vec<LoopId>,
    /// Index of the first event of each iteration, keyed by counter path.
    iteration_starts: HashMap<CounterPath, usize>,
    /// Index of the last event of each iteration, keyed by counter path.
    iteration_ends: HashMap<CounterPath, usize>,
}

impl Loop {
    /// Construct an unindexed loop from its spec.
    pub fn new(spec: LoopSpec) -> Self {
        Self {
            start_offset: spec.start_offset,
            end_offset: spec.end_offset,
            start_lineno: spec.start_lineno,
            counter: 0,
            max_counter: 0,
            parent: None,
            children: Vec::new(),
            iteration_starts: HashMap::new(),
            iteration_ends: HashMap::new(),
        }
    }

    /// Advance to the next iteration, tracking the highest counter seen.
    pub fn increment_counter(&mut self) {
        self.counter += 1;
        self.max_counter = self.max_counter.max(self.counter);
    }

    /// Record the first event index of the iteration at `path`.
    pub fn add_iteration_start(&mut self, path: CounterPath, event_index: usize) {
        self.iteration_starts.insert(path, event_index);
    }

    /// Record the last event index of the iteration at `path`.
    ///
    /// Recording an end twice is harmless: the tables are keyed by counter
    /// path and the last write wins.
    pub fn add_iteration_end(&mut self, path: CounterPath, event_index: usize) {
        self.iteration_ends.insert(path, event_index);
    }

    /// Record an iteration end only if none was recorded for `path` yet.
    pub fn close_iteration_if_open(&mut self, path: CounterPath, event_index: usize) {
        self.iteration_ends.entry(path).or_insert(event_index);
    }

    /// First event index of the iteration at `path`, if that iteration ran.
    pub fn iteration_start(&self, path: &CounterPath) -> Option<usize> {
        self.iteration_starts.get(path).copied()
    }

    /// Last event index of the iteration at `path`, if that iteration ran.
    pub fn iteration_end(&self, path: &CounterPath) -> Option<usize> {
        self.iteration_ends.get(path).copied()
    }

    /// Number of iterations recorded in the start table.
    pub fn recorded_iterations(&self) -> usize {
        self.iteration_starts.len()
    }
}

/// All loops of one traced frame, addressed by [`LoopId`].
///
/// Slots are ordered by `start_offset` ascending (the order the tracer
/// delivers loops in), which the visibility updater relies on: iterating in
/// arena order processes outer loops before the loops nested inside them.
#[derive(Debug, Clone, Default)]
pub struct LoopArena {
    loops: Vec<Loop>,
}

impl LoopArena {
    /// Build an arena of unindexed loops from the tracer's specs, keeping
    /// their order.
    pub fn from_specs(specs: &[LoopSpec]) -> Self {
        Self { loops: specs.iter().copied().map(Loop::new).collect() }
    }

    /// The loop at `id`, if the id is valid for this arena.
    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id.index())
    }

    /// Mutable access to the loop at `id`.
    pub fn get_mut(&mut self, id: LoopId) -> Option<&mut Loop> {
        self.loops.get_mut(id.index())
    }

    /// Iterate over `(id, loop)` pairs in `start_offset` order.
    pub fn iter(&self) -> impl Iterator<Item = (LoopId, &Loop)> {
        self.loops.iter().enumerate().map(|(i, lp)| (LoopId::from_index(i), lp))
    }

    /// All valid ids, in `start_offset` order.
    pub fn ids(&self) -> impl Iterator<Item = LoopId> {
        (0..self.loops.len()).map(LoopId::from_index)
    }

    /// Number of loops in the arena.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Whether the frame has no loops at all.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// The counter path of the loop at `id` under the current counters: the
    /// counters of the loop and all its ancestors, outermost first.
    pub fn counter_path(&self, id: LoopId) -> CounterPath {
        let mut counters = vec![self[id].counter];
        let mut parent = self[id].parent;
        while let Some(p) = parent {
            counters.push(self[p].counter);
            parent = self[p].parent;
        }
        counters.reverse();
        CounterPath::new(counters)
    }

    /// Reset every loop's counter to the initial state.
    pub fn reset_counters(&mut self) {
        for lp in &mut self.loops {
            lp.counter = 0;
        }
    }
}

impl Index<LoopId> for LoopArena {
    type Output = Loop;

    fn index(&self, id: LoopId) -> &Self::Output {
        &self.loops[id.index()]
    }
}

impl IndexMut<LoopId> for LoopArena {
    fn index_mut(&mut self, id: LoopId) -> &mut Self::Output {
        &mut self.loops[id.index()]
    }
}
