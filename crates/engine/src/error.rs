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

//! Error taxonomy of the visibility engine.
//!
//! Indexing failures abort the whole frame load: nothing partially visible
//! is better than a wrong graph. Counter-update failures abort only that
//! update, leaving the previously valid visible set untouched.

use thiserror::Error;
use tracelens_common::{CounterPath, LoopId};

/// Errors produced while indexing a frame or updating loop counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Event `index` fields must be dense and strictly increasing from 0.
    #[error("event at log position {position} has index {found}, expected {expected}")]
    NonDenseEventIndex {
        /// Position in the delivered event list.
        position: usize,
        /// The index the event carried.
        found: usize,
        /// The index required at this position.
        expected: usize,
    },

    /// A loop must span a non-empty offset range.
    #[error("loop has invalid offset range [{start_offset}, {end_offset}]")]
    InvalidLoopRange {
        /// The loop's start offset.
        start_offset: i64,
        /// The loop's end offset.
        end_offset: i64,
    },

    /// The loop list must arrive sorted by start offset, ascending.
    #[error("loop at position {position} is out of order (start offset {start_offset})")]
    UnsortedLoops {
        /// Position of the first offending loop in the delivered list.
        position: usize,
        /// Its start offset.
        start_offset: i64,
    },

    /// A counter update named a loop the frame does not have.
    #[error("unknown loop {loop_id}")]
    UnknownLoop {
        /// The offending id.
        loop_id: LoopId,
    },

    /// A counter update exceeded the highest iteration observed.
    #[error("counter {counter} for {loop_id} is out of range (max {max_counter})")]
    CounterOutOfRange {
        /// The loop whose counter was set.
        loop_id: LoopId,
        /// The requested counter.
        counter: u64,
        /// The highest valid counter.
        max_counter: u64,
    },

    /// No iteration was recorded for a loop under the current counters.
    ///
    /// The counter is within `0..=max_counter` globally, but that iteration
    /// never ran under the enclosing loops' current counters (e.g. an inner
    /// loop skipped in one outer pass).
    #[error("{loop_id} has no recorded iteration at counter path {path}")]
    MissingIteration {
        /// The loop whose iteration was looked up.
        loop_id: LoopId,
        /// The counter path that had no entry.
        path: CounterPath,
    },
}
