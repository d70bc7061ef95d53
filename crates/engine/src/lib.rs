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

//! TraceLens visibility engine.
//!
//! The engine turns a flat per-invocation event log plus loop-boundary
//! metadata into the set of events visible under each loop's user-selected
//! iteration counter. It indexes nested-loop iteration boundaries in one
//! linear pass, computes the initially visible event set, and incrementally
//! recomputes visibility - pruning events whose data dependencies are no
//! longer on screen - whenever a counter changes.
//!
//! The engine consumes a plain in-memory [`TracePayload`] and produces a
//! plain in-memory visible set; it performs no I/O. Transport and rendering
//! are external collaborators.
//!
//! [`TracePayload`]: tracelens_common::TracePayload

mod builder;

pub mod error;
pub use error::*;

mod prune;

pub mod trace_data;
pub use trace_data::*;
