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

//! Shared fixtures for TraceLens integration tests.
//!
//! Events are built as wire-shaped JSON so every scenario also exercises the
//! payload deserialization path. Ids follow the `e{index}` convention and
//! source lines are derived from offsets, which keeps the scenario tables
//! below readable against the expected event indices.

use serde_json::{json, Value};
use tracelens_engine::TraceData;

/// Initialization utilities for tests
pub mod init {
    /// Initialize logging for a test process; safe to call repeatedly.
    pub fn init_test_environment() {
        tracelens_common::logging::ensure_test_logging(None);
    }
}

fn lineno_for(offset: i64) -> i64 {
    offset / 2 + 1
}

/// A wire-shaped `Binding` event with no dependencies.
pub fn binding(index: usize, offset: i64) -> Value {
    json!({
        "id": format!("e{index}"),
        "index": index,
        "offset": offset,
        "lineno": lineno_for(offset),
        "type": "Binding",
        "target": format!("v{offset}"),
        "value": "0"
    })
}

/// A wire-shaped `InitialValue` event.
pub fn initial_value(index: usize, offset: i64) -> Value {
    json!({
        "id": format!("e{index}"),
        "index": index,
        "offset": offset,
        "lineno": lineno_for(offset),
        "type": "InitialValue",
        "target": format!("v{offset}"),
        "value": "0"
    })
}

/// A wire-shaped `Binding` event depending on the given event ids.
pub fn binding_from(index: usize, offset: i64, sources: &[&str]) -> Value {
    json!({
        "id": format!("e{index}"),
        "index": index,
        "offset": offset,
        "lineno": lineno_for(offset),
        "type": "Binding",
        "target": format!("v{offset}"),
        "value": "0",
        "sources": sources
    })
}

/// A wire-shaped `JumpBackToLoopStart` control marker.
pub fn jump_back(index: usize, offset: i64, jump_target: i64) -> Value {
    json!({
        "id": format!("e{index}"),
        "index": index,
        "offset": offset,
        "lineno": lineno_for(offset),
        "type": "JumpBackToLoopStart",
        "jump_target": jump_target
    })
}

/// A wire-shaped `Return` event.
pub fn ret(index: usize, offset: i64, sources: &[&str]) -> Value {
    json!({
        "id": format!("e{index}"),
        "index": index,
        "offset": offset,
        "lineno": lineno_for(offset),
        "type": "Return",
        "value": "null",
        "sources": sources
    })
}

/// A wire-shaped loop spec.
pub fn loop_spec(start_offset: i64, end_offset: i64) -> Value {
    json!({
        "startOffset": start_offset,
        "endOffset": end_offset,
        "startLineno": lineno_for(start_offset)
    })
}

/// Assemble a full wire payload.
pub fn payload(events: Vec<Value>, loops: Vec<Value>, tracing_result: Value) -> Value {
    json!({
        "metadata": {
            "frameId": "frame-0",
            "frameName": "traced_fn",
            "filename": "traced.py",
            "startLineno": 1,
            "endLineno": 99
        },
        "events": events,
        "loops": loops,
        "tracingResult": tracing_result
    })
}

/// Deserialize a wire payload and index it into a frame.
pub fn load(events: Vec<Value>, loops: Vec<Value>, tracing_result: Value) -> TraceData {
    init::init_test_environment();
    let payload = serde_json::from_value(payload(events, loops, tracing_result))
        .expect("payload deserializes");
    TraceData::from_payload(payload).expect("payload indexes")
}

/// The visible events' log indices, in offset order.
pub fn visible_indices(data: &TraceData) -> Vec<usize> {
    data.visible_events().map(|event| event.index).collect()
}

/// The reference nested-loop log: an outer loop over offsets `[0, 10]` and
/// an inner loop over `[2, 6]`, two outer iterations each containing two
/// inner iterations, and one trailing event after the loops.
pub fn nested_loop_events() -> Vec<Value> {
    vec![
        binding(0, 0),
        binding(1, 2),
        binding(2, 4),
        jump_back(3, 6, 2),
        binding(4, 2),
        binding(5, 4),
        jump_back(6, 6, 2),
        binding(7, 8),
        jump_back(8, 10, 0),
        binding(9, 0),
        binding(10, 2),
        binding(11, 4),
        jump_back(12, 6, 2),
        binding(13, 2),
        binding(14, 4),
        jump_back(15, 6, 2),
        binding(16, 8),
        jump_back(17, 10, 0),
        binding(18, 12),
    ]
}

/// Loops for [`nested_loop_events`].
pub fn nested_loop_specs() -> Vec<Value> {
    vec![loop_spec(0, 10), loop_spec(2, 6)]
}
