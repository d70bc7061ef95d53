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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Event, EventId, LoopSpec, TraceValue};

/// Identification of one traced function invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    /// Unique id of the frame within the tracing session.
    #[serde(default)]
    pub frame_id: String,
    /// Name of the traced function.
    #[serde(default)]
    pub frame_name: String,
    /// File the traced function is defined in.
    #[serde(default)]
    pub filename: String,
    /// First line of the traced function.
    #[serde(default)]
    pub start_lineno: u32,
    /// Last line of the traced function.
    #[serde(default)]
    pub end_lineno: u32,
    /// File the traced call originated from, if known.
    #[serde(default)]
    pub callsite_filename: Option<String>,
    /// Line the traced call originated from, if known.
    #[serde(default)]
    pub callsite_lineno: Option<u32>,
    /// Captured call arguments.
    #[serde(default)]
    pub arguments: Option<TraceValue>,
}

/// Everything the tracer emits for one traced invocation.
///
/// This is the engine's whole input: a chronological event log, the lexical
/// loops of the function (sorted by `startOffset`), and the dependency map
/// relating each event to the events its value was computed from. The engine
/// performs no I/O; how this payload travels (file, socket, RPC) is the
/// transport collaborator's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePayload {
    /// Identification of the traced invocation.
    #[serde(default)]
    pub metadata: FrameMetadata,
    /// The chronological event log, ordered by `index`.
    pub events: Vec<Event>,
    /// The function's lexical loops, ordered by `startOffset`.
    #[serde(default)]
    pub loops: Vec<LoopSpec>,
    /// Dependency map: event id to the ids of its source events.
    ///
    /// Supplied by a separate, less trusted process than the event log;
    /// entries naming unknown events are ignored rather than rejected.
    #[serde(default)]
    pub tracing_result: HashMap<EventId, Vec<EventId>>,
}
