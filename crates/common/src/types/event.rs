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

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Placeholder substituted for a runtime value whose payload fails to decode.
pub const UNDECODABLE_VALUE: &str = "<undecodable>";

/// Identity of a recorded event, unique within one traced frame.
///
/// Event ids are the handles dependency edges are expressed in: the tracing
/// result maps an [`EventId`] to the ids of the events its value was computed
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create an event id from its wire representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A runtime value captured by the tracer.
///
/// Values travel as JSON-encoded strings. Decoding happens once at
/// deserialization time; a payload that fails to decode is replaced by
/// [`UNDECODABLE_VALUE`] rather than aborting the frame load, since value
/// payloads are irrelevant to visibility computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TraceValue(serde_json::Value);

impl TraceValue {
    /// The decoded JSON value.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Whether this value is the undecodable placeholder.
    pub fn is_undecodable(&self) -> bool {
        matches!(&self.0, serde_json::Value::String(s) if s == UNDECODABLE_VALUE)
    }
}

impl Default for TraceValue {
    fn default() -> Self {
        Self(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for TraceValue {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for TraceValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::String(encoded) => match serde_json::from_str(&encoded) {
                Ok(decoded) => Ok(Self(decoded)),
                Err(err) => {
                    warn!(payload = %encoded, error = %err, "Failed to decode value payload");
                    Ok(Self(serde_json::Value::String(UNDECODABLE_VALUE.to_string())))
                }
            },
            // Some producers send already-decoded JSON. Accept it as-is.
            other => Ok(Self(other)),
        }
    }
}

/// One observed runtime action in a traced frame.
///
/// Events are totally ordered by `index`, which is dense and starts at 0.
/// `offset` is the instruction offset that produced the event; it is neither
/// unique (several events may share one offset) nor monotonic across the log
/// (a backward jump in offset signals a new loop iteration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identity used for dependency edges, unique within the frame.
    pub id: EventId,
    /// Position in the chronological log. The sole stable handle into it.
    pub index: usize,
    /// Instruction offset that produced the event.
    pub offset: i64,
    /// Source line, used only for display grouping.
    pub lineno: u32,
    /// What happened, with the payload relevant to that kind of action.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Whether this event is a control marker that must never be displayed.
    pub fn is_control_marker(&self) -> bool {
        matches!(self.kind, EventKind::JumpBackToLoopStart { .. })
    }

    /// Whether this event is a return from the traced function.
    pub fn is_return(&self) -> bool {
        matches!(self.kind, EventKind::Return { .. })
    }

    /// The variable this event acted on, if any.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            EventKind::InitialValue { target, .. }
            | EventKind::Binding { target, .. }
            | EventKind::Mutation { target, .. }
            | EventKind::Deletion { target } => Some(target),
            EventKind::Return { .. } | EventKind::JumpBackToLoopStart { .. } => None,
        }
    }
}

/// The kind of a recorded event, tagged as `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    /// A variable already bound when the frame started.
    InitialValue {
        /// Name of the variable.
        target: String,
        /// Captured value at frame entry.
        #[serde(default)]
        value: TraceValue,
    },
    /// A name bound (or rebound) to a value.
    Binding {
        /// Name of the variable.
        target: String,
        /// Value bound to the name.
        #[serde(default)]
        value: TraceValue,
        /// Ids of the events this value was computed from.
        #[serde(default)]
        sources: Vec<EventId>,
    },
    /// An existing object changed in place.
    Mutation {
        /// Name of the variable.
        target: String,
        /// Value after the mutation.
        #[serde(default)]
        value: TraceValue,
        /// Serialized description of what changed.
        #[serde(default)]
        delta: TraceValue,
        /// Ids of the events this mutation was computed from.
        #[serde(default)]
        sources: Vec<EventId>,
    },
    /// A name deleted from scope.
    Deletion {
        /// Name of the variable.
        target: String,
    },
    /// The traced function returned.
    Return {
        /// The returned value.
        #[serde(default)]
        value: TraceValue,
        /// Ids of the events the returned value was computed from.
        #[serde(default)]
        sources: Vec<EventId>,
    },
    /// Control marker: execution jumped back to a loop start.
    ///
    /// Never shown to the user; its position drives iteration-boundary
    /// detection in the visibility engine.
    JumpBackToLoopStart {
        /// Offset the jump landed on.
        #[serde(default)]
        jump_target: i64,
    },
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InitialValue { .. } => "InitialValue",
            Self::Binding { .. } => "Binding",
            Self::Mutation { .. } => "Mutation",
            Self::Deletion { .. } => "Deletion",
            Self::Return { .. } => "Return",
            Self::JumpBackToLoopStart { .. } => "JumpBackToLoopStart",
        };
        write!(f, "{name}")
    }
}
