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

//! Dependency pruning across counter changes: events whose sources leave
//! the screen disappear unless something visible still consumes them.

use serde_json::json;
use tracelens_common::LoopId;
use tracelens_engine::TraceData;
use tracelens_integration_tests::{
    binding, binding_from, initial_value, jump_back, load, loop_spec, visible_indices,
};

const LOOP: LoopId = LoopId::from_index(0);

/// One loop over `[2, 8]` running twice. `q` (offset 4) is only bound in the
/// first iteration, from `p` of that iteration; `r` after the loop may or
/// may not consume `q`.
fn two_pass_events() -> Vec<serde_json::Value> {
    vec![
        binding(0, 0),
        binding(1, 2),
        binding_from(2, 4, &["e1"]),
        jump_back(3, 8, 2),
        binding(4, 2),
        jump_back(5, 8, 2),
        binding(6, 10),
    ]
}

#[test]
fn test_orphaned_event_disappears_after_counter_change() {
    let mut data = load(
        two_pass_events(),
        vec![loop_spec(2, 8)],
        json!({ "e2": ["e1"] }),
    );
    assert_eq!(visible_indices(&data), vec![0, 1, 2, 6]);

    // Iteration 1 rebinds p (offset 2). q's source e1 leaves the screen and
    // nothing visible consumes q, so q goes with it.
    data.set_loop_counter(LOOP, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![0, 4, 6]);
}

#[test]
fn test_event_with_visible_consumer_survives_counter_change() {
    let events = vec![
        binding(0, 0),
        binding(1, 2),
        binding_from(2, 4, &["e1"]),
        jump_back(3, 8, 2),
        binding(4, 2),
        jump_back(5, 8, 2),
        binding_from(6, 10, &["e2"]),
    ];
    let mut data = load(
        events,
        vec![loop_spec(2, 8)],
        json!({ "e2": ["e1"], "e6": ["e2"] }),
    );

    // q's source is invisible after the change, but r (offset 10) still
    // consumes q: q must be retained.
    data.set_loop_counter(LOOP, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![0, 2, 4, 6]);
}

#[test]
fn test_pruning_reverts_with_the_counter() {
    let mut data = load(
        two_pass_events(),
        vec![loop_spec(2, 8)],
        json!({ "e2": ["e1"] }),
    );
    let initial = visible_indices(&data);

    data.set_loop_counter(LOOP, 1).unwrap();
    data.set_loop_counter(LOOP, 0).unwrap();
    assert_eq!(visible_indices(&data), initial);
}

#[test]
fn test_unknown_dependency_ids_are_ignored() {
    // The dependency map names events that do not exist in the log; they
    // must be treated as if the dependency did not exist.
    let data = load(
        two_pass_events(),
        vec![loop_spec(2, 8)],
        json!({ "e2": ["phantom"], "ghost": ["e1"] }),
    );
    assert_eq!(visible_indices(&data), vec![0, 1, 2, 6]);
}

#[test]
fn test_initial_value_overwritten_by_its_binding_is_not_pruned() {
    // nonlocal a; a = a + 1: the initial value capture and the binding share
    // an offset (both triggered by the same instruction) and the binding
    // sources the capture. The binding wins the offset slot and must stay.
    let events = vec![
        initial_value(0, 2),
        binding_from(1, 2, &["e0"]),
        binding_from(2, 4, &["e1"]),
    ];
    let data: TraceData = load(events, vec![], json!({ "e1": ["e0"], "e2": ["e1"] }));

    assert_eq!(visible_indices(&data), vec![1, 2]);
}

#[test]
fn test_self_update_across_iterations_is_kept() {
    // x = x + 1 inside a loop: each iteration's binding sources the previous
    // iteration's binding at the same offset. Whatever iteration is shown,
    // the x node must stay on screen.
    let events = vec![
        binding(0, 0),
        binding_from(1, 2, &["e0"]),
        jump_back(2, 4, 2),
        binding_from(3, 2, &["e1"]),
        jump_back(4, 4, 2),
    ];
    let mut data = load(events, vec![loop_spec(2, 4)], json!({ "e1": ["e0"], "e3": ["e1"] }));
    assert_eq!(visible_indices(&data), vec![0, 1]);

    data.set_loop_counter(LOOP, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![0, 3]);
}
