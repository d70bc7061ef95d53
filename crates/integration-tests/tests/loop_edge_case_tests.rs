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

//! Boundary-detection edge cases: adjacent jump-back markers, empty first
//! iterations, early returns out of a loop body, and inner loops skipped in
//! some outer iteration.

use serde_json::json;
use tracelens_common::{CounterPath, LoopId};
use tracelens_engine::EngineError;
use tracelens_integration_tests::{
    binding, binding_from, jump_back, load, loop_spec, ret, visible_indices,
};

const OUTER: LoopId = LoopId::from_index(0);
const INNER: LoopId = LoopId::from_index(1);

#[test]
fn test_adjacent_jump_back_markers() {
    // The inner loop's backward jump at offset 6 is immediately followed by
    // the outer loop's at offset 8. Each must be attributed to its own loop
    // and no iteration may be double-counted.
    let data = load(
        vec![
            binding(0, 0),
            binding(1, 2),
            binding(2, 4),
            jump_back(3, 6, 2),
            binding(4, 2),
            binding(5, 4),
            jump_back(6, 6, 2),
            jump_back(7, 8, 0),
            binding(8, 0),
            binding(9, 2),
            binding(10, 4),
            jump_back(11, 6, 2),
            binding(12, 2),
            binding(13, 4),
            jump_back(14, 6, 2),
            jump_back(15, 8, 0),
            binding(16, 10),
        ],
        vec![loop_spec(0, 8), loop_spec(2, 6)],
        json!({}),
    );

    assert_eq!(visible_indices(&data), vec![0, 1, 2, 16]);

    let outer = data.loop_info(OUTER).unwrap();
    assert_eq!(outer.max_counter, 1);
    assert_eq!(outer.iteration_start(&CounterPath::new(vec![0])), Some(0));
    assert_eq!(outer.iteration_start(&CounterPath::new(vec![1])), Some(8));
    assert_eq!(outer.iteration_end(&CounterPath::new(vec![0])), Some(7));
    assert_eq!(outer.iteration_end(&CounterPath::new(vec![1])), Some(15));

    let inner = data.loop_info(INNER).unwrap();
    assert_eq!(inner.max_counter, 1);
    assert_eq!(inner.parent, Some(OUTER));
    assert_eq!(inner.iteration_start(&CounterPath::new(vec![0, 0])), Some(1));
    assert_eq!(inner.iteration_start(&CounterPath::new(vec![0, 1])), Some(4));
    assert_eq!(inner.iteration_start(&CounterPath::new(vec![1, 0])), Some(9));
    assert_eq!(inner.iteration_start(&CounterPath::new(vec![1, 1])), Some(12));
    assert_eq!(inner.iteration_end(&CounterPath::new(vec![0, 0])), Some(3));
    assert_eq!(inner.iteration_end(&CounterPath::new(vec![0, 1])), Some(6));
    assert_eq!(inner.iteration_end(&CounterPath::new(vec![1, 0])), Some(11));
    assert_eq!(inner.iteration_end(&CounterPath::new(vec![1, 1])), Some(14));
}

#[test]
fn test_empty_first_iteration() {
    // The body's only statement is skipped in the first iteration: nothing
    // but the jump-back happens before counter 1. Counter 0 must still have
    // a valid iteration record starting at the loop's own first event.
    let data = load(
        vec![
            binding(0, 0),
            jump_back(1, 4, 0),
            binding(2, 0),
            binding(3, 2),
            jump_back(4, 4, 0),
        ],
        vec![loop_spec(0, 4)],
        json!({}),
    );

    assert_eq!(visible_indices(&data), vec![0]);

    let lp = data.loop_info(OUTER).unwrap();
    assert_eq!(lp.max_counter, 1);
    assert_eq!(lp.iteration_start(&CounterPath::new(vec![0])), Some(0));
    assert_eq!(lp.iteration_end(&CounterPath::new(vec![0])), Some(1));
    assert_eq!(lp.iteration_start(&CounterPath::new(vec![1])), Some(2));
    assert_eq!(lp.iteration_end(&CounterPath::new(vec![1])), Some(4));
}

#[test]
fn test_empty_first_iteration_navigation() {
    let mut data = load(
        vec![
            binding(0, 0),
            jump_back(1, 4, 0),
            binding(2, 0),
            binding(3, 2),
            jump_back(4, 4, 0),
        ],
        vec![loop_spec(0, 4)],
        json!({}),
    );

    data.set_loop_counter(OUTER, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![2, 3]);

    data.set_loop_counter(OUTER, 0).unwrap();
    assert_eq!(visible_indices(&data), vec![0]);
}

#[test]
fn test_early_return_closes_the_iteration() {
    // for x in xs:            loop [2, 10]
    //     a = x               offset 4
    //     if a > 1: return a  offset 6, fires in iteration 1
    //     b = a * 2           offset 8
    let events = vec![
        binding(0, 0),
        binding(1, 4),
        binding_from(2, 8, &["e1"]),
        jump_back(3, 10, 2),
        binding(4, 4),
        ret(5, 6, &["e4"]),
    ];
    let data = load(events, vec![loop_spec(2, 10)], json!({ "e2": ["e1"], "e5": ["e4"] }));

    let lp = data.loop_info(OUTER).unwrap();
    assert_eq!(lp.max_counter, 1);
    assert_eq!(lp.iteration_start(&CounterPath::new(vec![0])), Some(1));
    assert_eq!(lp.iteration_end(&CounterPath::new(vec![0])), Some(3));
    assert_eq!(lp.iteration_start(&CounterPath::new(vec![1])), Some(4));
    // The iteration containing the return closes at the return event even
    // though no jump-back or loop-end offset was reached.
    assert_eq!(lp.iteration_end(&CounterPath::new(vec![1])), Some(5));

    assert_eq!(visible_indices(&data), vec![0, 1, 2]);
}

#[test]
fn test_early_return_navigation_shows_return_and_drops_continuation() {
    let events = vec![
        binding(0, 0),
        binding(1, 4),
        binding_from(2, 8, &["e1"]),
        jump_back(3, 10, 2),
        binding(4, 4),
        ret(5, 6, &["e4"]),
    ];
    let mut data =
        load(events, vec![loop_spec(2, 10)], json!({ "e2": ["e1"], "e5": ["e4"] }));

    data.set_loop_counter(OUTER, 1).unwrap();
    // The return becomes visible; the continuation binding at offset 8 lost
    // its source (iteration 0's `a`) and nothing visible consumes it, so the
    // pruner drops it.
    assert_eq!(visible_indices(&data), vec![0, 4, 5]);

    data.set_loop_counter(OUTER, 0).unwrap();
    assert_eq!(visible_indices(&data), vec![0, 1, 2]);
}

/// Outer loop `[0, 12]`; inner loop `[2, 6]` runs twice in the first outer
/// pass and only once in the second.
fn skipped_inner_fixture() -> Vec<serde_json::Value> {
    vec![
        binding(0, 0),
        binding(1, 2),
        binding(2, 4),
        jump_back(3, 6, 2),
        binding(4, 2),
        binding(5, 4),
        jump_back(6, 6, 2),
        binding(7, 8),
        jump_back(8, 12, 0),
        binding(9, 0),
        binding(10, 2),
        binding(11, 4),
        jump_back(12, 6, 2),
        binding(13, 8),
        jump_back(14, 12, 0),
        binding(15, 14),
    ]
}

#[test]
fn test_unreached_inner_iteration_is_rejected_without_state_change() {
    let mut data =
        load(skipped_inner_fixture(), vec![loop_spec(0, 12), loop_spec(2, 6)], json!({}));

    data.set_loop_counter(OUTER, 1).unwrap();
    let before = visible_indices(&data);

    // Inner counter 1 is within max_counter (it ran twice in outer pass 0)
    // but that iteration never happened in outer pass 1.
    let err = data.set_loop_counter(INNER, 1).unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingIteration {
            loop_id: INNER,
            path: CounterPath::new(vec![1, 1]),
        }
    );
    assert_eq!(visible_indices(&data), before);
    assert_eq!(data.loop_info(INNER).unwrap().counter, 0);
}

#[test]
fn test_outer_navigation_past_a_skipped_inner_iteration() {
    let mut data =
        load(skipped_inner_fixture(), vec![loop_spec(0, 12), loop_spec(2, 6)], json!({}));

    // Select inner iteration 1 within outer pass 0, then move to outer pass
    // 1 where the inner loop only ran once: the stale inner counter must not
    // block the outer update, and the inner loop contributes nothing.
    data.set_loop_counter(INNER, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![0, 4, 5, 7, 15]);

    data.set_loop_counter(OUTER, 1).unwrap();
    assert_eq!(visible_indices(&data), vec![9, 10, 11, 13, 15]);
}
