// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};

use fenster::exec::window::bounds::{unbounded_bounds, window_bounds};
use fenster::{
    Arg, Column, EngineError, FrameSpec, Output, Registry, ScalarValue, WindowCall,
    WindowFunction,
};

fn int64_col(values: Vec<Option<i64>>) -> Column {
    Column::new(Arc::new(Int64Array::from(values)))
}

fn bool_col(values: Vec<bool>) -> Column {
    Column::new(Arc::new(BooleanArray::from(values)))
}

fn i64_vec(col: &Column) -> Vec<Option<i64>> {
    let arr = col
        .values()
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("int64 output");
    (0..arr.len())
        .map(|i| if arr.is_null(i) { None } else { Some(arr.value(i)) })
        .collect()
}

fn column_out(out: Output) -> Column {
    match out {
        Output::Column(c) => c,
        Output::Scalar(v) => panic!("expected column output, got scalar {v:?}"),
    }
}

/// ROWS UNBOUNDED PRECEDING .. CURRENT ROW edges for a partitioned input.
fn running_frame(rows: usize, partition: Option<&Column>, probe: &Column) -> (Column, Column) {
    let start = unbounded_bounds(rows, partition, true).expect("start bounds");
    let end_spec = FrameSpec::from_codes(0, 5, 0).expect("current-row end");
    let end = window_bounds(probe, partition, &Arg::Scalar(ScalarValue::Int64(0)), &end_spec)
        .expect("end bounds");
    (start, end)
}

#[test]
fn partitioned_running_sum_through_registry() {
    let registry = Registry::standard();
    let input = int64_col(vec![Some(1), Some(2), Some(3), Some(4), Some(10), Some(20)]);
    let partition = bool_col(vec![false, false, false, false, true, false]);
    let (start, end) = running_frame(6, Some(&partition), &input);
    let call = WindowCall::new(vec![Arg::Column(input)])
        .with_partition(partition)
        .with_bounds(start, end);
    let out = column_out(registry.evaluate("sum", &call).expect("sum"));
    assert_eq!(
        i64_vec(&out),
        vec![Some(1), Some(3), Some(6), Some(10), Some(10), Some(30)]
    );
}

#[test]
fn rank_family_over_tied_order_keys() {
    // order keys 10, 10, 20, 30: marker true at each tie-group head.
    let input = int64_col(vec![Some(10), Some(10), Some(20), Some(30)]);
    let order = bool_col(vec![true, false, true, true]);
    let call = WindowCall::new(vec![Arg::Column(input)]).with_order(order);

    let rank = column_out(fenster::exec::window::evaluate(WindowFunction::Rank, &call).unwrap());
    assert_eq!(i64_vec(&rank), vec![Some(1), Some(1), Some(3), Some(4)]);

    let dense =
        column_out(fenster::exec::window::evaluate(WindowFunction::DenseRank, &call).unwrap());
    assert_eq!(i64_vec(&dense), vec![Some(1), Some(1), Some(2), Some(3)]);
}

#[test]
fn rows_bound_codes_against_hand_computed_frames() {
    let input = int64_col((0..5).map(Some).collect());
    let expected: [(i32, Vec<i64>); 6] = [
        (0, vec![0, 0, 1, 2, 3]),
        (1, vec![1, 2, 3, 4, 5]),
        (2, vec![0, 1, 2, 3, 4]),
        (3, vec![2, 3, 4, 5, 5]),
        (4, vec![0, 0, 1, 2, 3]),
        (5, vec![2, 3, 4, 5, 5]),
    ];
    for (code, want) in expected {
        let spec = FrameSpec::from_codes(0, code, 0).unwrap();
        // static and per-row limits must agree.
        let via_static =
            window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec).unwrap();
        let ones = int64_col(vec![Some(1); 5]);
        let via_dynamic = window_bounds(&input, None, &Arg::Column(ones), &spec).unwrap();
        let got_static: Vec<i64> = i64_vec(&via_static).into_iter().flatten().collect();
        let got_dynamic: Vec<i64> = i64_vec(&via_dynamic).into_iter().flatten().collect();
        assert_eq!(got_static, want, "bound code {code}");
        assert_eq!(got_dynamic, want, "bound code {code} (dynamic)");
    }
}

#[test]
fn rows_following_with_max_limit_reports_overflow() {
    let input = int64_col((0..4).map(Some).collect());
    let spec = FrameSpec::from_codes(0, 3, 0).unwrap();
    let err = window_bounds(
        &input,
        None,
        &Arg::Scalar(ScalarValue::Int64(i64::MAX)),
        &spec,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "window_bound: 22003!overflow in calculation"
    );
}

#[test]
fn first_and_last_value_treat_nil_as_frame_member() {
    let input = int64_col(vec![Some(5), None, Some(7)]);
    let start = unbounded_bounds(3, None, true).unwrap();
    let end = unbounded_bounds(3, None, false).unwrap();
    let call = WindowCall::new(vec![Arg::Column(input)]).with_bounds(start, end);

    let first =
        column_out(fenster::exec::window::evaluate(WindowFunction::FirstValue, &call).unwrap());
    assert_eq!(i64_vec(&first), vec![Some(5), Some(5), Some(5)]);

    let last =
        column_out(fenster::exec::window::evaluate(WindowFunction::LastValue, &call).unwrap());
    assert_eq!(i64_vec(&last), vec![Some(7), Some(7), Some(7)]);
}

#[test]
fn ntile_buckets_over_ten_rows() {
    let registry = Registry::standard();
    let input = int64_col((0..10).map(Some).collect());
    let call = WindowCall::new(vec![
        Arg::Column(input),
        Arg::Scalar(ScalarValue::Int64(3)),
    ]);
    let out = column_out(registry.evaluate("ntile", &call).expect("ntile"));
    let tiles = i64_vec(&out);
    for t in 1..=3i64 {
        let size = tiles.iter().filter(|v| **v == Some(t)).count();
        let want = if t == 1 { 4 } else { 3 };
        assert_eq!(size, want, "bucket {t}");
    }
}

#[test]
fn lag_and_lead_are_dual_under_negative_offsets() {
    let input = int64_col((1..=5).map(Some).collect());
    let lag_neg = WindowCall::new(vec![
        Arg::Column(input.clone()),
        Arg::Scalar(ScalarValue::Int64(-2)),
    ]);
    let lead_pos = WindowCall::new(vec![
        Arg::Column(input),
        Arg::Scalar(ScalarValue::Int64(2)),
    ]);
    let a = column_out(fenster::exec::window::evaluate(WindowFunction::Lag, &lag_neg).unwrap());
    let b = column_out(fenster::exec::window::evaluate(WindowFunction::Lead, &lead_pos).unwrap());
    assert_eq!(i64_vec(&a), i64_vec(&b));
    assert_eq!(i64_vec(&a), vec![Some(3), Some(4), Some(5), None, None]);
}

#[test]
fn range_frames_drive_a_moving_sum() {
    // values sorted; RANGE BETWEEN 1 PRECEDING AND 1 FOLLOWING.
    let input = int64_col(vec![Some(1), Some(2), Some(4), Some(5)]);
    let s_spec = FrameSpec::from_codes(1, 0, 0).unwrap();
    let e_spec = FrameSpec::from_codes(1, 1, 0).unwrap();
    let one = Arg::Scalar(ScalarValue::Int64(1));
    let start = window_bounds(&input, None, &one, &s_spec).unwrap();
    let end = window_bounds(&input, None, &one, &e_spec).unwrap();
    let call = WindowCall::new(vec![Arg::Column(input)]).with_bounds(start, end);
    let out = column_out(fenster::exec::window::evaluate(WindowFunction::Sum, &call).unwrap());
    assert_eq!(i64_vec(&out), vec![Some(3), Some(3), Some(9), Some(9)]);
}

#[test]
fn group_concat_with_custom_separator() {
    let registry = Registry::standard();
    let input = Column::new(Arc::new(StringArray::from(vec![
        Some("x"),
        None,
        Some("z"),
    ])));
    let start = unbounded_bounds(3, None, true).unwrap();
    let end = unbounded_bounds(3, None, false).unwrap();
    let call = WindowCall::new(vec![
        Arg::Column(input),
        Arg::Scalar(ScalarValue::Utf8("|".to_string())),
    ])
    .with_bounds(start, end);
    let out = column_out(registry.evaluate("group_concat", &call).expect("group_concat"));
    let arr = out
        .values()
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8 output");
    assert_eq!(arr.value(0), "x|z");
}

#[test]
fn statistics_over_running_frames() {
    let input = int64_col(vec![Some(2), Some(4), Some(6)]);
    let (start, end) = running_frame(3, None, &input);
    let call = WindowCall::new(vec![Arg::Column(input)]).with_bounds(start, end);

    let var =
        column_out(fenster::exec::window::evaluate(WindowFunction::VarSamp, &call).unwrap());
    let arr = var
        .values()
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("float64 output");
    assert!(arr.is_null(0));
    assert_eq!(arr.value(1), 2.0);
    assert_eq!(arr.value(2), 4.0);
}

#[test]
fn degenerate_scalar_calls_through_registry() {
    let registry = Registry::standard();
    let call = WindowCall::new(vec![Arg::Scalar(ScalarValue::Int64(42))]);
    match registry.evaluate("row_number", &call).unwrap() {
        Output::Scalar(v) => assert_eq!(v, ScalarValue::Int64(1)),
        Output::Column(_) => panic!("expected scalar output"),
    }
    match registry.evaluate("sum", &call).unwrap() {
        Output::Scalar(v) => assert_eq!(v, ScalarValue::Int64(42)),
        Output::Column(_) => panic!("expected scalar output"),
    }
}

#[test]
fn groups_unit_rejects_non_boolean_probe() {
    let input = int64_col(vec![Some(1), Some(2)]);
    let spec = FrameSpec::from_codes(2, 0, 0).unwrap();
    let err = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &spec)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { .. }), "{err}");
}
