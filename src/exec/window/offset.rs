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
//! Offset and positional access family: first/last/nth value over frame
//! bounds, lag/lead over partitions.
//!
//! All functions build a UInt32 index column (null index = nil output row)
//! and materialize through the `take` kernel, so value handling is uniform
//! across element types.
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Scalar, UInt32Builder};
use arrow::compute::kernels::zip::zip;
use arrow::compute::take;

use crate::common::error::{EngineError, Result};
use crate::exec::column::{Column, ScalarValue, scalar_i64};
use crate::exec::window::{Arg, bound_column, boolean_marker, frame_at, partitions_of};

enum Pick<'a> {
    First,
    Last,
    Nth(&'a Arg),
}

pub fn first_value(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "first_value";
    value_at_frame(FUNC, input, start, end, Pick::First)
}

pub fn last_value(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "last_value";
    value_at_frame(FUNC, input, start, end, Pick::Last)
}

/// `n` counts from 1 at the frame start; a nil `n` or one past the frame
/// end yields a nil row, a non-positive one aborts the call.
pub fn nth_value(input: &Column, n: &Arg, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "nth_value";
    if let Arg::Column(c) = n {
        if c.len() != input.len() {
            return Err(EngineError::invalid(
                FUNC,
                format!("nth column length {} != row count {}", c.len(), input.len()),
            ));
        }
    }
    value_at_frame(FUNC, input, start, end, Pick::Nth(n))
}

fn value_at_frame(
    func: &'static str,
    input: &Column,
    start: &Column,
    end: &Column,
    pick: Pick<'_>,
) -> Result<Column> {
    let rows = input.len();
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;

    let mut indices = UInt32Builder::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        if fs >= fe {
            indices.append_null();
            continue;
        }
        let idx = match &pick {
            Pick::First => Some(fs),
            Pick::Last => Some(fe - 1),
            Pick::Nth(arg) => {
                let n = match arg {
                    Arg::Scalar(v) => {
                        if v.is_null() {
                            None
                        } else {
                            Some(v.as_i64().ok_or_else(|| {
                                EngineError::unsupported(func, v.type_name())
                            })?)
                        }
                    }
                    Arg::Column(c) => {
                        if c.is_nil(k) {
                            None
                        } else {
                            Some(scalar_i64(func, c.values().as_ref(), k)?)
                        }
                    }
                };
                match n {
                    None => None,
                    Some(n) if n < 1 => {
                        return Err(EngineError::domain(
                            func,
                            format!("argument 2 must be positive, got {n}"),
                        ));
                    }
                    Some(n) => {
                        let target = fs as i64 + (n - 1);
                        if target < fe as i64 { Some(target as usize) } else { None }
                    }
                }
            }
        };
        match idx {
            Some(i) => {
                let i = u32::try_from(i).map_err(|_| EngineError::overflow(func))?;
                indices.append_value(i);
            }
            None => indices.append_null(),
        }
    }

    let idx_arr = Arc::new(indices.finish()) as ArrayRef;
    let taken = take(input.values().as_ref(), idx_arr.as_ref(), None)
        .map_err(|e| EngineError::from_arrow(func, e))?;
    Ok(Column::new(taken))
}

/// Shared lag/lead kernel. A negative offset flips to the dual function;
/// a nil offset disables the shift entirely.
pub fn lead_lag(
    input: &Column,
    offset: &ScalarValue,
    default: &ScalarValue,
    partition: Option<&Column>,
    is_lag: bool,
) -> Result<Column> {
    let func: &'static str = if is_lag { "lag" } else { "lead" };
    let rows = input.len();
    let marker = match partition {
        Some(p) => Some(boolean_marker(func, p, rows, "partition")?),
        None => None,
    };

    if offset.is_null() {
        return Ok(Column::new(input.values().clone()));
    }
    let raw = offset
        .as_i64()
        .ok_or_else(|| EngineError::unsupported(func, offset.type_name()))?;
    // lag(-n) == lead(n) and vice versa.
    let (is_lag, off) = if raw < 0 {
        let flipped = raw.checked_neg().ok_or_else(|| EngineError::overflow(func))?;
        (!is_lag, flipped)
    } else {
        (is_lag, raw)
    };

    let has_default = !default.is_null();
    let mut indices = UInt32Builder::with_capacity(rows);
    let mut use_default = BooleanBuilder::with_capacity(rows);
    for (j, i) in partitions_of(marker, rows) {
        for k in j..i {
            let target = if is_lag {
                (k as i64).checked_sub(off)
            } else {
                (k as i64).checked_add(off)
            };
            let in_partition =
                target.filter(|t| *t >= j as i64 && *t < i as i64);
            match in_partition {
                Some(t) => {
                    let t = u32::try_from(t).map_err(|_| EngineError::overflow(func))?;
                    indices.append_value(t);
                    use_default.append_value(false);
                }
                None => {
                    indices.append_null();
                    use_default.append_value(has_default);
                }
            }
        }
    }

    let idx_arr = Arc::new(indices.finish()) as ArrayRef;
    let taken = take(input.values().as_ref(), idx_arr.as_ref(), None)
        .map_err(|e| EngineError::from_arrow(func, e))?;

    if has_default {
        let def = default.to_singleton_array(func, input.data_type())?;
        let mask = use_default.finish();
        let out = zip(&mask, &Scalar::new(def), &taken)
            .map_err(|e| EngineError::from_arrow(func, e))?;
        return Ok(Column::new(out));
    }
    Ok(Column::new(taken))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, BooleanArray, Int64Array, StringArray};

    fn int64_col(values: Vec<Option<i64>>) -> Column {
        Column::new(Arc::new(Int64Array::from(values)))
    }

    fn bounds(values: Vec<i64>) -> Column {
        Column::new(Arc::new(Int64Array::from(values)))
    }

    fn i64_vec(col: &Column) -> Vec<Option<i64>> {
        let arr = col
            .values()
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int64");
        (0..arr.len())
            .map(|i| if arr.is_null(i) { None } else { Some(arr.value(i)) })
            .collect()
    }

    #[test]
    fn first_and_last_keep_nil_frame_members() {
        // whole-column frame over [5, nil, 7].
        let input = int64_col(vec![Some(5), None, Some(7)]);
        let s = bounds(vec![0, 0, 0]);
        let e = bounds(vec![3, 3, 3]);
        let first = first_value(&input, &s, &e).unwrap();
        assert_eq!(i64_vec(&first), vec![Some(5), Some(5), Some(5)]);
        let last = last_value(&input, &s, &e).unwrap();
        assert_eq!(i64_vec(&last), vec![Some(7), Some(7), Some(7)]);
        // a frame ending on the nil row emits nil, not 5.
        let e2 = bounds(vec![2, 2, 2]);
        let last2 = last_value(&input, &s, &e2).unwrap();
        assert_eq!(i64_vec(&last2), vec![None, None, None]);
    }

    #[test]
    fn empty_frame_is_nil() {
        let input = int64_col(vec![Some(1), Some(2)]);
        let s = bounds(vec![1, 2]);
        let e = bounds(vec![1, 2]);
        let out = first_value(&input, &s, &e).unwrap();
        assert_eq!(i64_vec(&out), vec![None, None]);
    }

    #[test]
    fn nth_value_counts_from_frame_start() {
        let input = int64_col((10..14).map(Some).collect());
        let s = bounds(vec![0, 0, 0, 0]);
        let e = bounds(vec![4, 4, 4, 4]);
        let out = nth_value(&input, &Arg::Scalar(ScalarValue::Int64(2)), &s, &e).unwrap();
        assert_eq!(i64_vec(&out), vec![Some(11); 4]);
        // beyond the frame: nil.
        let out = nth_value(&input, &Arg::Scalar(ScalarValue::Int64(9)), &s, &e).unwrap();
        assert_eq!(i64_vec(&out), vec![None; 4]);
    }

    #[test]
    fn nth_value_rejects_non_positive_n() {
        let input = int64_col(vec![Some(1)]);
        let s = bounds(vec![0]);
        let e = bounds(vec![1]);
        let err =
            nth_value(&input, &Arg::Scalar(ScalarValue::Int64(0)), &s, &e).unwrap_err();
        assert!(matches!(err, EngineError::Domain { .. }), "{err}");
    }

    #[test]
    fn nth_value_per_row_n() {
        let input = int64_col((10..13).map(Some).collect());
        let s = bounds(vec![0, 0, 0]);
        let e = bounds(vec![3, 3, 3]);
        let n = int64_col(vec![Some(1), None, Some(3)]);
        let out = nth_value(&input, &Arg::Column(n), &s, &e).unwrap();
        assert_eq!(i64_vec(&out), vec![Some(10), None, Some(12)]);
    }

    #[test]
    fn lag_with_default() {
        let input = int64_col((1..=4).map(Some).collect());
        let out = lead_lag(
            &input,
            &ScalarValue::Int64(2),
            &ScalarValue::Int64(-1),
            None,
            true,
        )
        .unwrap();
        assert_eq!(i64_vec(&out), vec![Some(-1), Some(-1), Some(1), Some(2)]);
    }

    #[test]
    fn lead_nil_default() {
        let input = int64_col((1..=3).map(Some).collect());
        let out = lead_lag(&input, &ScalarValue::Int64(1), &ScalarValue::Null, None, false)
            .unwrap();
        assert_eq!(i64_vec(&out), vec![Some(2), Some(3), None]);
    }

    #[test]
    fn negative_offset_flips_direction() {
        let input = int64_col((1..=3).map(Some).collect());
        let lagged = lead_lag(
            &input,
            &ScalarValue::Int64(-1),
            &ScalarValue::Null,
            None,
            true,
        )
        .unwrap();
        let led = lead_lag(&input, &ScalarValue::Int64(1), &ScalarValue::Null, None, false)
            .unwrap();
        assert_eq!(i64_vec(&lagged), i64_vec(&led));
    }

    #[test]
    fn nil_offset_copies_input() {
        let input = int64_col(vec![Some(1), None, Some(3)]);
        let out = lead_lag(&input, &ScalarValue::Null, &ScalarValue::Null, None, true)
            .unwrap();
        assert_eq!(i64_vec(&out), vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn lag_respects_partition_marker() {
        let input = int64_col((1..=4).map(Some).collect());
        let marker = Column::new(Arc::new(BooleanArray::from(vec![
            false, false, true, false,
        ])));
        let out = lead_lag(
            &input,
            &ScalarValue::Int64(1),
            &ScalarValue::Null,
            Some(&marker),
            true,
        )
        .unwrap();
        assert_eq!(i64_vec(&out), vec![None, Some(1), None, Some(3)]);
    }

    #[test]
    fn lead_lag_works_on_strings() {
        let input = Column::new(Arc::new(StringArray::from(vec!["a", "b", "c"])));
        let out = lead_lag(
            &input,
            &ScalarValue::Int64(1),
            &ScalarValue::Utf8("-".to_string()),
            None,
            true,
        )
        .unwrap();
        let arr = out
            .values()
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("utf8");
        let got: Vec<&str> = (0..3).map(|i| arr.value(i)).collect();
        assert_eq!(got, vec!["-", "a", "b"]);
    }
}
