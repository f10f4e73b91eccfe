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
//! Frame bound calculator.
//!
//! Responsibilities:
//! - `window_bounds`: one Int64 boundary column per call (the SQL layer
//!   invokes it once per frame edge), for ROWS / RANGE / GROUPS units with
//!   static or per-row limits.
//! - All index arithmetic is checked; any overflow aborts the whole call.
//!
//! Current limitations: only EXCLUDE NO OTHERS (enforced upstream by the
//! frame-spec decoder).
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Int64Array, PrimitiveArray, StringArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type,
};

use crate::common::error::{EngineError, Result};
use crate::exec::column::{Column, downcast, is_integer_type, scalar_f64, scalar_i64};
use crate::exec::window::frame::{FrameSpec, FrameUnit};
use crate::exec::window::{Arg, bit, boolean_marker, partitions_of};

const FUNC: &str = "window_bound";

/// Compute one boundary column for `spec` over `input`, honoring the
/// partition marker column when present. The result is an Int64 column of
/// row indices: inclusive starts for first-half bounds, exclusive ends for
/// second-half bounds.
pub fn window_bounds(
    input: &Column,
    partition: Option<&Column>,
    limit: &Arg,
    spec: &FrameSpec,
) -> Result<Column> {
    let rows = input.len();
    let marker = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let parts = partitions_of(marker, rows);
    let mut rb: Vec<i64> = Vec::with_capacity(rows);

    match spec.unit {
        FrameUnit::Rows => {
            let lim = int_limit(limit, rows)?;
            for &(j, i) in &parts {
                rows_bounds(&mut rb, j, i, &lim, spec)?;
            }
        }
        FrameUnit::Groups => {
            let bits = downcast::<BooleanArray>(FUNC, input.values().as_ref());
            let bits = match input.data_type() {
                DataType::Boolean => bits?,
                other => {
                    return Err(EngineError::invalid(
                        FUNC,
                        format!("GROUPS unit needs a boolean boundary column, got {other:?}"),
                    ));
                }
            };
            let lim = int_limit(limit, rows)?;
            for &(j, i) in &parts {
                groups_bounds(&mut rb, bits, j, i, &lim, spec.preceding)?;
            }
        }
        FrameUnit::Range => {
            range_dispatch(&mut rb, input, &parts, limit, spec.preceding)?;
        }
    }

    let array: ArrayRef = Arc::new(Int64Array::from(rb));
    Ok(Column::new(array))
}

/// Both edges of a two-edged frame; preserves `start[k] <= end[k]` for
/// ROWS/GROUPS by construction of the edge specs.
pub fn frame_bounds(
    input: &Column,
    partition: Option<&Column>,
    start: (&Arg, &FrameSpec),
    end: (&Arg, &FrameSpec),
) -> Result<(Column, Column)> {
    let s = window_bounds(input, partition, start.0, start.1)?;
    let e = window_bounds(input, partition, end.0, end.1)?;
    Ok((s, e))
}

/// UNBOUNDED PRECEDING / UNBOUNDED FOLLOWING edges: the partition extent
/// itself, no limit arithmetic involved.
pub fn unbounded_bounds(
    rows: usize,
    partition: Option<&Column>,
    preceding: bool,
) -> Result<Column> {
    let marker = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let mut rb: Vec<i64> = Vec::with_capacity(rows);
    for (j, i) in partitions_of(marker, rows) {
        let edge = if preceding { j as i64 } else { i as i64 };
        for _ in j..i {
            rb.push(edge);
        }
    }
    let array: ArrayRef = Arc::new(Int64Array::from(rb));
    Ok(Column::new(array))
}

enum IntLimit<'a> {
    Static(i64),
    Dynamic(&'a dyn Array),
}

impl IntLimit<'_> {
    fn at(&self, k: usize) -> Result<i64> {
        match self {
            IntLimit::Static(v) => Ok(*v),
            IntLimit::Dynamic(a) => {
                if a.is_null(k) {
                    return Err(EngineError::invalid(FUNC, "nil limit in frame bound"));
                }
                scalar_i64(FUNC, *a, k)
            }
        }
    }
}

fn int_limit<'a>(limit: &'a Arg, rows: usize) -> Result<IntLimit<'a>> {
    match limit {
        Arg::Scalar(s) => {
            if s.is_null() {
                return Err(EngineError::invalid(FUNC, "nil limit in frame bound"));
            }
            s.as_i64()
                .map(IntLimit::Static)
                .ok_or_else(|| EngineError::unsupported(FUNC, s.type_name()))
        }
        Arg::Column(c) => {
            if c.len() != rows {
                return Err(EngineError::invalid(
                    FUNC,
                    format!("limit column length {} != row count {rows}", c.len()),
                ));
            }
            if !is_integer_type(c.data_type()) {
                return Err(EngineError::unsupported(FUNC, format!("{:?}", c.data_type())));
            }
            Ok(IntLimit::Dynamic(c.values().as_ref()))
        }
    }
}

enum FloatLimit<'a> {
    Static(f64),
    Dynamic(&'a dyn Array),
}

impl FloatLimit<'_> {
    fn at(&self, k: usize) -> Result<f64> {
        match self {
            FloatLimit::Static(v) => Ok(*v),
            FloatLimit::Dynamic(a) => {
                if a.is_null(k) {
                    return Err(EngineError::invalid(FUNC, "nil limit in frame bound"));
                }
                scalar_f64(FUNC, *a, k)
            }
        }
    }
}

/// Float limits are only valid against the matching float column type.
fn float_limit<'a>(limit: &'a Arg, rows: usize, want: &DataType) -> Result<FloatLimit<'a>> {
    match limit {
        Arg::Scalar(s) => match (s, want) {
            (crate::exec::column::ScalarValue::Float32(v), DataType::Float32) => {
                Ok(FloatLimit::Static(*v as f64))
            }
            (crate::exec::column::ScalarValue::Float64(v), DataType::Float64) => {
                Ok(FloatLimit::Static(*v))
            }
            (crate::exec::column::ScalarValue::Null, _) => {
                Err(EngineError::invalid(FUNC, "nil limit in frame bound"))
            }
            _ => Err(EngineError::unsupported(FUNC, s.type_name())),
        },
        Arg::Column(c) => {
            if c.len() != rows {
                return Err(EngineError::invalid(
                    FUNC,
                    format!("limit column length {} != row count {rows}", c.len()),
                ));
            }
            if c.data_type() != want {
                return Err(EngineError::unsupported(FUNC, format!("{:?}", c.data_type())));
            }
            Ok(FloatLimit::Dynamic(c.values().as_ref()))
        }
    }
}

/// ROWS: pure index arithmetic. The `1 - first_half` adjustment turns a
/// second-half bound into an exclusive end.
fn rows_bounds(
    rb: &mut Vec<i64>,
    j: usize,
    i: usize,
    limit: &IntLimit<'_>,
    spec: &FrameSpec,
) -> Result<()> {
    let adjust: i64 = if spec.first_half { 0 } else { 1 };
    for k in j..i {
        let l = limit.at(k)?;
        let calc = if spec.preceding {
            (k as i64)
                .checked_sub(l)
                .and_then(|v| v.checked_add(adjust))
                .ok_or_else(|| EngineError::overflow(FUNC))?
                .max(j as i64)
        } else {
            (k as i64)
                .checked_add(l)
                .and_then(|v| v.checked_add(adjust))
                .ok_or_else(|| EngineError::overflow(FUNC))?
                .min(i as i64)
        };
        rb.push(calc);
    }
    Ok(())
}

/// GROUPS: walk the boundary bits, consuming one limit unit per set bit.
fn groups_bounds(
    rb: &mut Vec<i64>,
    bits: &BooleanArray,
    j: usize,
    i: usize,
    limit: &IntLimit<'_>,
    preceding: bool,
) -> Result<()> {
    if preceding {
        for k in j..i {
            let mut r = limit.at(k)?;
            let mut jj = k as i64;
            loop {
                if jj == j as i64 {
                    break;
                }
                if bit(bits, jj as usize) {
                    if r == 0 {
                        break;
                    }
                    r -= 1;
                }
                jj -= 1;
            }
            rb.push(jj);
        }
    } else {
        for k in j..i {
            let mut r = limit.at(k)?;
            let mut jj = k + 1;
            while jj < i {
                if bit(bits, jj) {
                    if r == 0 {
                        break;
                    }
                    r -= 1;
                }
                jj += 1;
            }
            rb.push(jj as i64);
        }
    }
    Ok(())
}

/// Promotion of a range element into its distance accumulator. Integer
/// inputs widen one step so the subtraction itself cannot wrap; the checked
/// ops still guard the widest case.
trait RangeElement: Copy {
    type Acc: Copy + PartialOrd;
    fn promote(self) -> Self::Acc;
    fn abs_delta(a: Self::Acc, b: Self::Acc) -> Option<Self::Acc>;
}

macro_rules! impl_range_element_int {
    ($native:ty, $acc:ty) => {
        impl RangeElement for $native {
            type Acc = $acc;
            fn promote(self) -> $acc {
                self as $acc
            }
            fn abs_delta(a: $acc, b: $acc) -> Option<$acc> {
                a.checked_sub(b).and_then(<$acc>::checked_abs)
            }
        }
    };
}

impl_range_element_int!(i8, i64);
impl_range_element_int!(i16, i64);
impl_range_element_int!(i32, i64);
impl_range_element_int!(i64, i128);

macro_rules! impl_range_element_float {
    ($native:ty) => {
        impl RangeElement for $native {
            type Acc = f64;
            fn promote(self) -> f64 {
                self as f64
            }
            fn abs_delta(a: f64, b: f64) -> Option<f64> {
                Some((a - b).abs())
            }
        }
    };
}

impl_range_element_float!(f32);
impl_range_element_float!(f64);

/// RANGE over a fixed-width column: walk outward from each row while the
/// promoted distance stays within the limit. Nil rows form a run matched
/// only against other nils.
fn range_bounds_fixed<T>(
    rb: &mut Vec<i64>,
    values: &PrimitiveArray<T>,
    parts: &[(usize, usize)],
    limit_at: &dyn Fn(usize) -> Result<<T::Native as RangeElement>::Acc>,
    preceding: bool,
) -> Result<()>
where
    T: ArrowPrimitiveType,
    T::Native: RangeElement,
{
    for &(j, i) in parts {
        for k in j..i {
            let lim = limit_at(k)?;
            if preceding {
                let mut jj = k as i64;
                let m = j as i64;
                if values.is_null(k) {
                    while jj >= m && values.is_null(jj as usize) {
                        jj -= 1;
                    }
                } else {
                    let v = values.value(k).promote();
                    while jj >= m {
                        if values.is_null(jj as usize) {
                            break;
                        }
                        let u = values.value(jj as usize).promote();
                        let delta = <T::Native as RangeElement>::abs_delta(v, u)
                            .ok_or_else(|| EngineError::overflow(FUNC))?;
                        if delta > lim {
                            break;
                        }
                        jj -= 1;
                    }
                }
                rb.push(jj + 1);
            } else {
                let mut jj = k + 1;
                if values.is_null(k) {
                    while jj < i && values.is_null(jj) {
                        jj += 1;
                    }
                } else {
                    let v = values.value(k).promote();
                    while jj < i {
                        if values.is_null(jj) {
                            break;
                        }
                        let u = values.value(jj).promote();
                        let delta = <T::Native as RangeElement>::abs_delta(v, u)
                            .ok_or_else(|| EngineError::overflow(FUNC))?;
                        if delta > lim {
                            break;
                        }
                        jj += 1;
                    }
                }
                rb.push(jj as i64);
            }
        }
    }
    Ok(())
}

/// RANGE over Utf8: comparator distance (0 for equal keys, 1 otherwise)
/// against the integer limit, so limit 0 selects the peer run.
fn range_bounds_utf8(
    rb: &mut Vec<i64>,
    values: &StringArray,
    parts: &[(usize, usize)],
    limit: &IntLimit<'_>,
    preceding: bool,
) -> Result<()> {
    let distance = |a: &str, b: &str| -> i64 {
        if a == b { 0 } else { 1 }
    };
    for &(j, i) in parts {
        for k in j..i {
            let lim = limit.at(k)?;
            if preceding {
                let mut jj = k as i64;
                let m = j as i64;
                if values.is_null(k) {
                    while jj >= m && values.is_null(jj as usize) {
                        jj -= 1;
                    }
                } else {
                    let v = values.value(k);
                    while jj >= m {
                        if values.is_null(jj as usize) {
                            break;
                        }
                        if distance(v, values.value(jj as usize)) > lim {
                            break;
                        }
                        jj -= 1;
                    }
                }
                rb.push(jj + 1);
            } else {
                let mut jj = k + 1;
                if values.is_null(k) {
                    while jj < i && values.is_null(jj) {
                        jj += 1;
                    }
                } else {
                    let v = values.value(k);
                    while jj < i {
                        if values.is_null(jj) {
                            break;
                        }
                        if distance(v, values.value(jj)) > lim {
                            break;
                        }
                        jj += 1;
                    }
                }
                rb.push(jj as i64);
            }
        }
    }
    Ok(())
}

fn range_dispatch(
    rb: &mut Vec<i64>,
    input: &Column,
    parts: &[(usize, usize)],
    limit: &Arg,
    preceding: bool,
) -> Result<()> {
    let rows = input.len();
    let array = input.values().as_ref();
    match input.data_type() {
        DataType::Int8 => {
            let lim = int_limit(limit, rows)?;
            let values = downcast::<PrimitiveArray<Int8Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k);
            range_bounds_fixed::<Int8Type>(rb, values, parts, &at, preceding)
        }
        DataType::Int16 => {
            let lim = int_limit(limit, rows)?;
            let values = downcast::<PrimitiveArray<Int16Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k);
            range_bounds_fixed::<Int16Type>(rb, values, parts, &at, preceding)
        }
        DataType::Int32 => {
            let lim = int_limit(limit, rows)?;
            let values = downcast::<PrimitiveArray<Int32Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k);
            range_bounds_fixed::<Int32Type>(rb, values, parts, &at, preceding)
        }
        DataType::Int64 => {
            let lim = int_limit(limit, rows)?;
            let values = downcast::<PrimitiveArray<Int64Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k).map(|v| v as i128);
            range_bounds_fixed::<Int64Type>(rb, values, parts, &at, preceding)
        }
        DataType::Float32 => {
            let lim = float_limit(limit, rows, &DataType::Float32)?;
            let values = downcast::<PrimitiveArray<Float32Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k);
            range_bounds_fixed::<Float32Type>(rb, values, parts, &at, preceding)
        }
        DataType::Float64 => {
            let lim = float_limit(limit, rows, &DataType::Float64)?;
            let values = downcast::<PrimitiveArray<Float64Type>>(FUNC, array)?;
            let at = |k: usize| lim.at(k);
            range_bounds_fixed::<Float64Type>(rb, values, parts, &at, preceding)
        }
        DataType::Utf8 => {
            let lim = int_limit(limit, rows)?;
            let values = downcast::<StringArray>(FUNC, array)?;
            range_bounds_utf8(rb, values, parts, &lim, preceding)
        }
        other => Err(EngineError::unsupported(FUNC, format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::column::ScalarValue;
    use crate::exec::window::frame::FrameSpec;

    fn int64_col(values: Vec<Option<i64>>) -> Column {
        Column::new(Arc::new(Int64Array::from(values)))
    }

    fn bool_col(values: Vec<bool>) -> Column {
        Column::new(Arc::new(BooleanArray::from(values)))
    }

    fn bounds_vec(col: &Column) -> Vec<i64> {
        let arr = col
            .values()
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int64 bounds");
        (0..arr.len()).map(|i| arr.value(i)).collect()
    }

    #[test]
    fn rows_preceding_start_clamps_to_partition() {
        let input = int64_col((0..5).map(Some).collect());
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let out = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(2)), &spec).unwrap();
        assert_eq!(bounds_vec(&out), vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn rows_following_end_clamps_to_partition() {
        let input = int64_col((0..5).map(Some).collect());
        // bound code 3: X FOLLOWING as exclusive end.
        let spec = FrameSpec::from_codes(0, 3, 0).unwrap();
        let out = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec).unwrap();
        assert_eq!(bounds_vec(&out), vec![2, 3, 4, 5, 5]);
    }

    #[test]
    fn rows_current_row_codes() {
        let input = int64_col((0..3).map(Some).collect());
        let start = FrameSpec::from_codes(0, 4, 0).unwrap();
        let end = FrameSpec::from_codes(0, 5, 0).unwrap();
        let zero = Arg::Scalar(ScalarValue::Int64(0));
        let s = window_bounds(&input, None, &zero, &start).unwrap();
        let e = window_bounds(&input, None, &zero, &end).unwrap();
        assert_eq!(bounds_vec(&s), vec![0, 1, 2]);
        assert_eq!(bounds_vec(&e), vec![1, 2, 3]);
    }

    #[test]
    fn rows_following_max_limit_overflows() {
        let input = int64_col((0..4).map(Some).collect());
        let spec = FrameSpec::from_codes(0, 3, 0).unwrap();
        let err = window_bounds(
            &input,
            None,
            &Arg::Scalar(ScalarValue::Int64(i64::MAX)),
            &spec,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Overflow { .. }), "{err}");
    }

    #[test]
    fn rows_preceding_max_limit_saturates_to_start() {
        let input = int64_col((0..4).map(Some).collect());
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let out = window_bounds(
            &input,
            None,
            &Arg::Scalar(ScalarValue::Int64(i64::MAX)),
            &spec,
        )
        .unwrap();
        assert_eq!(bounds_vec(&out), vec![0, 0, 0, 0]);
    }

    #[test]
    fn rows_respects_partition_marker() {
        let input = int64_col((0..6).map(Some).collect());
        let marker = bool_col(vec![false, false, false, true, false, false]);
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let out = window_bounds(
            &input,
            Some(&marker),
            &Arg::Scalar(ScalarValue::Int64(1)),
            &spec,
        )
        .unwrap();
        assert_eq!(bounds_vec(&out), vec![0, 0, 1, 3, 3, 4]);
    }

    #[test]
    fn rows_dynamic_limit_per_row() {
        let input = int64_col((0..4).map(Some).collect());
        let limits = int64_col(vec![Some(0), Some(1), Some(2), Some(3)]);
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let out = window_bounds(&input, None, &Arg::Column(limits), &spec).unwrap();
        assert_eq!(bounds_vec(&out), vec![0, 0, 0, 0]);
    }

    #[test]
    fn rows_dynamic_nil_limit_is_invalid() {
        let input = int64_col((0..3).map(Some).collect());
        let limits = int64_col(vec![Some(0), None, Some(1)]);
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let err = window_bounds(&input, None, &Arg::Column(limits), &spec).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }), "{err}");
    }

    #[test]
    fn rows_rejects_float_limit() {
        let input = int64_col((0..3).map(Some).collect());
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let err = window_bounds(
            &input,
            None,
            &Arg::Scalar(ScalarValue::Float64(1.0)),
            &spec,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedType { .. }), "{err}");
    }

    #[test]
    fn groups_requires_boolean_input() {
        let input = int64_col((0..3).map(Some).collect());
        let spec = FrameSpec::from_codes(2, 0, 0).unwrap();
        let err = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &spec)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }), "{err}");
    }

    #[test]
    fn groups_preceding_finds_group_starts() {
        // groups: [0,1] [2] [3,4]
        let input = bool_col(vec![false, false, true, true, false]);
        let spec = FrameSpec::from_codes(2, 0, 0).unwrap();
        let zero = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &spec)
            .unwrap();
        assert_eq!(bounds_vec(&zero), vec![0, 0, 2, 3, 3]);
        let one = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec)
            .unwrap();
        assert_eq!(bounds_vec(&one), vec![0, 0, 0, 2, 2]);
    }

    #[test]
    fn groups_following_finds_group_ends() {
        let input = bool_col(vec![false, false, true, true, false]);
        let spec = FrameSpec::from_codes(2, 1, 0).unwrap();
        let zero = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &spec)
            .unwrap();
        assert_eq!(bounds_vec(&zero), vec![2, 2, 3, 5, 5]);
        let one = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec)
            .unwrap();
        assert_eq!(bounds_vec(&one), vec![3, 3, 5, 5, 5]);
    }

    #[test]
    fn range_int_walks_by_value_distance() {
        let input = int64_col(vec![Some(1), Some(2), Some(4), Some(8)]);
        let preceding = FrameSpec::from_codes(1, 0, 0).unwrap();
        let s = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(2)), &preceding)
            .unwrap();
        // row 2 (value 4) reaches back to value 2; row 3 (value 8) reaches nothing.
        assert_eq!(bounds_vec(&s), vec![0, 0, 1, 3]);
        let following = FrameSpec::from_codes(1, 1, 0).unwrap();
        let e = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(2)), &following)
            .unwrap();
        assert_eq!(bounds_vec(&e), vec![2, 3, 3, 4]);
    }

    #[test]
    fn range_nil_rows_form_their_own_run() {
        let input = int64_col(vec![None, None, Some(3), Some(4)]);
        let preceding = FrameSpec::from_codes(1, 0, 0).unwrap();
        let s = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &preceding)
            .unwrap();
        assert_eq!(bounds_vec(&s), vec![0, 0, 2, 3]);
        let following = FrameSpec::from_codes(1, 1, 0).unwrap();
        let e = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &following)
            .unwrap();
        assert_eq!(bounds_vec(&e), vec![2, 2, 3, 4]);
    }

    #[test]
    fn range_utf8_limit_zero_selects_peers() {
        let input = Column::new(Arc::new(StringArray::from(vec!["a", "a", "b", "c"])));
        let preceding = FrameSpec::from_codes(1, 0, 0).unwrap();
        let s = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(0)), &preceding)
            .unwrap();
        assert_eq!(bounds_vec(&s), vec![0, 0, 2, 3]);
    }

    #[test]
    fn range_float_limit_must_match_column_type() {
        let input = Column::new(Arc::new(arrow::array::Float64Array::from(vec![1.0, 2.0])));
        let spec = FrameSpec::from_codes(1, 0, 0).unwrap();
        let err = window_bounds(
            &input,
            None,
            &Arg::Scalar(ScalarValue::Float32(1.0)),
            &spec,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedType { .. }), "{err}");
        let ok = window_bounds(
            &input,
            None,
            &Arg::Scalar(ScalarValue::Float64(1.0)),
            &spec,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn range_rejects_int_limit_on_float_column() {
        let input = Column::new(Arc::new(arrow::array::Float64Array::from(vec![1.0, 2.0])));
        let spec = FrameSpec::from_codes(1, 0, 0).unwrap();
        let err = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedType { .. }), "{err}");
    }

    #[test]
    fn unbounded_edges_are_partition_extents() {
        let marker = bool_col(vec![false, false, true, false]);
        let s = unbounded_bounds(4, Some(&marker), true).unwrap();
        let e = unbounded_bounds(4, Some(&marker), false).unwrap();
        assert_eq!(bounds_vec(&s), vec![0, 0, 2, 2]);
        assert_eq!(bounds_vec(&e), vec![2, 2, 4, 4]);
    }

    #[test]
    fn empty_input_yields_empty_bounds() {
        let input = int64_col(Vec::new());
        let spec = FrameSpec::from_codes(0, 0, 0).unwrap();
        let out = window_bounds(&input, None, &Arg::Scalar(ScalarValue::Int64(1)), &spec).unwrap();
        assert!(out.is_empty());
    }
}
