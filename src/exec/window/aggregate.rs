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
//! Frame aggregation family. Every function folds the half-open frame
//! `[start[k], end[k])` for each row k.
//!
//! Integer accumulation is widened to i128 with checked ops; any overflow,
//! including narrowing the result, aborts the whole call. Floats accumulate
//! in f64 under ordinary float rules. Nils never contribute to an
//! accumulator; an entirely-nil (or empty) frame yields a nil row.
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Builder, Int64Array, Int64Builder, PrimitiveArray, PrimitiveBuilder,
    StringBuilder, UInt32Builder,
};
use arrow::compute::take;
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Int8Type, Int16Type, Int32Type, Int64Type,
};

use crate::common::app_config;
use crate::common::error::{EngineError, Result};
use crate::exec::column::{
    Column, compare_at, downcast, is_integer_type, scalar_f64, scalar_i128, scalar_str,
};
use crate::exec::window::{Arg, bound_column, frame_at};

/// Frame length, or the non-nil count when `ignore_nils` is set.
pub fn count(input: &Column, ignore_nils: bool, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "count";
    let rows = input.len();
    let s = bound_column(FUNC, start, rows, "frame start")?;
    let e = bound_column(FUNC, end, rows, "frame end")?;
    let counted_nils = !ignore_nils || !input.stats().has_nil;
    let mut out: Vec<i64> = Vec::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        if counted_nils {
            out.push((fe.saturating_sub(fs)) as i64);
        } else {
            let mut n = 0i64;
            for r in fs..fe {
                if !input.is_nil(r) {
                    n += 1;
                }
            }
            out.push(n);
        }
    }
    let array: ArrayRef = Arc::new(Int64Array::from(out));
    Ok(Column::new(array))
}

pub fn sum(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "sum";
    fold_additive(FUNC, input, start, end, false)
}

pub fn product(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "product";
    fold_additive(FUNC, input, start, end, true)
}

fn fold_additive(
    func: &'static str,
    input: &Column,
    start: &Column,
    end: &Column,
    multiply: bool,
) -> Result<Column> {
    let rows = input.len();
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;
    let values = input.values().as_ref();

    if is_integer_type(input.data_type()) {
        let mut builder = Int64Builder::with_capacity(rows);
        for k in 0..rows {
            let (fs, fe) = frame_at(s, e, k, rows);
            let mut acc: i128 = if multiply { 1 } else { 0 };
            let mut n = 0usize;
            for r in fs..fe {
                if input.is_nil(r) {
                    continue;
                }
                let v = scalar_i128(func, values, r)?;
                acc = if multiply {
                    acc.checked_mul(v)
                } else {
                    acc.checked_add(v)
                }
                .ok_or_else(|| EngineError::overflow(func))?;
                n += 1;
            }
            if n == 0 {
                builder.append_null();
            } else {
                let narrowed =
                    i64::try_from(acc).map_err(|_| EngineError::overflow(func))?;
                builder.append_value(narrowed);
            }
        }
        let array: ArrayRef = Arc::new(builder.finish());
        return Ok(Column::new(array));
    }

    match input.data_type() {
        DataType::Float32 | DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows);
            for k in 0..rows {
                let (fs, fe) = frame_at(s, e, k, rows);
                let mut acc: f64 = if multiply { 1.0 } else { 0.0 };
                let mut n = 0usize;
                for r in fs..fe {
                    if input.is_nil(r) {
                        continue;
                    }
                    let v = scalar_f64(func, values, r)?;
                    acc = if multiply { acc * v } else { acc + v };
                    n += 1;
                }
                if n == 0 {
                    builder.append_null();
                } else {
                    builder.append_value(acc);
                }
            }
            let array: ArrayRef = Arc::new(builder.finish());
            Ok(Column::new(array))
        }
        other => Err(EngineError::unsupported(func, format!("{other:?}"))),
    }
}

/// Float64 average for any numeric input.
pub fn avg(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "avg";
    let rows = input.len();
    let s = bound_column(FUNC, start, rows, "frame start")?;
    let e = bound_column(FUNC, end, rows, "frame end")?;
    let values = input.values().as_ref();
    let integer = is_integer_type(input.data_type());
    if !integer && !matches!(input.data_type(), DataType::Float32 | DataType::Float64) {
        return Err(EngineError::unsupported(FUNC, format!("{:?}", input.data_type())));
    }
    let mut builder = Float64Builder::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut n = 0i64;
        let mut int_acc: i128 = 0;
        let mut float_acc: f64 = 0.0;
        for r in fs..fe {
            if input.is_nil(r) {
                continue;
            }
            if integer {
                int_acc = int_acc
                    .checked_add(scalar_i128(FUNC, values, r)?)
                    .ok_or_else(|| EngineError::overflow(FUNC))?;
            } else {
                float_acc += scalar_f64(FUNC, values, r)?;
            }
            n += 1;
        }
        if n == 0 {
            builder.append_null();
        } else if integer {
            builder.append_value(int_acc as f64 / n as f64);
        } else {
            builder.append_value(float_acc / n as f64);
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

/// SQL exact-numeric average: truncating division, result in the input's
/// own integer type.
pub fn avg_integer(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    const FUNC: &str = "avg_integer";
    let rows = input.len();
    let s = bound_column(FUNC, start, rows, "frame start")?;
    let e = bound_column(FUNC, end, rows, "frame end")?;
    match input.data_type() {
        DataType::Int8 => avg_integer_typed::<Int8Type>(FUNC, input, s, e),
        DataType::Int16 => avg_integer_typed::<Int16Type>(FUNC, input, s, e),
        DataType::Int32 => avg_integer_typed::<Int32Type>(FUNC, input, s, e),
        DataType::Int64 => avg_integer_typed::<Int64Type>(FUNC, input, s, e),
        other => Err(EngineError::unsupported(FUNC, format!("{other:?}"))),
    }
}

fn avg_integer_typed<T>(
    func: &'static str,
    input: &Column,
    s: &Int64Array,
    e: &Int64Array,
) -> Result<Column>
where
    T: ArrowPrimitiveType,
    i128: From<T::Native>,
    T::Native: TryFrom<i128>,
{
    let rows = input.len();
    let values = downcast::<PrimitiveArray<T>>(func, input.values().as_ref())?;
    let mut builder = PrimitiveBuilder::<T>::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut acc: i128 = 0;
        let mut n: i128 = 0;
        for r in fs..fe {
            if values.is_null(r) {
                continue;
            }
            acc = acc
                .checked_add(i128::from(values.value(r)))
                .ok_or_else(|| EngineError::overflow(func))?;
            n += 1;
        }
        if n == 0 {
            builder.append_null();
        } else {
            let narrowed = <T::Native as TryFrom<i128>>::try_from(acc / n)
                .map_err(|_| EngineError::overflow(func))?;
            builder.append_value(narrowed);
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

pub fn var_samp(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    variance_impl("var_samp", input, start, end, true, false)
}

pub fn var_pop(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    variance_impl("var_pop", input, start, end, false, false)
}

pub fn stddev_samp(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    variance_impl("stddev_samp", input, start, end, true, true)
}

pub fn stddev_pop(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    variance_impl("stddev_pop", input, start, end, false, true)
}

/// Welford accumulation per frame; `sample` picks the n-1 divisor and the
/// >= 2 population requirement.
fn variance_impl(
    func: &'static str,
    input: &Column,
    start: &Column,
    end: &Column,
    sample: bool,
    sqrt: bool,
) -> Result<Column> {
    let rows = input.len();
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;
    let values = input.values().as_ref();
    let mut builder = Float64Builder::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut n = 0f64;
        let mut mean = 0f64;
        let mut m2 = 0f64;
        for r in fs..fe {
            if input.is_nil(r) {
                continue;
            }
            let x = scalar_f64(func, values, r)?;
            n += 1.0;
            let delta = x - mean;
            mean += delta / n;
            m2 += delta * (x - mean);
        }
        let enough = if sample { n > 1.0 } else { n > 0.0 };
        if !enough {
            builder.append_null();
        } else {
            let div = if sample { n - 1.0 } else { n };
            let v = m2 / div;
            builder.append_value(if sqrt { v.sqrt() } else { v });
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairStat {
    CovarSamp,
    CovarPop,
    Corr,
}

impl PairStat {
    pub fn name(self) -> &'static str {
        match self {
            PairStat::CovarSamp => "covar_samp",
            PairStat::CovarPop => "covar_pop",
            PairStat::Corr => "corr",
        }
    }
}

/// Two-column statistics over synchronized non-nil pairs.
pub fn covariance(
    x: &Column,
    y: &Column,
    start: &Column,
    end: &Column,
    stat: PairStat,
) -> Result<Column> {
    let func = stat.name();
    let rows = x.len();
    if y.len() != rows {
        return Err(EngineError::invalid(
            func,
            format!("argument lengths differ: {} vs {}", rows, y.len()),
        ));
    }
    if x.data_type() != y.data_type() {
        return Err(EngineError::invalid(
            func,
            format!(
                "argument types differ: {:?} vs {:?}",
                x.data_type(),
                y.data_type()
            ),
        ));
    }
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;
    let xs = x.values().as_ref();
    let ys = y.values().as_ref();
    let mut builder = Float64Builder::with_capacity(rows);
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut n = 0f64;
        let mut mean_x = 0f64;
        let mut mean_y = 0f64;
        let mut m2x = 0f64;
        let mut m2y = 0f64;
        let mut c2 = 0f64;
        for r in fs..fe {
            if x.is_nil(r) || y.is_nil(r) {
                continue;
            }
            let vx = scalar_f64(func, xs, r)?;
            let vy = scalar_f64(func, ys, r)?;
            n += 1.0;
            let dx = vx - mean_x;
            mean_x += dx / n;
            let dy = vy - mean_y;
            mean_y += dy / n;
            c2 += dx * (vy - mean_y);
            m2x += dx * (vx - mean_x);
            m2y += dy * (vy - mean_y);
        }
        let out = match stat {
            PairStat::CovarPop if n > 0.0 => Some(c2 / n),
            PairStat::CovarSamp if n > 1.0 => Some(c2 / (n - 1.0)),
            PairStat::Corr if n > 1.0 => {
                let denom = (m2x * m2y).sqrt();
                if denom > 0.0 { Some(c2 / denom) } else { None }
            }
            _ => None,
        };
        match out {
            Some(v) => builder.append_value(v),
            None => builder.append_null(),
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

/// One side of the pair is a constant: the covariance is zero whenever
/// enough pairs exist, and corr is undefined.
pub fn covariance_constant(
    x: &Column,
    other_is_nil: bool,
    start: &Column,
    end: &Column,
    stat: PairStat,
) -> Result<Column> {
    let func = stat.name();
    let rows = x.len();
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;
    let mut builder = Float64Builder::with_capacity(rows);
    for k in 0..rows {
        if other_is_nil || stat == PairStat::Corr {
            builder.append_null();
            continue;
        }
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut n = 0usize;
        for r in fs..fe {
            if !x.is_nil(r) {
                n += 1;
            }
        }
        let enough = match stat {
            PairStat::CovarPop => n >= 1,
            PairStat::CovarSamp => n >= 2,
            PairStat::Corr => false,
        };
        if enough {
            builder.append_value(0.0);
        } else {
            builder.append_null();
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

pub fn min(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    min_max("min", input, start, end, true)
}

pub fn max(input: &Column, start: &Column, end: &Column) -> Result<Column> {
    min_max("max", input, start, end, false)
}

fn min_max(
    func: &'static str,
    input: &Column,
    start: &Column,
    end: &Column,
    is_min: bool,
) -> Result<Column> {
    let rows = input.len();
    let s = bound_column(func, start, rows, "frame start")?;
    let e = bound_column(func, end, rows, "frame end")?;
    let values = input.values().as_ref();

    let mut indices = UInt32Builder::with_capacity(rows);
    let sliding = app_config::min_max_deque_enabled()
        && is_non_decreasing(s)
        && is_non_decreasing(e);
    if sliding {
        // Monotonic frame edges: classic monotonic-deque sliding window.
        let mut deque: VecDeque<usize> = VecDeque::new();
        let mut next = 0usize;
        for k in 0..rows {
            let (fs, fe) = frame_at(s, e, k, rows);
            while next < fe {
                if !input.is_nil(next) {
                    while let Some(&back) = deque.back() {
                        let ord = compare_at(func, values, back, next)?;
                        let evict = if is_min {
                            ord != Ordering::Less
                        } else {
                            ord != Ordering::Greater
                        };
                        if evict {
                            deque.pop_back();
                        } else {
                            break;
                        }
                    }
                    deque.push_back(next);
                }
                next += 1;
            }
            while let Some(&front) = deque.front() {
                if front < fs {
                    deque.pop_front();
                } else {
                    break;
                }
            }
            match deque.front() {
                Some(&best) if best < fe => {
                    let best = u32::try_from(best).map_err(|_| EngineError::overflow(func))?;
                    indices.append_value(best);
                }
                _ => indices.append_null(),
            }
        }
    } else {
        for k in 0..rows {
            let (fs, fe) = frame_at(s, e, k, rows);
            let mut best: Option<usize> = None;
            for r in fs..fe {
                if input.is_nil(r) {
                    continue;
                }
                best = match best {
                    None => Some(r),
                    Some(b) => {
                        let ord = compare_at(func, values, r, b)?;
                        let better = if is_min {
                            ord == Ordering::Less
                        } else {
                            ord == Ordering::Greater
                        };
                        if better { Some(r) } else { Some(b) }
                    }
                };
            }
            match best {
                Some(b) => {
                    let b = u32::try_from(b).map_err(|_| EngineError::overflow(func))?;
                    indices.append_value(b);
                }
                None => indices.append_null(),
            }
        }
    }

    let idx_arr = Arc::new(indices.finish()) as ArrayRef;
    let taken = take(values, idx_arr.as_ref(), None)
        .map_err(|e| EngineError::from_arrow(func, e))?;
    Ok(Column::new(taken))
}

fn is_non_decreasing(a: &Int64Array) -> bool {
    (1..a.len()).all(|i| a.value(i - 1) <= a.value(i))
}

/// Concatenate the non-nil strings of each frame. The separator written
/// between elements r-1 and r is `sep[r]` for a per-row separator; a nil
/// separator row contributes nothing.
pub fn group_concat(
    input: &Column,
    separator: &Arg,
    start: &Column,
    end: &Column,
) -> Result<Column> {
    const FUNC: &str = "group_concat";
    let rows = input.len();
    if input.data_type() != &DataType::Utf8 {
        return Err(EngineError::unsupported(FUNC, format!("{:?}", input.data_type())));
    }
    let static_sep: Option<String> = match separator {
        Arg::Scalar(v) => {
            if v.is_null() {
                Some(",".to_string())
            } else {
                Some(
                    v.as_str()
                        .ok_or_else(|| EngineError::unsupported(FUNC, v.type_name()))?
                        .to_string(),
                )
            }
        }
        Arg::Column(c) => {
            if c.len() != rows {
                return Err(EngineError::invalid(
                    FUNC,
                    format!("separator column length {} != row count {rows}", c.len()),
                ));
            }
            if c.data_type() != &DataType::Utf8 {
                return Err(EngineError::unsupported(FUNC, format!("{:?}", c.data_type())));
            }
            None
        }
    };
    let s = bound_column(FUNC, start, rows, "frame start")?;
    let e = bound_column(FUNC, end, rows, "frame end")?;
    let values = input.values().as_ref();
    let mut builder = StringBuilder::new();
    for k in 0..rows {
        let (fs, fe) = frame_at(s, e, k, rows);
        let mut acc = String::new();
        let mut any = false;
        for r in fs..fe {
            if input.is_nil(r) {
                continue;
            }
            if any {
                match (&static_sep, separator) {
                    (Some(sep), _) => acc.push_str(sep),
                    (None, Arg::Column(c)) => {
                        if !c.is_nil(r) {
                            acc.push_str(scalar_str(FUNC, c.values().as_ref(), r)?);
                        }
                    }
                    (None, Arg::Scalar(_)) => unreachable!("static separator resolved above"),
                }
            }
            acc.push_str(scalar_str(FUNC, values, r)?);
            any = true;
        }
        if any {
            builder.append_value(acc);
        } else {
            builder.append_null();
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}
