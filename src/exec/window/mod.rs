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
//! Window-function engine.
//!
//! Responsibilities:
//! - the call boundary (`Arg`, `WindowCall`, `Output`) shared by all
//!   families;
//! - `evaluate`: argument-shape validation and dispatch, including the
//!   degenerate single-value path selected by a scalar first argument;
//! - `Registry`: explicit name lookup, no global state.
//!
//! Key exported interfaces: `evaluate`, `Registry::standard`,
//! `bounds::window_bounds`, plus the per-family modules.
use std::collections::HashMap;

use arrow::array::{Array, BooleanArray, Int64Array};
use arrow::datatypes::DataType;
use tracing::debug;

use crate::common::error::{EngineError, Result};
use crate::exec::column::{Column, ScalarValue};

pub mod aggregate;
pub mod bounds;
pub mod frame;
pub mod offset;
pub mod ranking;

use aggregate::PairStat;

/// A window-call argument: a full column, or one static value. A scalar
/// first argument selects the degenerate single-row path for every
/// function.
#[derive(Debug, Clone)]
pub enum Arg {
    Column(Column),
    Scalar(ScalarValue),
}

#[derive(Debug, Clone)]
pub enum Output {
    Column(Column),
    Scalar(ScalarValue),
}

/// Everything one window-function invocation needs. Partition and order
/// are boolean marker columns (true starts a new group); start/end are
/// Int64 frame-bound columns from the bound calculator.
#[derive(Debug, Clone)]
pub struct WindowCall {
    pub args: Vec<Arg>,
    pub partition: Option<Column>,
    pub order: Option<Column>,
    pub start: Option<Column>,
    pub end: Option<Column>,
    pub ignore_nils: bool,
}

impl WindowCall {
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            args,
            partition: None,
            order: None,
            start: None,
            end: None,
            ignore_nils: true,
        }
    }

    pub fn with_partition(mut self, partition: Column) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_order(mut self, order: Column) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_bounds(mut self, start: Column, end: Column) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_ignore_nils(mut self, ignore_nils: bool) -> Self {
        self.ignore_nils = ignore_nils;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFunction {
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Ntile,
    FirstValue,
    LastValue,
    NthValue,
    Lag,
    Lead,
    Count,
    Sum,
    Product,
    Avg,
    AvgInteger,
    VarSamp,
    VarPop,
    StddevSamp,
    StddevPop,
    CovarSamp,
    CovarPop,
    Corr,
    Min,
    Max,
    GroupConcat,
}

const ALL_FUNCTIONS: &[WindowFunction] = &[
    WindowFunction::RowNumber,
    WindowFunction::Rank,
    WindowFunction::DenseRank,
    WindowFunction::PercentRank,
    WindowFunction::CumeDist,
    WindowFunction::Ntile,
    WindowFunction::FirstValue,
    WindowFunction::LastValue,
    WindowFunction::NthValue,
    WindowFunction::Lag,
    WindowFunction::Lead,
    WindowFunction::Count,
    WindowFunction::Sum,
    WindowFunction::Product,
    WindowFunction::Avg,
    WindowFunction::AvgInteger,
    WindowFunction::VarSamp,
    WindowFunction::VarPop,
    WindowFunction::StddevSamp,
    WindowFunction::StddevPop,
    WindowFunction::CovarSamp,
    WindowFunction::CovarPop,
    WindowFunction::Corr,
    WindowFunction::Min,
    WindowFunction::Max,
    WindowFunction::GroupConcat,
];

impl WindowFunction {
    pub fn name(self) -> &'static str {
        match self {
            WindowFunction::RowNumber => "row_number",
            WindowFunction::Rank => "rank",
            WindowFunction::DenseRank => "dense_rank",
            WindowFunction::PercentRank => "percent_rank",
            WindowFunction::CumeDist => "cume_dist",
            WindowFunction::Ntile => "ntile",
            WindowFunction::FirstValue => "first_value",
            WindowFunction::LastValue => "last_value",
            WindowFunction::NthValue => "nth_value",
            WindowFunction::Lag => "lag",
            WindowFunction::Lead => "lead",
            WindowFunction::Count => "count",
            WindowFunction::Sum => "sum",
            WindowFunction::Product => "product",
            WindowFunction::Avg => "avg",
            WindowFunction::AvgInteger => "avg_integer",
            WindowFunction::VarSamp => "var_samp",
            WindowFunction::VarPop => "var_pop",
            WindowFunction::StddevSamp => "stddev_samp",
            WindowFunction::StddevPop => "stddev_pop",
            WindowFunction::CovarSamp => "covar_samp",
            WindowFunction::CovarPop => "covar_pop",
            WindowFunction::Corr => "corr",
            WindowFunction::Min => "min",
            WindowFunction::Max => "max",
            WindowFunction::GroupConcat => "group_concat",
        }
    }
}

/// Name lookup for the SQL layer. Built explicitly and passed where
/// needed.
pub struct Registry {
    map: HashMap<&'static str, WindowFunction>,
}

impl Registry {
    pub fn standard() -> Self {
        let map = ALL_FUNCTIONS.iter().map(|f| (f.name(), *f)).collect();
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<WindowFunction> {
        self.map.get(name).copied()
    }

    pub fn evaluate(&self, name: &str, call: &WindowCall) -> Result<Output> {
        let func = self.get(name).ok_or_else(|| {
            EngineError::invalid("window", format!("unknown window function {name:?}"))
        })?;
        evaluate(func, call)
    }
}

pub fn evaluate(func: WindowFunction, call: &WindowCall) -> Result<Output> {
    let name = func.name();
    let first = call
        .args
        .first()
        .ok_or_else(|| EngineError::invalid(name, "missing input argument"))?;
    match first {
        Arg::Scalar(v) => {
            debug!(func = name, "evaluating degenerate scalar window call");
            scalar_eval(func, v, call).map(Output::Scalar)
        }
        Arg::Column(col) => {
            debug!(func = name, rows = col.len(), "evaluating window call");
            column_eval(func, col, call).map(Output::Column)
        }
    }
}

fn column_eval(func: WindowFunction, col: &Column, call: &WindowCall) -> Result<Column> {
    let name = func.name();
    let rows = col.len();
    let partition = call.partition.as_ref();
    let order = call.order.as_ref();
    match func {
        WindowFunction::RowNumber => ranking::row_number(rows, partition),
        WindowFunction::Rank => ranking::rank(rows, partition, order),
        WindowFunction::DenseRank => ranking::dense_rank(rows, partition, order),
        WindowFunction::PercentRank => ranking::percent_rank(rows, partition, order),
        WindowFunction::CumeDist => ranking::cume_dist(rows, partition, order),
        WindowFunction::Ntile => ranking::ntile(rows, partition, arg_at(name, call, 1)?),
        WindowFunction::FirstValue => {
            let (s, e) = bounds_of(name, call)?;
            offset::first_value(col, s, e)
        }
        WindowFunction::LastValue => {
            let (s, e) = bounds_of(name, call)?;
            offset::last_value(col, s, e)
        }
        WindowFunction::NthValue => {
            let (s, e) = bounds_of(name, call)?;
            offset::nth_value(col, arg_at(name, call, 1)?, s, e)
        }
        WindowFunction::Lag | WindowFunction::Lead => {
            let off = scalar_arg_or(name, call, 1, ScalarValue::Int64(1))?;
            let def = scalar_arg_or(name, call, 2, ScalarValue::Null)?;
            offset::lead_lag(col, &off, &def, partition, func == WindowFunction::Lag)
        }
        WindowFunction::Count => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::count(col, call.ignore_nils, s, e)
        }
        WindowFunction::Sum => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::sum(col, s, e)
        }
        WindowFunction::Product => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::product(col, s, e)
        }
        WindowFunction::Avg => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::avg(col, s, e)
        }
        WindowFunction::AvgInteger => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::avg_integer(col, s, e)
        }
        WindowFunction::VarSamp => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::var_samp(col, s, e)
        }
        WindowFunction::VarPop => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::var_pop(col, s, e)
        }
        WindowFunction::StddevSamp => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::stddev_samp(col, s, e)
        }
        WindowFunction::StddevPop => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::stddev_pop(col, s, e)
        }
        WindowFunction::CovarSamp | WindowFunction::CovarPop | WindowFunction::Corr => {
            let stat = pair_stat(func);
            let (s, e) = bounds_of(name, call)?;
            match arg_at(name, call, 1)? {
                Arg::Column(y) => aggregate::covariance(col, y, s, e, stat),
                Arg::Scalar(v) => aggregate::covariance_constant(col, v.is_null(), s, e, stat),
            }
        }
        WindowFunction::Min => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::min(col, s, e)
        }
        WindowFunction::Max => {
            let (s, e) = bounds_of(name, call)?;
            aggregate::max(col, s, e)
        }
        WindowFunction::GroupConcat => {
            let (s, e) = bounds_of(name, call)?;
            let default_sep = Arg::Scalar(ScalarValue::Null);
            let sep = call.args.get(1).unwrap_or(&default_sep);
            aggregate::group_concat(col, sep, s, e)
        }
    }
}

/// Single-value calls: the partitioned machinery degenerates to a direct
/// mapping of the argument.
fn scalar_eval(
    func: WindowFunction,
    v: &ScalarValue,
    call: &WindowCall,
) -> Result<ScalarValue> {
    let name = func.name();
    match func {
        WindowFunction::RowNumber | WindowFunction::Rank | WindowFunction::DenseRank => {
            Ok(ScalarValue::Int64(1))
        }
        WindowFunction::PercentRank => Ok(ScalarValue::Float64(0.0)),
        WindowFunction::CumeDist => Ok(ScalarValue::Float64(1.0)),
        WindowFunction::Ntile => {
            let n = scalar_arg_or(name, call, 1, ScalarValue::Null)?;
            ranking::ntile_scalar(&n)
        }
        WindowFunction::FirstValue
        | WindowFunction::LastValue
        | WindowFunction::Min
        | WindowFunction::Max => Ok(v.clone()),
        WindowFunction::NthValue => {
            let n = scalar_arg_or(name, call, 1, ScalarValue::Null)?;
            if n.is_null() {
                return Ok(ScalarValue::Null);
            }
            let n = n
                .as_i64()
                .ok_or_else(|| EngineError::unsupported(name, n.type_name()))?;
            if n < 1 {
                return Err(EngineError::domain(
                    name,
                    format!("argument 2 must be positive, got {n}"),
                ));
            }
            Ok(if n == 1 { v.clone() } else { ScalarValue::Null })
        }
        WindowFunction::Lag | WindowFunction::Lead => {
            let off = scalar_arg_or(name, call, 1, ScalarValue::Int64(1))?;
            let def = scalar_arg_or(name, call, 2, ScalarValue::Null)?;
            if off.is_null() {
                return Ok(v.clone());
            }
            let off = off
                .as_i64()
                .ok_or_else(|| EngineError::unsupported(name, off.type_name()))?;
            Ok(if off == 0 { v.clone() } else { def })
        }
        WindowFunction::Count => {
            let counted = !(v.is_null() && call.ignore_nils);
            Ok(ScalarValue::Int64(if counted { 1 } else { 0 }))
        }
        WindowFunction::Sum | WindowFunction::Product => {
            if v.is_null() {
                return Ok(ScalarValue::Null);
            }
            if let Some(i) = v.as_i64() {
                Ok(ScalarValue::Int64(i))
            } else if let Some(f) = v.as_f64() {
                Ok(ScalarValue::Float64(f))
            } else {
                Err(EngineError::unsupported(name, v.type_name()))
            }
        }
        WindowFunction::Avg => {
            if v.is_null() {
                return Ok(ScalarValue::Null);
            }
            v.as_f64()
                .map(ScalarValue::Float64)
                .ok_or_else(|| EngineError::unsupported(name, v.type_name()))
        }
        WindowFunction::AvgInteger => {
            if v.is_null() {
                return Ok(ScalarValue::Null);
            }
            if v.is_integer() {
                Ok(v.clone())
            } else {
                Err(EngineError::unsupported(name, v.type_name()))
            }
        }
        WindowFunction::VarSamp | WindowFunction::StddevSamp => {
            require_numeric_or_nil(name, v)?;
            Ok(ScalarValue::Null)
        }
        WindowFunction::VarPop | WindowFunction::StddevPop => {
            require_numeric_or_nil(name, v)?;
            Ok(if v.is_null() {
                ScalarValue::Null
            } else {
                ScalarValue::Float64(0.0)
            })
        }
        WindowFunction::CovarSamp | WindowFunction::Corr => {
            let y = scalar_arg_or(name, call, 1, ScalarValue::Null)?;
            require_numeric_or_nil(name, v)?;
            require_numeric_or_nil(name, &y)?;
            // a single pair is never enough for the sample statistics.
            Ok(ScalarValue::Null)
        }
        WindowFunction::CovarPop => {
            let y = scalar_arg_or(name, call, 1, ScalarValue::Null)?;
            require_numeric_or_nil(name, v)?;
            require_numeric_or_nil(name, &y)?;
            Ok(if v.is_null() || y.is_null() {
                ScalarValue::Null
            } else {
                ScalarValue::Float64(0.0)
            })
        }
        WindowFunction::GroupConcat => {
            if v.is_null() {
                return Ok(ScalarValue::Null);
            }
            match v {
                ScalarValue::Utf8(_) => Ok(v.clone()),
                other => Err(EngineError::unsupported(name, other.type_name())),
            }
        }
    }
}

fn pair_stat(func: WindowFunction) -> PairStat {
    match func {
        WindowFunction::CovarSamp => PairStat::CovarSamp,
        WindowFunction::CovarPop => PairStat::CovarPop,
        _ => PairStat::Corr,
    }
}

fn require_numeric_or_nil(func: &'static str, v: &ScalarValue) -> Result<()> {
    if v.is_null() || v.as_f64().is_some() {
        Ok(())
    } else {
        Err(EngineError::unsupported(func, v.type_name()))
    }
}

fn bounds_of<'a>(func: &'static str, call: &'a WindowCall) -> Result<(&'a Column, &'a Column)> {
    let s = call
        .start
        .as_ref()
        .ok_or_else(|| EngineError::invalid(func, "missing frame start bounds"))?;
    let e = call
        .end
        .as_ref()
        .ok_or_else(|| EngineError::invalid(func, "missing frame end bounds"))?;
    Ok((s, e))
}

fn arg_at<'a>(func: &'static str, call: &'a WindowCall, idx: usize) -> Result<&'a Arg> {
    call.args
        .get(idx)
        .ok_or_else(|| EngineError::invalid(func, format!("missing argument {}", idx + 1)))
}

/// Resolve an optional argument to one value; a column argument
/// contributes its first cell, matching the original marshalling layer.
fn scalar_arg_or(
    func: &'static str,
    call: &WindowCall,
    idx: usize,
    default: ScalarValue,
) -> Result<ScalarValue> {
    match call.args.get(idx) {
        None => Ok(default),
        Some(Arg::Scalar(v)) => Ok(v.clone()),
        Some(Arg::Column(c)) => {
            if c.is_empty() {
                Ok(ScalarValue::Null)
            } else {
                ScalarValue::try_from_array(func, c.values().as_ref(), 0)
            }
        }
    }
}

/// Marker cell with nil treated as "no new group".
pub(crate) fn bit(marker: &BooleanArray, row: usize) -> bool {
    marker.is_valid(row) && marker.value(row)
}

pub(crate) fn boolean_marker<'a>(
    func: &'static str,
    col: &'a Column,
    rows: usize,
    what: &str,
) -> Result<&'a BooleanArray> {
    if col.len() != rows {
        return Err(EngineError::invalid(
            func,
            format!("{what} marker length {} != row count {rows}", col.len()),
        ));
    }
    if col.data_type() != &DataType::Boolean {
        return Err(EngineError::invalid(
            func,
            format!("{what} marker must be boolean, got {:?}", col.data_type()),
        ));
    }
    crate::exec::column::downcast::<BooleanArray>(func, col.values().as_ref())
}

/// Partition extents from an optional marker column; a set bit starts a
/// new partition. No marker means one partition spanning all rows.
pub(crate) fn partitions_of(
    marker: Option<&BooleanArray>,
    rows: usize,
) -> Vec<(usize, usize)> {
    if rows == 0 {
        return Vec::new();
    }
    let Some(m) = marker else {
        return vec![(0, rows)];
    };
    let mut parts = Vec::new();
    let mut start = 0usize;
    for r in 1..rows {
        if bit(m, r) {
            parts.push((start, r));
            start = r;
        }
    }
    parts.push((start, rows));
    parts
}

pub(crate) fn bound_column<'a>(
    func: &'static str,
    col: &'a Column,
    rows: usize,
    what: &str,
) -> Result<&'a Int64Array> {
    if col.len() != rows {
        return Err(EngineError::invalid(
            func,
            format!("{what} column length {} != row count {rows}", col.len()),
        ));
    }
    if col.data_type() != &DataType::Int64 {
        return Err(EngineError::invalid(
            func,
            format!("{what} column must be Int64, got {:?}", col.data_type()),
        ));
    }
    if col.values().null_count() > 0 {
        return Err(EngineError::invalid(func, format!("nil {what} index")));
    }
    crate::exec::column::downcast::<Int64Array>(func, col.values().as_ref())
}

/// One clamped half-open frame. Bounds columns come from the calculator,
/// but clamping keeps hand-built inputs from indexing out of range.
pub(crate) fn frame_at(
    s: &Int64Array,
    e: &Int64Array,
    k: usize,
    rows: usize,
) -> (usize, usize) {
    let fs = s.value(k).clamp(0, rows as i64) as usize;
    let fe = e.value(k).clamp(0, rows as i64) as usize;
    (fs, fe)
}
