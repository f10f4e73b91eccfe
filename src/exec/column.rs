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
//! Typed column accessor.
//!
//! Responsibilities:
//! - `Column`: an Arrow array plus the statistics flags the storage layer
//!   tracks (sorted, reverse-sorted, has-nil). Arrow validity bitmaps are
//!   the nil representation.
//! - `ScalarValue`: a single untyped cell, used for static window-call
//!   arguments and for degenerate single-value calls.
//! - Typed read helpers (`scalar_i64`, `scalar_i128`, `scalar_f64`, ...)
//!   and `compare_at` over the element types the engine accepts.
use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, StringArray, new_null_array,
};
use arrow::datatypes::DataType;

use crate::common::error::{EngineError, Result};

/// Statistics carried alongside a column. Producers set what they know
/// statically; consumers may only rely on a flag being `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnStats {
    pub sorted: bool,
    pub reverse_sorted: bool,
    pub has_nil: bool,
}

#[derive(Debug, Clone)]
pub struct Column {
    values: ArrayRef,
    stats: ColumnStats,
}

impl Column {
    pub fn new(values: ArrayRef) -> Self {
        let has_nil = values.null_count() > 0;
        Self {
            values,
            stats: ColumnStats {
                sorted: false,
                reverse_sorted: false,
                has_nil,
            },
        }
    }

    /// `has_nil` is always recomputed from the validity bitmap; callers can
    /// only add ordering knowledge, not remove nil knowledge.
    pub fn with_stats(values: ArrayRef, stats: ColumnStats) -> Self {
        let has_nil = values.null_count() > 0;
        Self {
            values,
            stats: ColumnStats { has_nil, ..stats },
        }
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn data_type(&self) -> &DataType {
        self.values.data_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_nil(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    pub fn stats(&self) -> ColumnStats {
        self.stats
    }
}

/// One untyped cell. The variants cover the element types the engine
/// accepts; anything else is rejected at the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarValue::Int8(_)
                | ScalarValue::Int16(_)
                | ScalarValue::Int32(_)
                | ScalarValue::Int64(_)
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ScalarValue::Int8(v) => Some(v as i64),
            ScalarValue::Int16(v) => Some(v as i64),
            ScalarValue::Int32(v) => Some(v as i64),
            ScalarValue::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ScalarValue::Int8(v) => Some(v as f64),
            ScalarValue::Int16(v) => Some(v as f64),
            ScalarValue::Int32(v) => Some(v as f64),
            ScalarValue::Int64(v) => Some(v as f64),
            ScalarValue::Float32(v) => Some(v as f64),
            ScalarValue::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "Null",
            ScalarValue::Boolean(_) => "Boolean",
            ScalarValue::Int8(_) => "Int8",
            ScalarValue::Int16(_) => "Int16",
            ScalarValue::Int32(_) => "Int32",
            ScalarValue::Int64(_) => "Int64",
            ScalarValue::Float32(_) => "Float32",
            ScalarValue::Float64(_) => "Float64",
            ScalarValue::Utf8(_) => "Utf8",
        }
    }

    /// Read one cell out of an array. Used to resolve per-row arguments
    /// passed as single-row columns.
    pub fn try_from_array(func: &'static str, array: &dyn Array, row: usize) -> Result<Self> {
        if array.is_null(row) {
            return Ok(ScalarValue::Null);
        }
        match array.data_type() {
            DataType::Boolean => Ok(ScalarValue::Boolean(
                downcast::<BooleanArray>(func, array)?.value(row),
            )),
            DataType::Int8 => Ok(ScalarValue::Int8(
                downcast::<Int8Array>(func, array)?.value(row),
            )),
            DataType::Int16 => Ok(ScalarValue::Int16(
                downcast::<Int16Array>(func, array)?.value(row),
            )),
            DataType::Int32 => Ok(ScalarValue::Int32(
                downcast::<Int32Array>(func, array)?.value(row),
            )),
            DataType::Int64 => Ok(ScalarValue::Int64(
                downcast::<Int64Array>(func, array)?.value(row),
            )),
            DataType::Float32 => Ok(ScalarValue::Float32(
                downcast::<Float32Array>(func, array)?.value(row),
            )),
            DataType::Float64 => Ok(ScalarValue::Float64(
                downcast::<Float64Array>(func, array)?.value(row),
            )),
            DataType::Utf8 => Ok(ScalarValue::Utf8(
                downcast::<StringArray>(func, array)?.value(row).to_string(),
            )),
            other => Err(EngineError::unsupported(func, format!("{other:?}"))),
        }
    }

    /// Build a one-element array of `data_type` holding this value, for use
    /// with the `zip` kernel (e.g. lag/lead defaults).
    pub fn to_singleton_array(&self, func: &'static str, data_type: &DataType) -> Result<ArrayRef> {
        if self.is_null() {
            return Ok(new_null_array(data_type, 1));
        }
        let out: ArrayRef = match (data_type, self) {
            (DataType::Boolean, ScalarValue::Boolean(v)) => {
                Arc::new(BooleanArray::from(vec![*v]))
            }
            (DataType::Int8, _) | (DataType::Int16, _) | (DataType::Int32, _)
            | (DataType::Int64, _) => {
                let v = self.as_i64().ok_or_else(|| {
                    EngineError::invalid(
                        func,
                        format!("cannot use {} value as {data_type:?}", self.type_name()),
                    )
                })?;
                match data_type {
                    DataType::Int8 => {
                        let v = i8::try_from(v).map_err(|_| EngineError::overflow(func))?;
                        Arc::new(Int8Array::from(vec![v]))
                    }
                    DataType::Int16 => {
                        let v = i16::try_from(v).map_err(|_| EngineError::overflow(func))?;
                        Arc::new(Int16Array::from(vec![v]))
                    }
                    DataType::Int32 => {
                        let v = i32::try_from(v).map_err(|_| EngineError::overflow(func))?;
                        Arc::new(Int32Array::from(vec![v]))
                    }
                    _ => Arc::new(Int64Array::from(vec![v])),
                }
            }
            (DataType::Float32, _) => {
                let v = self.as_f64().ok_or_else(|| {
                    EngineError::invalid(
                        func,
                        format!("cannot use {} value as Float32", self.type_name()),
                    )
                })?;
                Arc::new(Float32Array::from(vec![v as f32]))
            }
            (DataType::Float64, _) => {
                let v = self.as_f64().ok_or_else(|| {
                    EngineError::invalid(
                        func,
                        format!("cannot use {} value as Float64", self.type_name()),
                    )
                })?;
                Arc::new(Float64Array::from(vec![v]))
            }
            (DataType::Utf8, ScalarValue::Utf8(s)) => {
                Arc::new(StringArray::from(vec![s.as_str()]))
            }
            (other, _) => {
                return Err(EngineError::invalid(
                    func,
                    format!("cannot use {} value as {other:?}", self.type_name()),
                ));
            }
        };
        Ok(out)
    }
}

pub(crate) fn downcast<'a, T: 'static>(
    func: &'static str,
    array: &'a dyn Array,
) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        EngineError::invalid(
            func,
            format!("array downcast mismatch for {:?}", array.data_type()),
        )
    })
}

pub(crate) fn is_integer_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
    )
}

/// Read an integer cell widened to i64. The caller checks validity first.
pub(crate) fn scalar_i64(func: &'static str, array: &dyn Array, row: usize) -> Result<i64> {
    match array.data_type() {
        DataType::Int8 => Ok(downcast::<Int8Array>(func, array)?.value(row) as i64),
        DataType::Int16 => Ok(downcast::<Int16Array>(func, array)?.value(row) as i64),
        DataType::Int32 => Ok(downcast::<Int32Array>(func, array)?.value(row) as i64),
        DataType::Int64 => Ok(downcast::<Int64Array>(func, array)?.value(row)),
        other => Err(EngineError::unsupported(func, format!("{other:?}"))),
    }
}

/// Read an integer cell widened to the i128 accumulator.
pub(crate) fn scalar_i128(func: &'static str, array: &dyn Array, row: usize) -> Result<i128> {
    scalar_i64(func, array, row).map(|v| v as i128)
}

/// Read a numeric cell as f64.
pub(crate) fn scalar_f64(func: &'static str, array: &dyn Array, row: usize) -> Result<f64> {
    match array.data_type() {
        DataType::Int8 => Ok(downcast::<Int8Array>(func, array)?.value(row) as f64),
        DataType::Int16 => Ok(downcast::<Int16Array>(func, array)?.value(row) as f64),
        DataType::Int32 => Ok(downcast::<Int32Array>(func, array)?.value(row) as f64),
        DataType::Int64 => Ok(downcast::<Int64Array>(func, array)?.value(row) as f64),
        DataType::Float32 => Ok(downcast::<Float32Array>(func, array)?.value(row) as f64),
        DataType::Float64 => Ok(downcast::<Float64Array>(func, array)?.value(row)),
        other => Err(EngineError::unsupported(func, format!("{other:?}"))),
    }
}

pub(crate) fn scalar_str<'a>(
    func: &'static str,
    array: &'a dyn Array,
    row: usize,
) -> Result<&'a str> {
    match array.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(func, array)?.value(row)),
        other => Err(EngineError::unsupported(func, format!("{other:?}"))),
    }
}

/// Total order used for min/max: nils sort first, NaN sorts last.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| {
        if a.is_nan() && b.is_nan() {
            Ordering::Equal
        } else if a.is_nan() {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    })
}

/// Compare two non-nil cells of the same array.
pub(crate) fn compare_at(
    func: &'static str,
    array: &dyn Array,
    l: usize,
    r: usize,
) -> Result<Ordering> {
    match array.data_type() {
        DataType::Boolean => {
            let a = downcast::<BooleanArray>(func, array)?;
            Ok(a.value(l).cmp(&a.value(r)))
        }
        DataType::Int8 => {
            let a = downcast::<Int8Array>(func, array)?;
            Ok(a.value(l).cmp(&a.value(r)))
        }
        DataType::Int16 => {
            let a = downcast::<Int16Array>(func, array)?;
            Ok(a.value(l).cmp(&a.value(r)))
        }
        DataType::Int32 => {
            let a = downcast::<Int32Array>(func, array)?;
            Ok(a.value(l).cmp(&a.value(r)))
        }
        DataType::Int64 => {
            let a = downcast::<Int64Array>(func, array)?;
            Ok(a.value(l).cmp(&a.value(r)))
        }
        DataType::Float32 => {
            let a = downcast::<Float32Array>(func, array)?;
            Ok(cmp_f64(a.value(l) as f64, a.value(r) as f64))
        }
        DataType::Float64 => {
            let a = downcast::<Float64Array>(func, array)?;
            Ok(cmp_f64(a.value(l), a.value(r)))
        }
        DataType::Utf8 => {
            let a = downcast::<StringArray>(func, array)?;
            Ok(a.value(l).cmp(a.value(r)))
        }
        other => Err(EngineError::unsupported(func, format!("{other:?}"))),
    }
}
