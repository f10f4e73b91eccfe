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
//! Ranking and ordinal family: row_number, rank, dense_rank, percent_rank,
//! cume_dist, ntile. One linear pass per call over the boolean partition /
//! order marker columns; outputs never contain nils except ntile rows with
//! a nil bucket count.
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, Int64Builder};

use crate::common::error::{EngineError, Result};
use crate::exec::column::{Column, ColumnStats, ScalarValue, scalar_i64};
use crate::exec::window::{Arg, bit, boolean_marker, partitions_of};

pub fn row_number(rows: usize, partition: Option<&Column>) -> Result<Column> {
    const FUNC: &str = "row_number";
    let marker = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let mut out: Vec<i64> = Vec::with_capacity(rows);
    match marker {
        Some(np) => {
            let mut j = 1i64;
            for k in 0..rows {
                if bit(np, k) {
                    j = 1;
                }
                out.push(j);
                j += 1;
            }
        }
        None => {
            for k in 0..rows {
                out.push(k as i64 + 1);
            }
        }
    }
    let array: ArrayRef = Arc::new(Int64Array::from(out));
    Ok(Column::with_stats(
        array,
        ColumnStats {
            sorted: partition.is_none(),
            reverse_sorted: false,
            has_nil: false,
        },
    ))
}

/// Rank with gaps. `j` is the emitted rank, `k` the running row number;
/// a new tie group snaps `j` forward to `k`.
pub fn rank(rows: usize, partition: Option<&Column>, order: Option<&Column>) -> Result<Column> {
    const FUNC: &str = "rank";
    rank_impl(FUNC, rows, partition, order, false)
}

/// Rank without gaps: a new tie group increments `j` by one.
pub fn dense_rank(
    rows: usize,
    partition: Option<&Column>,
    order: Option<&Column>,
) -> Result<Column> {
    const FUNC: &str = "dense_rank";
    rank_impl(FUNC, rows, partition, order, true)
}

fn rank_impl(
    func: &'static str,
    rows: usize,
    partition: Option<&Column>,
    order: Option<&Column>,
    dense: bool,
) -> Result<Column> {
    let np = match partition {
        Some(p) => Some(boolean_marker(func, p, rows, "partition")?),
        None => None,
    };
    let no = match order {
        Some(o) => Some(boolean_marker(func, o, rows, "order")?),
        None => None,
    };
    let mut out: Vec<i64> = Vec::with_capacity(rows);
    match no {
        Some(no) => {
            let mut j = 1i64;
            let mut k = 1i64;
            for r in 0..rows {
                if let Some(np) = np {
                    if bit(np, r) {
                        j = 1;
                        k = 1;
                    }
                }
                if r > 0 && bit(no, r) {
                    if dense {
                        j += 1;
                    } else {
                        j = k;
                    }
                }
                out.push(j);
                k += 1;
            }
        }
        None => {
            // Without tie information every row is its own group.
            match np {
                Some(np) => {
                    let mut j = 1i64;
                    for r in 0..rows {
                        if bit(np, r) {
                            j = 1;
                        }
                        out.push(j);
                        j += 1;
                    }
                }
                None => {
                    for r in 0..rows {
                        out.push(r as i64 + 1);
                    }
                }
            }
        }
    }
    let array: ArrayRef = Arc::new(Int64Array::from(out));
    Ok(Column::with_stats(
        array,
        ColumnStats {
            sorted: partition.is_none(),
            reverse_sorted: false,
            has_nil: false,
        },
    ))
}

/// `(rank - 1) / (partition size - 1)`; single-row partitions emit 0.
pub fn percent_rank(
    rows: usize,
    partition: Option<&Column>,
    order: Option<&Column>,
) -> Result<Column> {
    const FUNC: &str = "percent_rank";
    let np = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let no = match order {
        Some(o) => Some(boolean_marker(FUNC, o, rows, "order")?),
        None => None,
    };
    let mut out: Vec<f64> = Vec::with_capacity(rows);
    for (ps, pe) in partitions_of(np, rows) {
        let size = pe - ps;
        let divisor = (size.saturating_sub(1)) as f64;
        let mut j = 0f64;
        let mut k = 0f64;
        for r in ps..pe {
            if let Some(no) = no {
                if r > ps && bit(no, r) {
                    j = k;
                }
            }
            out.push(if size > 1 { j / divisor } else { 0.0 });
            k += 1.0;
        }
    }
    let array: ArrayRef = Arc::new(Float64Array::from(out));
    Ok(Column::new(array))
}

/// Fraction of partition rows whose order key is <= the current row's key:
/// every row of a tie group gets (rows through group end) / partition size.
pub fn cume_dist(
    rows: usize,
    partition: Option<&Column>,
    order: Option<&Column>,
) -> Result<Column> {
    const FUNC: &str = "cume_dist";
    let np = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let no = match order {
        Some(o) => Some(boolean_marker(FUNC, o, rows, "order")?),
        None => None,
    };
    let mut out: Vec<f64> = Vec::with_capacity(rows);
    for (ps, pe) in partitions_of(np, rows) {
        let size = (pe - ps) as f64;
        match no {
            None => {
                for _ in ps..pe {
                    out.push(1.0);
                }
            }
            Some(no) => {
                let mut group_start = ps;
                for r in (ps + 1)..=pe {
                    if r == pe || bit(no, r) {
                        let v = (r - ps) as f64 / size;
                        for _ in group_start..r {
                            out.push(v);
                        }
                        group_start = r;
                    }
                }
            }
        }
    }
    let array: ArrayRef = Arc::new(Float64Array::from(out));
    Ok(Column::new(array))
}

/// Distribute each partition over `n` buckets; remainder rows go to the
/// earliest buckets. `n` may be a per-row column; a nil `n` yields a nil
/// output row, a non-positive one aborts the call.
pub fn ntile(rows: usize, partition: Option<&Column>, buckets: &Arg) -> Result<Column> {
    const FUNC: &str = "ntile";
    let np = match partition {
        Some(p) => Some(boolean_marker(FUNC, p, rows, "partition")?),
        None => None,
    };
    let static_n = match buckets {
        Arg::Scalar(s) => {
            if s.is_null() {
                None
            } else {
                let n = s
                    .as_i64()
                    .ok_or_else(|| EngineError::unsupported(FUNC, s.type_name()))?;
                validate_bucket_count(FUNC, n)?;
                Some(n)
            }
        }
        Arg::Column(c) => {
            if c.len() != rows {
                return Err(EngineError::invalid(
                    FUNC,
                    format!("bucket column length {} != row count {rows}", c.len()),
                ));
            }
            None
        }
    };

    let mut builder = Int64Builder::with_capacity(rows);
    for (ps, pe) in partitions_of(np, rows) {
        let cnt = (pe - ps) as i64;
        for (pos, r) in (ps..pe).enumerate() {
            let n = match buckets {
                Arg::Scalar(s) => {
                    if s.is_null() {
                        builder.append_null();
                        continue;
                    }
                    static_n.unwrap_or(1)
                }
                Arg::Column(c) => {
                    if c.is_nil(r) {
                        builder.append_null();
                        continue;
                    }
                    let n = scalar_i64(FUNC, c.values().as_ref(), r)?;
                    validate_bucket_count(FUNC, n)?;
                    n
                }
            };
            builder.append_value(bucket_of(pos as i64, cnt, n));
        }
    }
    let array: ArrayRef = Arc::new(builder.finish());
    Ok(Column::new(array))
}

fn validate_bucket_count(func: &'static str, n: i64) -> Result<()> {
    if n < 1 {
        return Err(EngineError::domain(
            func,
            format!("number of tiles must be greater than zero, got {n}"),
        ));
    }
    Ok(())
}

/// Large buckets (one extra row) come first; `pos` is the zero-based row
/// position inside the partition.
fn bucket_of(pos: i64, cnt: i64, n: i64) -> i64 {
    let small = cnt / n;
    let large = small + 1;
    let num_large = cnt % n;
    let num_large_rows = num_large * large;
    if pos < num_large_rows {
        pos / large + 1
    } else {
        num_large + (pos - num_large_rows) / small + 1
    }
}

/// Degenerate single-value calls.
pub fn ntile_scalar(buckets: &ScalarValue) -> Result<ScalarValue> {
    const FUNC: &str = "ntile";
    if buckets.is_null() {
        return Ok(ScalarValue::Null);
    }
    let n = buckets
        .as_i64()
        .ok_or_else(|| EngineError::unsupported(FUNC, buckets.type_name()))?;
    validate_bucket_count(FUNC, n)?;
    Ok(ScalarValue::Int64(1))
}
