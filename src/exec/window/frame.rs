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
//! Frame specification model.
//!
//! The SQL layer passes the frame shape as three small integers (unit,
//! bound code, exclusion code); `FrameSpec::from_codes` decodes them into a
//! typed spec before any column work happens.
use crate::common::error::{EngineError, Result};

const FUNC: &str = "window_bound";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameUnit {
    /// Physical row offsets.
    Rows,
    /// Value distance against the ordering column.
    Range,
    /// Tie-group offsets over boundary bits.
    Groups,
}

/// Only `NO OTHERS` is implemented; the decoder rejects everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameExclusion {
    NoOthers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpec {
    pub unit: FrameUnit,
    /// Bound direction: PRECEDING walks toward the partition start.
    pub preceding: bool,
    /// Whether this bound is the frame's start edge. The start edge of a
    /// PRECEDING bound lands on `k - limit`; the end edge of a FOLLOWING
    /// bound lands one past `k + limit`.
    pub first_half: bool,
    pub exclusion: FrameExclusion,
}

impl FrameSpec {
    pub fn new(unit: FrameUnit, preceding: bool, first_half: bool) -> Self {
        Self {
            unit,
            preceding,
            first_half,
            exclusion: FrameExclusion::NoOthers,
        }
    }

    /// Decode the marshalling codes. Bound codes 0..=5 encode direction and
    /// edge as `preceding = bound % 2 == 0`, `first_half = bound < 2 ||
    /// bound == 4` (codes 4/5 are CURRENT ROW as start/end, used with a
    /// zero limit).
    pub fn from_codes(unit: i32, bound: i32, exclusion: i32) -> Result<Self> {
        let unit = match unit {
            0 => FrameUnit::Rows,
            1 => FrameUnit::Range,
            2 => FrameUnit::Groups,
            other => {
                return Err(EngineError::invalid(
                    FUNC,
                    format!("unknown frame unit code {other}"),
                ));
            }
        };
        if !(0..=5).contains(&bound) {
            return Err(EngineError::invalid(
                FUNC,
                format!("unknown frame bound code {bound}"),
            ));
        }
        if exclusion != 0 {
            return Err(EngineError::invalid(
                FUNC,
                "only EXCLUDE NO OTHERS exclusion is currently implemented",
            ));
        }
        Ok(Self {
            unit,
            preceding: bound % 2 == 0,
            first_half: bound < 2 || bound == 4,
            exclusion: FrameExclusion::NoOthers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_code_truth_table() {
        let cases = [
            (0, true, true),
            (1, false, true),
            (2, true, false),
            (3, false, false),
            (4, true, true),
            (5, false, false),
        ];
        for (bound, preceding, first_half) in cases {
            let spec = FrameSpec::from_codes(0, bound, 0).unwrap();
            assert_eq!(spec.preceding, preceding, "bound {bound}");
            assert_eq!(spec.first_half, first_half, "bound {bound}");
        }
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(FrameSpec::from_codes(3, 0, 0).is_err());
        assert!(FrameSpec::from_codes(0, 6, 0).is_err());
        assert!(FrameSpec::from_codes(0, -1, 0).is_err());
    }

    #[test]
    fn rejects_other_exclusions() {
        let err = FrameSpec::from_codes(0, 0, 1).unwrap_err();
        assert!(err.to_string().contains("EXCLUDE NO OTHERS"));
    }

    #[test]
    fn unit_codes() {
        assert_eq!(FrameSpec::from_codes(0, 0, 0).unwrap().unit, FrameUnit::Rows);
        assert_eq!(
            FrameSpec::from_codes(1, 0, 0).unwrap().unit,
            FrameUnit::Range
        );
        assert_eq!(
            FrameSpec::from_codes(2, 0, 0).unwrap().unit,
            FrameUnit::Groups
        );
    }
}
