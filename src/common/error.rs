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
use arrow::error::ArrowError;
use thiserror::Error;

/// Engine-level error. Every variant carries the name of the window function
/// (or subsystem) that failed so the SQL layer can prefix its error text.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{func}: invalid argument: {reason}")]
    InvalidArgument { func: &'static str, reason: String },

    #[error("{func}: type {type_name} not supported")]
    UnsupportedType {
        func: &'static str,
        type_name: String,
    },

    #[error("{func}: allocation failed: {reason}")]
    Allocation { func: &'static str, reason: String },

    /// SQLSTATE 22003, matching the text the SQL layer expects.
    #[error("{func}: 22003!overflow in calculation")]
    Overflow { func: &'static str },

    #[error("{func}: {reason}")]
    Domain { func: &'static str, reason: String },
}

impl EngineError {
    pub fn invalid(func: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            func,
            reason: reason.into(),
        }
    }

    pub fn unsupported(func: &'static str, type_name: impl ToString) -> Self {
        Self::UnsupportedType {
            func,
            type_name: type_name.to_string(),
        }
    }

    pub fn overflow(func: &'static str) -> Self {
        Self::Overflow { func }
    }

    pub fn domain(func: &'static str, reason: impl Into<String>) -> Self {
        Self::Domain {
            func,
            reason: reason.into(),
        }
    }

    /// Arrow kernels fail either on resource exhaustion or on malformed
    /// input; the former is the common case for `take`/`zip` over validated
    /// indices.
    pub fn from_arrow(func: &'static str, err: ArrowError) -> Self {
        match err {
            ArrowError::MemoryError(m) => Self::Allocation { func, reason: m },
            other => Self::InvalidArgument {
                func,
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
