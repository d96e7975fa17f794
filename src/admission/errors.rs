// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Admission error types.

use crate::validation::ErrorList;
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur during admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request or plugin configuration.
    #[error("{0}")]
    BadRequest(String),

    /// Invalid carries the field errors that caused an object to be rejected.
    #[error("{kind} \"{name}\" is invalid: {}", join_errors(.errors))]
    Invalid {
        kind: String,
        name: String,
        errors: ErrorList,
    },

    /// Internal represents an internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    /// Create a new BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create an Invalid error from a non-empty validation result.
    pub fn invalid(kind: impl Into<String>, name: impl Into<String>, errors: ErrorList) -> Self {
        AdmissionError::Invalid {
            kind: kind.into(),
            name: name.into(),
            errors,
        }
    }

    /// Create an Internal error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        AdmissionError::Internal(msg.into())
    }

    /// The field errors behind an Invalid error. Empty for other variants.
    pub fn field_errors(&self) -> &[crate::validation::FieldError] {
        match self {
            AdmissionError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &ErrorList) -> String {
    let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("[{}]", error_strings.join(", "))
}
