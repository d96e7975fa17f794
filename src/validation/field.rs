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

//! Field paths and field-scoped validation errors.
//!
//! A [`Path`] is built up from a root by appending child field names and list
//! indices, and renders as the dotted string consumers match on
//! (`spec.strategy.sourceStrategy.from.name`, `spec.triggers[1].imageChange`).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Path identifies a field within a nested object graph.
///
/// The root path renders as the empty string, which is also the path reported for
/// errors that concern the validated value as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a path rooted at the given field name.
    pub fn new(name: &str) -> Self {
        Self::root().child(name)
    }

    /// Returns a new path with the given field name appended.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    /// Returns a new path with the given list index appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// ErrorType classifies a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A mandatory field is absent.
    Required,
    /// A field is present but fails a format or semantic constraint.
    Invalid,
    /// A recognized value that is not allowed in this context.
    NotSupported,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Required => "FieldValueRequired",
            ErrorType::Invalid => "FieldValueInvalid",
            ErrorType::NotSupported => "FieldValueNotSupported",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// FieldError is a single validation failure scoped to a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub error_type: ErrorType,
    /// Dotted path of the offending field.
    pub field: String,
    /// The rejected value, rendered as a string. Empty for required fields.
    pub bad_value: String,
    pub detail: String,
}

/// ErrorList is the ordered result of a validation pass.
pub type ErrorList = Vec<FieldError>;

impl FieldError {
    pub fn new(
        error_type: ErrorType,
        path: &Path,
        bad_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field: path.to_string(),
            bad_value: bad_value.into(),
            detail: detail.into(),
        }
    }

    pub fn required(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, "", detail)
    }

    pub fn invalid(path: &Path, value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Invalid, path, value, detail)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_type {
            ErrorType::Required => write!(f, "{}: Required value", self.field)?,
            ErrorType::Invalid => {
                write!(f, "{}: Invalid value: \"{}\"", self.field, self.bad_value)?
            }
            ErrorType::NotSupported => {
                write!(f, "{}: Unsupported value: \"{}\"", self.field, self.bad_value)?
            }
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}
