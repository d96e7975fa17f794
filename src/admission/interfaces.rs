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

//! Core admission controller interfaces.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use std::fmt;

/// Operation is the type of resource operation being checked for admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Connect => write!(f, "CONNECT"),
        }
    }
}

/// Interface is an abstract, pluggable interface for Admission Control decisions.
///
/// Plugins built by a registry factory are handed out as `Arc<dyn Interface>`; the
/// `as_*` accessors expose the halves a plugin implements.
pub trait Interface: Send + Sync {
    /// Returns true if this admission controller can handle the given operation.
    fn handles(&self, operation: Operation) -> bool;

    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        None
    }

    fn as_validation(&self) -> Option<&dyn ValidationInterface> {
        None
    }
}

/// MutationInterface is an interface for admission plugins that can modify objects.
pub trait MutationInterface: Interface {
    /// Admit makes an admission decision based on the request attributes.
    /// It may modify the object in the attributes.
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()>;
}

/// ValidationInterface is an interface for admission plugins that validate objects.
pub trait ValidationInterface: Interface {
    /// Validate makes an admission decision based on the request attributes.
    /// It is NOT allowed to modify the object.
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::Handler;

    #[test]
    fn test_operation_display() {
        assert_eq!(format!("{}", Operation::Create), "CREATE");
        assert_eq!(format!("{}", Operation::Update), "UPDATE");
        assert_eq!(format!("{}", Operation::Delete), "DELETE");
        assert_eq!(format!("{}", Operation::Connect), "CONNECT");
    }

    #[test]
    fn test_interface_accessors_default_to_none() {
        let handler = Handler::new(&[Operation::Create]);
        assert!(handler.as_mutation().is_none());
        assert!(handler.as_validation().is_none());
    }
}
