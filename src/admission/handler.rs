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

//! Base admission handler implementation.

use super::attributes::{Attributes, GroupResource};
use super::interfaces::{Interface, Operation};
use std::collections::HashSet;

/// Handler is embedded by admission plugins to decide which requests they see:
/// a set of operations, optionally narrowed to a set of resources.
#[derive(Debug, Clone)]
pub struct Handler {
    operations: HashSet<Operation>,
    resources: HashSet<GroupResource>,
}

impl Handler {
    /// Create a new Handler for the given operations on any resource.
    pub fn new(operations: &[Operation]) -> Self {
        Self {
            operations: operations.iter().copied().collect(),
            resources: HashSet::new(),
        }
    }

    /// A Handler for Create and Update, the operations that carry a new object.
    pub fn new_create_update() -> Self {
        Self::new(&[Operation::Create, Operation::Update])
    }

    /// Restrict the handler to the given resources.
    pub fn with_resources(mut self, resources: &[GroupResource]) -> Self {
        self.resources.extend(resources.iter().cloned());
        self
    }

    /// Reports whether the request targets a handled resource.
    pub fn handles_resource(&self, attributes: &dyn Attributes) -> bool {
        self.resources.is_empty()
            || self
                .resources
                .contains(&attributes.get_resource().group_resource())
    }
}

impl Interface for Handler {
    fn handles(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}
