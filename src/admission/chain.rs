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

//! Ordered execution of a set of admission plugins.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use super::interfaces::Interface;
use super::plugins::Plugins;
use std::sync::Arc;
use tracing::debug;

/// Chain runs every mutating plugin in order, then every validating plugin in order.
/// The first error stops the chain.
#[derive(Clone, Default)]
pub struct Chain {
    plugins: Vec<Arc<dyn Interface>>,
}

impl Chain {
    pub fn new(plugins: Vec<Arc<dyn Interface>>) -> Self {
        Self { plugins }
    }

    /// Build a chain from registered plugins, without configuration.
    pub fn from_plugins(registry: &Plugins, names: &[&str]) -> AdmissionResult<Self> {
        let plugins = names
            .iter()
            .map(|name| registry.new_from_plugins(name, None))
            .collect::<AdmissionResult<Vec<_>>>()?;
        Ok(Self::new(plugins))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run the mutating then the validating phase over the request.
    pub fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        let operation = attributes.get_operation();
        for plugin in self.plugins.iter().filter(|p| p.handles(operation)) {
            if let Some(mutation) = plugin.as_mutation() {
                mutation.admit(attributes)?;
            }
        }
        for plugin in self.plugins.iter().filter(|p| p.handles(operation)) {
            if let Some(validation) = plugin.as_validation() {
                validation.validate(attributes)?;
            }
        }
        debug!(
            operation = %operation,
            resource = %attributes.get_resource().resource,
            object = attributes.get_name(),
            "admitted request"
        );
        Ok(())
    }
}
