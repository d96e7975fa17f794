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

//! Plugin registry for admission controllers.

use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Interface;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Factory creates an admission plugin instance from an optional configuration
/// stream.
pub type Factory = fn(config: Option<&mut dyn Read>) -> AdmissionResult<Arc<dyn Interface>>;

/// Plugins is a registry of admission plugins.
#[derive(Default)]
pub struct Plugins {
    registry: RwLock<HashMap<String, Factory>>,
}

impl Plugins {
    /// Create a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new admission plugin with the given name and factory.
    pub fn register(&self, name: &str, factory: Factory) {
        let mut registry = self.registry.write().expect("plugin registry lock poisoned");
        if registry.insert(name.to_string(), factory).is_some() {
            debug!(plugin = name, "replaced admission plugin registration");
        }
    }

    /// Get a factory for the given plugin name.
    pub fn get_factory(&self, name: &str) -> Option<Factory> {
        let registry = self.registry.read().expect("plugin registry lock poisoned");
        registry.get(name).copied()
    }

    /// Get all registered plugin names, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let registry = self.registry.read().expect("plugin registry lock poisoned");
        let mut names: Vec<String> = registry.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a plugin is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        let registry = self.registry.read().expect("plugin registry lock poisoned");
        registry.contains_key(name)
    }

    /// Create a new instance of the named plugin.
    pub fn new_from_plugins(
        &self,
        name: &str,
        config: Option<&mut dyn Read>,
    ) -> AdmissionResult<Arc<dyn Interface>> {
        let factory = self.get_factory(name).ok_or_else(|| {
            AdmissionError::internal_error(format!("unknown admission plugin: {}", name))
        })?;
        factory(config)
    }
}
