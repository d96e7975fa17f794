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

//! Admission plugins module.

pub mod builddefaults;
pub mod buildutil;
pub mod buildvalidation;

use crate::admission::Plugins;

/// All ordered plugins in execution order.
///
/// Defaults are injected into build pods before anything validates them.
pub const ALL_ORDERED_PLUGINS: &[&str] = &[builddefaults::PLUGIN_NAME, buildvalidation::PLUGIN_NAME];

/// Register all admission plugins.
pub fn register_all_admission_plugins(plugins: &Plugins) {
    builddefaults::register(plugins);
    buildvalidation::register(plugins);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, Chain, Operation};
    use crate::api::build::{Build, BuildSource, BuildSpec, BuildStrategy, DockerBuildStrategy};
    use crate::api::core::ObjectMeta;

    #[test]
    fn test_all_ordered_plugins() {
        assert_eq!(ALL_ORDERED_PLUGINS, &["BuildDefaults", "BuildValidation"]);
    }

    #[test]
    fn test_register_all_admission_plugins() {
        let plugins = Plugins::new();
        register_all_admission_plugins(&plugins);
        for name in ALL_ORDERED_PLUGINS {
            assert!(plugins.is_registered(name), "{} not registered", name);
        }
        assert_eq!(plugins.registered_names().len(), ALL_ORDERED_PLUGINS.len());
    }

    #[test]
    fn test_default_chain() {
        let plugins = Plugins::new();
        register_all_admission_plugins(&plugins);
        let chain = Chain::from_plugins(&plugins, ALL_ORDERED_PLUGINS).unwrap();
        assert_eq!(chain.len(), 2);

        let build = Build::new(
            ObjectMeta::new("app-1", "ns"),
            BuildSpec {
                source: BuildSource::git("git://github.com/openshift/ruby-hello-world"),
                strategy: BuildStrategy::docker(DockerBuildStrategy::default()),
                ..Default::default()
            },
        );
        let mut attrs = AttributesRecord::new_build(Operation::Create, build, None);
        assert!(chain.admit(&mut attrs).is_ok());

        let mut attrs = AttributesRecord::new_build(Operation::Delete, Build::default(), None);
        assert!(chain.admit(&mut attrs).is_ok());
    }
}
