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

//! BuildValidation admission controller.
//!
//! Rejects malformed builds, build configs and build requests. Its mutating half
//! rewrites source and Dockerfile paths into their cleaned form first, so that
//! persisted objects always carry normalized paths.

use crate::admission::attributes::{GroupResource, BUILD_GROUP};
use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface,
    Operation, Plugins, ValidationInterface,
};
use crate::api::build::{Build, BuildConfig, BuildRequest};
use crate::api::core::ApiObject;
use crate::validation::{self, ErrorList};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Plugin name for the BuildValidation admission controller.
pub const PLUGIN_NAME: &str = "BuildValidation";

/// Subresource used to instantiate a build from a build config.
pub const INSTANTIATE_SUBRESOURCE: &str = "instantiate";

/// Register the BuildValidation plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, |_config: Option<&mut dyn Read>| {
        Ok(Arc::new(Plugin::new()) as Arc<dyn Interface>)
    });
}

/// The build object a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Build,
    BuildConfig,
    BuildRequest,
}

fn target(attributes: &dyn Attributes) -> Option<Target> {
    let resource = attributes.get_resource().group_resource();
    let subresource = attributes.get_subresource();
    if resource == GroupResource::new(BUILD_GROUP, "builds") && subresource.is_empty() {
        Some(Target::Build)
    } else if resource == GroupResource::new(BUILD_GROUP, "buildconfigs") {
        match subresource {
            "" => Some(Target::BuildConfig),
            INSTANTIATE_SUBRESOURCE => Some(Target::BuildRequest),
            _ => None,
        }
    } else {
        None
    }
}

fn downcast<'a, T: 'static>(obj: Option<&'a dyn ApiObject>, kind: &str) -> AdmissionResult<&'a T> {
    obj.and_then(|o| o.as_any().downcast_ref::<T>()).ok_or_else(|| {
        AdmissionError::bad_request(format!(
            "resource was marked with kind {} but was unable to be converted",
            kind
        ))
    })
}

/// Plugin is an implementation of the BuildValidation admission controller.
pub struct Plugin {
    handler: Handler,
}

impl Plugin {
    /// Create a new BuildValidation admission controller.
    pub fn new() -> Self {
        debug!(plugin = PLUGIN_NAME, "created admission plugin");
        Self {
            handler: Handler::new_create_update().with_resources(&[
                GroupResource::new(BUILD_GROUP, "builds"),
                GroupResource::new(BUILD_GROUP, "buildconfigs"),
            ]),
        }
    }

    fn validate_build(attributes: &dyn Attributes) -> AdmissionResult<ErrorList> {
        let build = downcast::<Build>(attributes.get_object(), "Build")?;
        Ok(match attributes.get_operation() {
            Operation::Update => {
                let old = downcast::<Build>(attributes.get_old_object(), "Build")?;
                validation::validate_build_update(build, old)
            }
            _ => validation::validate_build(build),
        })
    }

    fn validate_build_config(attributes: &dyn Attributes) -> AdmissionResult<ErrorList> {
        let config = downcast::<BuildConfig>(attributes.get_object(), "BuildConfig")?;
        Ok(match attributes.get_operation() {
            Operation::Update => {
                let old = downcast::<BuildConfig>(attributes.get_old_object(), "BuildConfig")?;
                validation::validate_build_config_update(config, old)
            }
            _ => validation::validate_build_config(config),
        })
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }

    fn as_validation(&self) -> Option<&dyn ValidationInterface> {
        Some(self)
    }
}

impl MutationInterface for Plugin {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        if !self.handler.handles_resource(attributes) {
            return Ok(());
        }
        let Some(target) = target(attributes) else {
            return Ok(());
        };
        let Some(obj) = attributes.get_object_mut() else {
            return Ok(());
        };
        match target {
            Target::Build => {
                if let Some(build) = obj.as_any_mut().downcast_mut::<Build>() {
                    build.spec.normalize();
                }
            }
            Target::BuildConfig => {
                if let Some(config) = obj.as_any_mut().downcast_mut::<BuildConfig>() {
                    config.spec.build_spec.normalize();
                }
            }
            Target::BuildRequest => {}
        }
        Ok(())
    }
}

impl ValidationInterface for Plugin {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if !self.handler.handles_resource(attributes) {
            return Ok(());
        }
        let Some(target) = target(attributes) else {
            return Ok(());
        };

        let (kind, errs) = match target {
            Target::Build => ("Build", Self::validate_build(attributes)?),
            Target::BuildConfig => ("BuildConfig", Self::validate_build_config(attributes)?),
            Target::BuildRequest => {
                let request = downcast::<BuildRequest>(attributes.get_object(), "BuildRequest")?;
                ("BuildRequest", validation::validate_build_request(request))
            }
        };
        if errs.is_empty() {
            return Ok(());
        }

        let name = attributes.get_name().to_string();
        warn!(
            kind,
            namespace = attributes.get_namespace(),
            object = %name,
            operation = %attributes.get_operation(),
            errors = errs.len(),
            "rejected invalid object"
        );
        Err(AdmissionError::invalid(kind, name, errs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, Chain};
    use crate::api::build::{
        BuildConfigSpec, BuildPhase, BuildSource, BuildSpec, BuildStrategy, DockerBuildStrategy,
        SourceBuildStrategy,
    };
    use crate::api::core::{ObjectMeta, ObjectReference, Pod};
    use crate::validation::ErrorType;

    fn valid_spec() -> BuildSpec {
        BuildSpec {
            source: BuildSource::git("https://github.com/openshift/ruby-hello-world"),
            strategy: BuildStrategy::source(SourceBuildStrategy {
                from: ObjectReference::new("DockerImage", "openshift/ruby-20-centos7"),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn valid_build() -> Build {
        Build::new(ObjectMeta::new("app-1", "ns"), valid_spec())
    }

    fn valid_config() -> BuildConfig {
        BuildConfig {
            metadata: ObjectMeta::new("app", "ns"),
            spec: BuildConfigSpec {
                build_spec: valid_spec(),
                triggers: Vec::new(),
            },
            ..Default::default()
        }
    }

    fn validate(attrs: &AttributesRecord) -> AdmissionResult<()> {
        Plugin::new().validate(attrs)
    }

    #[test]
    fn test_handles() {
        let plugin = Plugin::new();
        assert!(plugin.handles(Operation::Create));
        assert!(plugin.handles(Operation::Update));
        assert!(!plugin.handles(Operation::Delete));
        assert!(!plugin.handles(Operation::Connect));
    }

    #[test]
    fn test_validate_valid_objects() {
        let attrs = AttributesRecord::new_build(Operation::Create, valid_build(), None);
        assert!(validate(&attrs).is_ok());

        let attrs = AttributesRecord::new_build_config(Operation::Create, valid_config(), None);
        assert!(validate(&attrs).is_ok());

        let request = BuildRequest {
            metadata: ObjectMeta::new("app", "ns"),
            ..Default::default()
        };
        assert!(validate(&AttributesRecord::new_build_request(request)).is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_build() {
        let mut build = valid_build();
        build.spec.source = BuildSource::default();
        let attrs = AttributesRecord::new_build(Operation::Create, build, None);

        let err = validate(&attrs).unwrap_err();
        match &err {
            AdmissionError::Invalid { kind, name, errors } => {
                assert_eq!(kind, "Build");
                assert_eq!(name, "app-1");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].error_type, ErrorType::Invalid);
                assert_eq!(errors[0].field, "spec.source");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_build_update_transitions() {
        let old = valid_build().with_phase(BuildPhase::Complete);
        let attrs = AttributesRecord::new_build(
            Operation::Update,
            old.clone().with_phase(BuildPhase::Running),
            Some(old.clone()),
        );
        let err = validate(&attrs).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "status.phase");

        let attrs = AttributesRecord::new_build(Operation::Update, old.clone(), Some(old));
        assert!(validate(&attrs).is_ok());
    }

    #[test]
    fn test_validate_build_update_without_old_object() {
        let attrs = AttributesRecord::new_build(Operation::Update, valid_build(), None);
        assert!(matches!(validate(&attrs), Err(AdmissionError::BadRequest(_))));
    }

    #[test]
    fn test_validate_build_config_update() {
        let old = valid_config();
        let mut config = old.clone();
        config.metadata.name = "renamed".to_string();
        let attrs = AttributesRecord::new_build_config(Operation::Update, config, Some(old));
        let err = validate(&attrs).unwrap_err();
        assert!(matches!(err, AdmissionError::Invalid { ref kind, .. } if kind == "BuildConfig"));
        assert_eq!(err.field_errors()[0].field, "metadata.name");
    }

    #[test]
    fn test_validate_rejects_invalid_build_request() {
        let request = BuildRequest {
            metadata: ObjectMeta::new("", "ns"),
            ..Default::default()
        };
        let err = validate(&AttributesRecord::new_build_request(request)).unwrap_err();
        assert!(matches!(err, AdmissionError::Invalid { ref kind, .. } if kind == "BuildRequest"));
    }

    #[test]
    fn test_ignores_other_resources() {
        let attrs = AttributesRecord::new_pod(Pod::new("web", "ns"));
        assert!(validate(&attrs).is_ok());

        let mut attrs = AttributesRecord::new_build(Operation::Create, Build::default(), None);
        attrs.subresource = "log".to_string();
        assert!(validate(&attrs).is_ok());
    }

    #[test]
    fn test_admit_normalizes_paths() {
        let mut build = valid_build();
        build.spec.source.context_dir = ".".to_string();
        build.spec.strategy = BuildStrategy::docker(DockerBuildStrategy {
            dockerfile_path: "./docker/../Dockerfile".to_string(),
            ..Default::default()
        });
        let mut attrs = AttributesRecord::new_build(Operation::Create, build, None);
        Plugin::new().admit(&mut attrs).unwrap();

        let spec = &attrs.get_build().unwrap().spec;
        assert_eq!(spec.source.context_dir, "");
        assert_eq!(
            spec.strategy.docker_strategy.as_ref().unwrap().dockerfile_path,
            "Dockerfile"
        );
    }

    #[test]
    fn test_chain_normalizes_then_validates() {
        let plugins = Plugins::new();
        register(&plugins);
        let chain = Chain::from_plugins(&plugins, &[PLUGIN_NAME]).unwrap();

        let mut config = valid_config();
        config.spec.build_spec.source.context_dir = "app/./src/".to_string();
        let mut attrs = AttributesRecord::new_build_config(Operation::Create, config, None);
        chain.admit(&mut attrs).unwrap();
        assert_eq!(
            attrs.get_build_config().unwrap().spec.build_spec.source.context_dir,
            "app/src"
        );

        let mut config = valid_config();
        config.spec.build_spec.source.context_dir = "../outside".to_string();
        let mut attrs = AttributesRecord::new_build_config(Operation::Create, config, None);
        let err = chain.admit(&mut attrs).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "spec.source.contextDir");
    }
}
