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

//! Helpers for plugins that act on build pods.
//!
//! A build pod carries the serialized build it runs in the `BUILD` environment
//! variable of its first container, and names that build in an annotation.

use crate::admission::{AdmissionError, AdmissionResult, Attributes};
use crate::api::build::Build;
use crate::api::core::{resource, EnvVar, Pod};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Annotation on a build pod naming the build it runs.
pub const BUILD_ANNOTATION: &str = "openshift.io/build.name";

/// Environment variable holding the serialized build.
pub const BUILD_ENV_VAR: &str = "BUILD";

/// Build as it is serialized into a pod, with its type information.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildEnvelope {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    api_version: String,
    #[serde(flatten)]
    build: Build,
}

fn pod(attributes: &dyn Attributes) -> Option<&Pod> {
    attributes.get_object()?.as_any().downcast_ref::<Pod>()
}

fn pod_mut(attributes: &mut dyn Attributes) -> Option<&mut Pod> {
    attributes.get_object_mut()?.as_any_mut().downcast_mut::<Pod>()
}

/// Returns true if the request creates a pod that runs a build.
pub fn is_build_pod(attributes: &dyn Attributes) -> bool {
    if attributes.get_resource().group_resource() != resource("pods") {
        return false;
    }
    if !attributes.get_subresource().is_empty() {
        return false;
    }
    let Some(pod) = pod(attributes) else {
        return false;
    };
    if !pod.annotations.contains_key(BUILD_ANNOTATION) {
        return false;
    }
    pod.spec
        .containers
        .first()
        .is_some_and(|c| c.env_var(BUILD_ENV_VAR).is_some())
}

/// Decodes the build carried by a build pod. Returns the build and the API
/// version it was encoded with.
pub fn get_build(attributes: &dyn Attributes) -> AdmissionResult<(Build, String)> {
    let pod = pod(attributes)
        .ok_or_else(|| AdmissionError::bad_request("unable to get build from pod: not a pod"))?;
    let value = pod
        .spec
        .containers
        .first()
        .and_then(|c| c.env_var(BUILD_ENV_VAR))
        .map(|v| v.value.as_str())
        .ok_or_else(|| {
            AdmissionError::bad_request(format!(
                "unable to get build from pod: {} environment variable not found",
                BUILD_ENV_VAR
            ))
        })?;
    let envelope: BuildEnvelope = serde_json::from_str(value).map_err(|e| {
        AdmissionError::bad_request(format!("unable to get build from pod: {}", e))
    })?;
    Ok((envelope.build, envelope.api_version))
}

/// Lays the fields of `typed` over `original`. Keys the build model does not
/// know about stay as they were in `original`.
fn overlay(original: &mut Value, typed: Value) {
    match (original, typed) {
        (Value::Object(original), Value::Object(typed)) => {
            for (key, value) in typed {
                match original.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        original.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(original), Value::Array(typed)) => {
            original.truncate(typed.len());
            let known = original.len();
            for (i, value) in typed.into_iter().enumerate() {
                if i < known {
                    overlay(&mut original[i], value);
                } else {
                    original.push(value);
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Encodes `build` with the given API version back into the build pod. Fields of
/// the encoded build that `Build` does not model are carried over.
pub fn set_build(attributes: &mut dyn Attributes, build: &Build, version: &str) -> AdmissionResult<()> {
    let envelope = BuildEnvelope {
        kind: "Build".to_string(),
        api_version: version.to_string(),
        build: build.clone(),
    };
    let typed = serde_json::to_value(&envelope)
        .map_err(|e| AdmissionError::internal_error(format!("unable to encode build: {}", e)))?;

    let var = pod_mut(attributes)
        .and_then(|pod| pod.spec.containers.first_mut())
        .and_then(|c| c.env_var_mut(BUILD_ENV_VAR))
        .ok_or_else(|| {
            AdmissionError::bad_request(format!(
                "unable to set build on pod: {} environment variable not found",
                BUILD_ENV_VAR
            ))
        })?;
    let mut document = match serde_json::from_str::<Value>(&var.value) {
        Ok(original @ Value::Object(_)) => original,
        _ => Value::Object(Map::new()),
    };
    overlay(&mut document, typed);
    var.value = serde_json::to_string(&document)
        .map_err(|e| AdmissionError::internal_error(format!("unable to encode build: {}", e)))?;
    Ok(())
}

/// The environment of the build's strategy, if it has exactly one strategy.
pub fn build_env_mut(build: &mut Build) -> Option<&mut Vec<EnvVar>> {
    build.spec.strategy.env_mut()
}

/// Builds a pod that runs `build`, encoded with `version`.
#[cfg(test)]
pub(crate) fn build_pod(build: &Build, version: &str) -> Pod {
    use crate::api::core::Container;

    let envelope = BuildEnvelope {
        kind: "Build".to_string(),
        api_version: version.to_string(),
        build: build.clone(),
    };
    let mut container = Container::new("build", "builder");
    container.env.push(EnvVar::new(
        BUILD_ENV_VAR,
        &serde_json::to_string(&envelope).unwrap(),
    ));

    let mut pod = Pod::new(&format!("{}-build", build.metadata.name), &build.metadata.namespace);
    pod.annotations
        .insert(BUILD_ANNOTATION.to_string(), build.metadata.name.clone());
    pod.spec.containers.push(container);
    pod
}
