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

//! Core API types shared by build objects and build pods (metadata, references,
//! environment variables, Pod, Container).

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// ApiObject is a trait for API objects that can be carried through admission.
pub trait ApiObject: Send + Sync {
    /// Returns the object as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the object as mutable Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the kind of this object.
    fn kind(&self) -> &str;
}

// ============================================================================
// Object metadata and references
// ============================================================================

/// ObjectMeta is the metadata every persisted object carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }
}

/// ObjectReference points at another object, optionally in another namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectReference {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl ObjectReference {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: String::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }
}

/// LocalObjectReference points at an object in the same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalObjectReference {
    pub name: String,
}

impl LocalObjectReference {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

// ============================================================================
// Environment variables
// ============================================================================

/// ObjectFieldSelector selects a field of the owning object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectFieldSelector {
    pub field_path: String,
}

/// SecretKeySelector selects a key of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

/// EnvVarSource is an indirect source for an environment variable value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVarSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<ObjectFieldSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeySelector>,
}

/// EnvVar is a named environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            value_from: None,
        }
    }
}

// ============================================================================
// Pod
// ============================================================================

/// Container represents a single container in a pod.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    /// Name of the container.
    pub name: String,
    /// Container image name.
    pub image: String,
    /// Environment variables set in the container.
    pub env: Vec<EnvVar>,
}

impl Container {
    /// Create a new container with the given name and image.
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            env: Vec::new(),
        }
    }

    /// Returns the environment variable with the given name.
    pub fn env_var(&self, name: &str) -> Option<&EnvVar> {
        self.env.iter().find(|e| e.name == name)
    }

    pub fn env_var_mut(&mut self, name: &str) -> Option<&mut EnvVar> {
        self.env.iter_mut().find(|e| e.name == name)
    }
}

/// PodSpec describes the specification of a pod.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PodSpec {
    /// List of containers.
    pub containers: Vec<Container>,
}

/// Pod represents a Kubernetes Pod.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pod {
    /// Name of the pod.
    pub name: String,
    /// Namespace of the pod.
    pub namespace: String,
    /// Pod specification.
    pub spec: PodSpec,
    /// Annotations is an unstructured key value map.
    pub annotations: HashMap<String, String>,
}

impl Pod {
    /// Create a new pod with the given name and namespace.
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            spec: PodSpec::default(),
            annotations: HashMap::new(),
        }
    }
}

impl ApiObject for Pod {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "Pod"
    }
}

/// Helper to create a core-group resource.
pub fn resource(name: &str) -> crate::admission::attributes::GroupResource {
    crate::admission::attributes::GroupResource::new("", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_serialization_omits_empty_fields() {
        let json = serde_json::to_value(EnvVar::new("VAR1", "")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "VAR1"}));

        let parsed: EnvVar =
            serde_json::from_str(r#"{"name":"X","valueFrom":{"fieldRef":{"fieldPath":"metadata.name"}}}"#)
                .unwrap();
        assert_eq!(parsed.name, "X");
        assert_eq!(
            parsed.value_from.unwrap().field_ref.unwrap().field_path,
            "metadata.name"
        );
    }

    #[test]
    fn test_container_env_lookup() {
        let mut c = Container::new("build", "builder:latest");
        c.env.push(EnvVar::new("BUILD", "{}"));
        assert!(c.env_var("BUILD").is_some());
        assert!(c.env_var("OTHER").is_none());
        c.env_var_mut("BUILD").unwrap().value = "changed".to_string();
        assert_eq!(c.env_var("BUILD").unwrap().value, "changed");
    }

    #[test]
    fn test_object_reference_builder() {
        let r = ObjectReference::new("ImageStreamTag", "ruby:2.0").with_namespace("openshift");
        assert_eq!(r.kind, "ImageStreamTag");
        assert_eq!(r.namespace, "openshift");
        assert_eq!(Pod::new("p", "ns").kind(), "Pod");
    }
}
