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

//! Admission attributes that describe an admission request.

use super::interfaces::Operation;
use crate::api::build::{Build, BuildConfig, BuildRequest};
use crate::api::core::{ApiObject, Pod};

/// API group of the build resources.
pub const BUILD_GROUP: &str = "build.openshift.io";

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Returns just the group and resource portion.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// GroupResource identifies a resource without version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            resource: resource.to_string(),
        }
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Attributes describes an admission request to the plugins that decide on it.
pub trait Attributes {
    /// Returns the name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Returns the namespace associated with the request (if any).
    fn get_namespace(&self) -> &str;

    /// Returns the resource being requested.
    fn get_resource(&self) -> &GroupVersionResource;

    /// Returns the name of the subresource being requested.
    fn get_subresource(&self) -> &str;

    /// Returns the operation being performed.
    fn get_operation(&self) -> Operation;

    /// Returns the object from the incoming request.
    fn get_object(&self) -> Option<&dyn ApiObject>;

    /// Returns the object as a mutable reference.
    fn get_object_mut(&mut self) -> Option<&mut (dyn ApiObject + 'static)>;

    /// Returns the existing object (only populated for UPDATE requests).
    fn get_old_object(&self) -> Option<&dyn ApiObject>;

    /// Returns the kind of object being manipulated.
    fn get_kind(&self) -> &GroupVersionKind;
}

/// AttributesRecord is a concrete implementation of Attributes.
pub struct AttributesRecord {
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    pub subresource: String,
    pub operation: Operation,
    pub object: Option<Box<dyn ApiObject>>,
    pub old_object: Option<Box<dyn ApiObject>>,
    pub kind: GroupVersionKind,
}

impl AttributesRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        namespace: &str,
        resource: GroupVersionResource,
        subresource: &str,
        operation: Operation,
        object: Option<Box<dyn ApiObject>>,
        old_object: Option<Box<dyn ApiObject>>,
        kind: GroupVersionKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            resource,
            subresource: subresource.to_string(),
            operation,
            object,
            old_object,
            kind,
        }
    }

    /// Attributes for creating a pod.
    pub fn new_pod(pod: Pod) -> Self {
        Self::new(
            &pod.name.clone(),
            &pod.namespace.clone(),
            GroupVersionResource::new("", "v1", "pods"),
            "",
            Operation::Create,
            Some(Box::new(pod)),
            None,
            GroupVersionKind::new("", "v1", "Pod"),
        )
    }

    /// Attributes for creating a build, or updating `old` into it.
    pub fn new_build(operation: Operation, build: Build, old: Option<Build>) -> Self {
        Self::new(
            &build.metadata.name.clone(),
            &build.metadata.namespace.clone(),
            GroupVersionResource::new(BUILD_GROUP, "v1", "builds"),
            "",
            operation,
            Some(Box::new(build)),
            old.map(|b| Box::new(b) as Box<dyn ApiObject>),
            GroupVersionKind::new(BUILD_GROUP, "v1", "Build"),
        )
    }

    /// Attributes for creating a build config, or updating `old` into it.
    pub fn new_build_config(
        operation: Operation,
        config: BuildConfig,
        old: Option<BuildConfig>,
    ) -> Self {
        Self::new(
            &config.metadata.name.clone(),
            &config.metadata.namespace.clone(),
            GroupVersionResource::new(BUILD_GROUP, "v1", "buildconfigs"),
            "",
            operation,
            Some(Box::new(config)),
            old.map(|c| Box::new(c) as Box<dyn ApiObject>),
            GroupVersionKind::new(BUILD_GROUP, "v1", "BuildConfig"),
        )
    }

    /// Attributes for instantiating a build from a build config.
    pub fn new_build_request(request: BuildRequest) -> Self {
        Self::new(
            &request.metadata.name.clone(),
            &request.metadata.namespace.clone(),
            GroupVersionResource::new(BUILD_GROUP, "v1", "buildconfigs"),
            "instantiate",
            Operation::Create,
            Some(Box::new(request)),
            None,
            GroupVersionKind::new(BUILD_GROUP, "v1", "BuildRequest"),
        )
    }

    /// Get the pod from the object, if it is a pod.
    pub fn get_pod(&self) -> Option<&Pod> {
        self.object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<Pod>())
    }

    pub fn get_build(&self) -> Option<&Build> {
        self.object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<Build>())
    }

    pub fn get_build_config(&self) -> Option<&BuildConfig> {
        self.object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<BuildConfig>())
    }
}

impl Attributes for AttributesRecord {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_subresource(&self) -> &str {
        &self.subresource
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_object(&self) -> Option<&dyn ApiObject> {
        self.object.as_ref().map(|o| o.as_ref())
    }

    fn get_object_mut(&mut self) -> Option<&mut (dyn ApiObject + 'static)> {
        self.object.as_mut().map(|o| &mut **o)
    }

    fn get_old_object(&self) -> Option<&dyn ApiObject> {
        self.old_object.as_ref().map(|o| o.as_ref())
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }
}
