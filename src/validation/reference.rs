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

//! Validation of image references, secret references and build output.

use super::field::{ErrorList, FieldError, Path};
use super::names;
use crate::api::build::BuildOutput;
use crate::api::core::{LocalObjectReference, ObjectReference};
use crate::api::image::{
    split_image_stream_tag, DockerImageReference, DOCKER_IMAGE_KIND, IMAGE_STREAM_IMAGE_KIND,
    IMAGE_STREAM_TAG_KIND,
};

const INVALID_KIND_DETAIL: &str =
    "the referenced object must be one of 'ImageStreamTag', 'ImageStreamImage', or 'DockerImage'";

/// Validate a reference to an image the build reads from or writes to.
///
/// An empty kind is reported alone: without a kind there is no grammar to check
/// the name against.
pub fn validate_image_reference(reference: &ObjectReference, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    let name = reference.name.as_str();
    let namespace = reference.namespace.as_str();

    match reference.kind.as_str() {
        "" => {
            errs.push(FieldError::required(&path.child("kind"), ""));
        }
        IMAGE_STREAM_TAG_KIND => {
            if name.is_empty() {
                errs.push(FieldError::required(&path.child("name"), ""));
            } else {
                match split_image_stream_tag(name) {
                    None => errs.push(FieldError::invalid(
                        &path.child("name"),
                        name,
                        "ImageStreamTag object references must be in the form <name>:<tag>",
                    )),
                    Some((stream, _)) if stream.is_empty() => errs.push(FieldError::invalid(
                        &path.child("name"),
                        name,
                        "ImageStreamTag name may not be empty",
                    )),
                    Some((stream, _)) => {
                        if let Some(msg) = names::path_segment_name_error(stream) {
                            errs.push(FieldError::invalid(
                                &path.child("name"),
                                name,
                                format!("ImageStreamTag name {}", msg),
                            ));
                        }
                    }
                }
            }
            errs.extend(validate_reference_namespace(namespace, path));
        }
        DOCKER_IMAGE_KIND => {
            if !namespace.is_empty() {
                errs.push(FieldError::invalid(
                    &path.child("namespace"),
                    namespace,
                    "namespace is not valid when used with a 'DockerImage'",
                ));
            }
            if name.is_empty() {
                errs.push(FieldError::required(&path.child("name"), ""));
            } else if let Err(err) = DockerImageReference::parse(name) {
                errs.push(FieldError::invalid(
                    &path.child("name"),
                    name,
                    format!("name is not a valid Docker pull specification: {}", err),
                ));
            }
        }
        IMAGE_STREAM_IMAGE_KIND => {
            if name.is_empty() {
                errs.push(FieldError::required(&path.child("name"), ""));
            }
            errs.extend(validate_reference_namespace(namespace, path));
        }
        kind => {
            errs.push(FieldError::invalid(&path.child("kind"), kind, INVALID_KIND_DETAIL));
        }
    }

    errs
}

fn validate_reference_namespace(namespace: &str, path: &Path) -> ErrorList {
    if namespace.is_empty() || names::is_dns1123_subdomain(namespace) {
        return ErrorList::new();
    }
    vec![FieldError::invalid(
        &path.child("namespace"),
        namespace,
        "namespace must be a valid subdomain",
    )]
}

/// Validate a reference to a secret in the object's namespace.
pub fn validate_secret_ref(secret: Option<&LocalObjectReference>, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    let Some(secret) = secret else {
        return errs;
    };
    if secret.name.is_empty() {
        errs.push(FieldError::required(&path.child("name"), ""));
    } else if !names::is_dns1123_subdomain(&secret.name) {
        errs.push(FieldError::invalid(
            &path.child("name"),
            secret.name.as_str(),
            "name must be a valid subdomain",
        ));
    }
    errs
}

/// Validate where the built image is pushed. A missing target is allowed.
pub fn validate_output(output: &BuildOutput, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if let Some(to) = &output.to {
        errs.extend(validate_image_reference(to, &path.child("to")));
    }
    errs.extend(validate_secret_ref(
        output.push_secret.as_ref(),
        &path.child("pushSecret"),
    ));
    errs
}
