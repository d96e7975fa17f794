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

//! Image reference kinds and parsing of docker pull specs and stream tags.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Kind of a reference that names an image by its docker pull spec.
pub const DOCKER_IMAGE_KIND: &str = "DockerImage";

/// Kind of a reference that names an image stream tag (`<stream>:<tag>`).
pub const IMAGE_STREAM_TAG_KIND: &str = "ImageStreamTag";

/// Kind of a reference that names an image within a stream (`<stream>@<id>`).
pub const IMAGE_STREAM_IMAGE_KIND: &str = "ImageStreamImage";

/// Tag assumed when a reference does not carry one.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

static COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:[._\-]+[a-z0-9]+)*$").expect("valid regex"));

static REGISTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9.\-]+(?::[0-9]+)?$").expect("valid regex"));

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]{0,127}$").expect("valid regex"));

static DIGEST: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[+._\-][A-Za-z][A-Za-z0-9]*)*:[A-Fa-f0-9]{32,}$")
            .expect("valid regex")
    });

/// ReferenceError is returned when a docker pull spec cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("the docker pull spec must not be empty")]
    Empty,

    #[error("the docker pull spec {0:?} must be one, two, or three segments separated by slashes")]
    SegmentCount(String),

    #[error("invalid registry {0:?}")]
    InvalidRegistry(String),

    #[error("invalid repository component {0:?}")]
    InvalidComponent(String),

    #[error("invalid tag {0:?}")]
    InvalidTag(String),

    #[error("invalid digest {0:?}")]
    InvalidDigest(String),
}

/// DockerImageReference is a parsed docker pull spec:
/// `[registry/][namespace/]name[:tag][@digest]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerImageReference {
    pub registry: String,
    pub namespace: String,
    pub name: String,
    pub tag: String,
    pub id: String,
}

impl DockerImageReference {
    pub fn parse(spec: &str) -> Result<Self, ReferenceError> {
        if spec.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let mut reference = DockerImageReference::default();

        let remainder = match spec.split_once('@') {
            Some((rest, digest)) => {
                if !DIGEST.is_match(digest) {
                    return Err(ReferenceError::InvalidDigest(digest.to_string()));
                }
                reference.id = digest.to_string();
                rest
            }
            None => spec,
        };

        // A tag is a colon after the last slash; earlier colons belong to a registry port.
        let last_slash = remainder.rfind('/').map_or(0, |i| i + 1);
        let repository = match remainder[last_slash..].rfind(':') {
            Some(colon) => {
                let tag = &remainder[last_slash + colon + 1..];
                if !TAG.is_match(tag) {
                    return Err(ReferenceError::InvalidTag(tag.to_string()));
                }
                reference.tag = tag.to_string();
                &remainder[..last_slash + colon]
            }
            None => remainder,
        };

        let segments: Vec<&str> = repository.split('/').collect();
        if let Some(empty) = segments.iter().find(|s| s.is_empty()) {
            return Err(ReferenceError::InvalidComponent(empty.to_string()));
        }
        match segments.as_slice() {
            [name] => {
                reference.name = name.to_string();
            }
            [first, name] if looks_like_registry(first) => {
                reference.registry = first.to_string();
                reference.name = name.to_string();
            }
            [namespace, name] => {
                reference.namespace = namespace.to_string();
                reference.name = name.to_string();
            }
            [registry, namespace, name] => {
                reference.registry = registry.to_string();
                reference.namespace = namespace.to_string();
                reference.name = name.to_string();
            }
            _ => return Err(ReferenceError::SegmentCount(spec.to_string())),
        }

        if !reference.registry.is_empty() && !REGISTRY.is_match(&reference.registry) {
            return Err(ReferenceError::InvalidRegistry(reference.registry));
        }
        if !reference.namespace.is_empty() && !COMPONENT.is_match(&reference.namespace) {
            return Err(ReferenceError::InvalidComponent(reference.namespace));
        }
        if !COMPONENT.is_match(&reference.name) {
            return Err(ReferenceError::InvalidComponent(reference.name));
        }

        Ok(reference)
    }
}

fn looks_like_registry(segment: &str) -> bool {
    segment == "localhost" || segment.contains('.') || segment.contains(':')
}

impl fmt::Display for DockerImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.registry.is_empty() {
            write!(f, "{}/", self.registry)?;
        }
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        write!(f, "{}", self.name)?;
        if !self.tag.is_empty() {
            write!(f, ":{}", self.tag)?;
        }
        if !self.id.is_empty() {
            write!(f, "@{}", self.id)?;
        }
        Ok(())
    }
}

/// Split `<stream>:<tag>` into its parts.
///
/// Returns `None` when there is no colon. An empty tag becomes
/// [`DEFAULT_IMAGE_TAG`].
pub fn split_image_stream_tag(name_and_tag: &str) -> Option<(&str, &str)> {
    let (name, tag) = name_and_tag.split_once(':')?;
    if tag.is_empty() {
        return Some((name, DEFAULT_IMAGE_TAG));
    }
    Some((name, tag))
}
