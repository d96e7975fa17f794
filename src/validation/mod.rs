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

//! Validation of Build, BuildConfig and BuildRequest objects.
//!
//! Every validator is a pure function returning an [`ErrorList`]; an empty list
//! means the object is acceptable. Errors from independent checks accumulate in a
//! stable order, and a check is skipped when something it depends on is missing.

pub mod field;
pub mod filepath;
pub mod names;
mod reference;
mod source;
mod strategy;
mod trigger;

pub use field::{ErrorList, ErrorType, FieldError, Path};
pub use reference::{validate_image_reference, validate_output};
pub use source::MAX_DOCKERFILE_LENGTH_BYTES;
pub use strategy::validate_strategy_env;
pub use trigger::validate_trigger;

use crate::api::build::{Build, BuildConfig, BuildRequest, BuildSpec};
use crate::api::core::ObjectMeta;

/// Validate the specification shared by builds and build configs.
pub fn validate_build_spec(spec: &BuildSpec, path: &Path) -> ErrorList {
    let mut errs = source::validate_source(&spec.source, &path.child("source"));

    if let Some(deadline) = spec.completion_deadline_seconds {
        if deadline <= 0 {
            errs.push(FieldError::invalid(
                &path.child("completionDeadlineSeconds"),
                deadline.to_string(),
                "completionDeadlineSeconds must be a positive integer greater than 0",
            ));
        }
    }

    errs.extend(validate_output(&spec.output, &path.child("output")));
    errs.extend(strategy::validate_strategy(&spec.strategy, &path.child("strategy")));
    errs
}

pub fn validate_build(build: &Build) -> ErrorList {
    let mut errs = validate_object_meta(&build.metadata, &Path::new("metadata"));
    errs.extend(validate_build_spec(&build.spec, &Path::new("spec")));
    errs
}

/// Validate a build replacing `old`.
///
/// The spec of a build is immutable, and a build in a terminal phase may not move
/// to another phase.
pub fn validate_build_update(build: &Build, old: &Build) -> ErrorList {
    let mut errs = validate_object_meta_update(&build.metadata, &old.metadata, &Path::new("metadata"));
    errs.extend(validate_build(build));

    if old.status.phase.is_terminal() && build.status.phase != old.status.phase {
        errs.push(FieldError::invalid(
            &Path::new("status").child("phase"),
            build.status.phase.as_str(),
            format!(
                "phase cannot be updated from a terminal state ({})",
                old.status.phase
            ),
        ));
    }
    if build.spec != old.spec {
        errs.push(FieldError::invalid(
            &Path::new("spec"),
            "",
            "spec is immutable",
        ));
    }
    errs
}

pub fn validate_build_config(config: &BuildConfig) -> ErrorList {
    let mut errs = validate_object_meta(&config.metadata, &Path::new("metadata"));
    let spec_path = Path::new("spec");
    errs.extend(trigger::validate_image_change_triggers(
        config,
        &spec_path.child("triggers"),
    ));
    errs.extend(validate_build_spec(&config.spec.build_spec, &spec_path));
    errs
}

/// Validate a build config replacing `old`. Only identity is immutable.
pub fn validate_build_config_update(config: &BuildConfig, old: &BuildConfig) -> ErrorList {
    let mut errs =
        validate_object_meta_update(&config.metadata, &old.metadata, &Path::new("metadata"));
    errs.extend(validate_build_config(config));
    errs
}

pub fn validate_build_request(request: &BuildRequest) -> ErrorList {
    let mut errs = validate_object_meta(&request.metadata, &Path::new("metadata"));
    if let Some(from) = &request.from {
        errs.extend(validate_image_reference(from, &Path::new("from")));
    }
    if let Some(binary) = &request.binary {
        errs.extend(source::validate_binary_source(binary, &Path::new("binary")));
    }
    errs.extend(validate_strategy_env(&request.env, &Path::new("env")));
    errs
}

fn validate_object_meta(meta: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();

    if meta.name.is_empty() {
        errs.push(FieldError::required(&path.child("name"), "name or generateName is required"));
    } else if let Some(msg) = names::path_segment_name_error(&meta.name) {
        errs.push(FieldError::invalid(&path.child("name"), meta.name.as_str(), msg));
    }

    if meta.namespace.is_empty() {
        errs.push(FieldError::required(&path.child("namespace"), ""));
    } else if !names::is_dns1123_label(&meta.namespace) {
        errs.push(FieldError::invalid(
            &path.child("namespace"),
            meta.namespace.as_str(),
            format!(
                "must be a DNS label (at most {} characters, matching regex [a-z0-9]([-a-z0-9]*[a-z0-9])?)",
                names::DNS1123_LABEL_MAX_LENGTH
            ),
        ));
    }

    errs
}

fn validate_object_meta_update(meta: &ObjectMeta, old: &ObjectMeta, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if meta.name != old.name {
        errs.push(FieldError::invalid(
            &path.child("name"),
            meta.name.as_str(),
            "field is immutable",
        ));
    }
    if meta.namespace != old.namespace {
        errs.push(FieldError::invalid(
            &path.child("namespace"),
            meta.namespace.as_str(),
            "field is immutable",
        ));
    }
    errs
}
