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

//! Validation of build strategies and their environment.

use super::field::{ErrorList, ErrorType, FieldError, Path};
use super::names;
use super::reference::{validate_image_reference, validate_secret_ref};
use super::source::validate_relative_path;
use crate::api::build::{
    BuildStrategy, CustomBuildStrategy, DockerBuildStrategy, SourceBuildStrategy, StrategyRef,
};
use crate::api::core::EnvVar;

const C_IDENTIFIER_DETAIL: &str =
    "must be a C identifier (matching regex [A-Za-z_][A-Za-z0-9_]*): e.g. \"my_name\" or \"MyName\"";

pub fn validate_strategy(strategy: &BuildStrategy, path: &Path) -> ErrorList {
    let Some(resolved) = strategy.resolve() else {
        return vec![FieldError::invalid(
            path,
            "",
            "must provide a value for exactly one of sourceStrategy, customStrategy, or dockerStrategy",
        )];
    };

    let path = path.child(resolved.field_name());
    match resolved {
        StrategyRef::Source(s) => validate_source_strategy(s, &path),
        StrategyRef::Docker(d) => validate_docker_strategy(d, &path),
        StrategyRef::Custom(c) => validate_custom_strategy(c, &path),
    }
}

fn validate_source_strategy(strategy: &SourceBuildStrategy, path: &Path) -> ErrorList {
    let mut errs = validate_image_reference(&strategy.from, &path.child("from"));
    errs.extend(validate_secret_ref(
        strategy.pull_secret.as_ref(),
        &path.child("pullSecret"),
    ));
    errs.extend(validate_strategy_env(&strategy.env, &path.child("env")));
    errs
}

fn validate_docker_strategy(strategy: &DockerBuildStrategy, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if let Some(from) = &strategy.from {
        errs.extend(validate_image_reference(from, &path.child("from")));
    }
    errs.extend(validate_secret_ref(
        strategy.pull_secret.as_ref(),
        &path.child("pullSecret"),
    ));
    if !strategy.dockerfile_path.is_empty() {
        errs.extend(validate_relative_path(
            &strategy.dockerfile_path,
            &path.child("dockerfilePath"),
        ));
    }
    errs.extend(validate_strategy_env(&strategy.env, &path.child("env")));
    errs
}

fn validate_custom_strategy(strategy: &CustomBuildStrategy, path: &Path) -> ErrorList {
    let mut errs = validate_image_reference(&strategy.from, &path.child("from"));
    errs.extend(validate_secret_ref(
        strategy.pull_secret.as_ref(),
        &path.child("pullSecret"),
    ));
    errs.extend(validate_strategy_env(&strategy.env, &path.child("env")));
    errs
}

/// Validate environment variables handed to a build strategy.
///
/// Names must be C identifiers. Values must be literal: `valueFrom` is reported as
/// not supported.
pub fn validate_strategy_env(vars: &[EnvVar], path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    for (i, var) in vars.iter().enumerate() {
        let idx_path = path.index(i);
        if var.name.is_empty() {
            errs.push(FieldError::required(&idx_path.child("name"), ""));
        } else if !names::is_c_identifier(&var.name) {
            errs.push(FieldError::invalid(
                &idx_path.child("name"),
                var.name.as_str(),
                C_IDENTIFIER_DETAIL,
            ));
        }
        if var.value_from.is_some() {
            errs.push(FieldError::new(
                ErrorType::NotSupported,
                &idx_path.child("valueFrom"),
                "",
                "valueFrom is not supported in build strategy environment variables",
            ));
        }
    }
    errs
}
