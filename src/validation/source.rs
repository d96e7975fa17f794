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

//! Validation of build inputs.

use super::field::{ErrorList, FieldError, Path};
use super::filepath;
use super::names;
use super::reference::{validate_image_reference, validate_secret_ref};
use crate::api::build::{BinaryBuildSource, BuildSource, GitBuildSource, ImageSource, ImageSourcePath};

/// Maximum size of an inline Dockerfile, in bytes.
pub const MAX_DOCKERFILE_LENGTH_BYTES: usize = 60 * 1000;

pub fn validate_source(source: &BuildSource, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();

    if source.git.is_some() && source.binary.is_some() {
        errs.push(FieldError::invalid(
            &path.child("git"),
            "",
            "may not be set when binary is also set",
        ));
        errs.push(FieldError::invalid(
            &path.child("binary"),
            "",
            "may not be set when git is also set",
        ));
        return errs;
    }

    if let Some(git) = &source.git {
        errs.extend(validate_git_source(git, &path.child("git")));
    }
    if let Some(binary) = &source.binary {
        errs.extend(validate_binary_source(binary, &path.child("binary")));
    }
    if let Some(dockerfile) = &source.dockerfile {
        errs.extend(validate_dockerfile(dockerfile, &path.child("dockerfile")));
    }
    for (i, image) in source.images.iter().enumerate() {
        errs.extend(validate_image_source(image, &path.child("images").index(i)));
    }
    if source.is_empty() {
        errs.push(FieldError::invalid(
            path,
            "",
            "must provide a value for at least one of git, binary, images, or dockerfile",
        ));
    }

    errs.extend(validate_secret_ref(
        source.source_secret.as_ref(),
        &path.child("sourceSecret"),
    ));
    errs.extend(validate_relative_path(
        &source.context_dir,
        &path.child("contextDir"),
    ));

    errs
}

fn validate_git_source(git: &GitBuildSource, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();

    let uri_valid = if git.uri.is_empty() {
        errs.push(FieldError::required(&path.child("uri"), ""));
        false
    } else if !names::is_valid_url(&git.uri) {
        errs.push(FieldError::invalid(
            &path.child("uri"),
            git.uri.as_str(),
            "uri is not a valid url",
        ));
        false
    } else {
        true
    };

    for (proxy, field) in [(&git.http_proxy, "httpproxy"), (&git.https_proxy, "httpsproxy")] {
        if let Some(proxy) = proxy.as_deref() {
            if !proxy.is_empty() && !names::is_valid_url(proxy) {
                errs.push(FieldError::invalid(
                    &path.child(field),
                    proxy,
                    "proxy is not a valid url",
                ));
            }
        }
    }

    if uri_valid && git.has_proxy() {
        let scheme = names::url_scheme(&git.uri);
        if !matches!(scheme.as_deref(), Some("http") | Some("https")) {
            errs.push(FieldError::invalid(
                &path.child("uri"),
                git.uri.as_str(),
                "only http:// and https:// GIT protocols are allowed with HTTP or HTTPS proxy set",
            ));
        }
    }

    errs
}

/// Validate a binary input. `asFile`, when set, must name a single file.
pub fn validate_binary_source(binary: &BinaryBuildSource, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if binary.as_file.is_empty() {
        return errs;
    }
    let cleaned = filepath::clean(&binary.as_file);
    let cleaned = cleaned.trim_start_matches('/');
    if cleaned.is_empty()
        || cleaned == "."
        || filepath::escapes_base(cleaned)
        || cleaned.contains('/')
        || cleaned.contains('\\')
    {
        errs.push(FieldError::invalid(
            &path.child("asFile"),
            binary.as_file.as_str(),
            "file name may not contain slashes or relative path segments and must be a valid POSIX filename",
        ));
    }
    errs
}

fn validate_dockerfile(dockerfile: &str, path: &Path) -> ErrorList {
    if dockerfile.len() > MAX_DOCKERFILE_LENGTH_BYTES {
        return vec![FieldError::invalid(
            path,
            "",
            format!("must be smaller than {} bytes", MAX_DOCKERFILE_LENGTH_BYTES),
        )];
    }
    ErrorList::new()
}

fn validate_image_source(image: &ImageSource, path: &Path) -> ErrorList {
    let mut errs = validate_image_reference(&image.from, &path.child("from"));
    errs.extend(validate_secret_ref(
        image.pull_secret.as_ref(),
        &path.child("pullSecret"),
    ));
    if image.paths.is_empty() {
        errs.push(FieldError::required(&path.child("paths"), ""));
    }
    for (i, image_path) in image.paths.iter().enumerate() {
        errs.extend(validate_image_source_path(
            image_path,
            &path.child("paths").index(i),
        ));
    }
    errs
}

fn validate_image_source_path(image_path: &ImageSourcePath, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    if image_path.source_path.is_empty() {
        errs.push(FieldError::required(&path.child("sourcePath"), ""));
    } else if !filepath::is_abs(&image_path.source_path) {
        errs.push(FieldError::invalid(
            &path.child("sourcePath"),
            image_path.source_path.as_str(),
            "must be an absolute path",
        ));
    }
    errs.extend(validate_relative_path(
        &image_path.destination_dir,
        &path.child("destinationDir"),
    ));
    errs
}

/// Validate a path that must stay inside the directory it is relative to.
pub(crate) fn validate_relative_path(value: &str, path: &Path) -> ErrorList {
    let cleaned = filepath::clean(value);
    if filepath::is_abs(&cleaned) {
        return vec![FieldError::invalid(path, value, "absolute path not allowed")];
    }
    if filepath::escapes_base(&cleaned) {
        return vec![FieldError::invalid(
            path,
            value,
            "must be a relative path that does not step outside its base directory",
        )];
    }
    ErrorList::new()
}
