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

//! Name and address grammars shared by the build validators.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::Cell;
use url::{ParseError, SyntaxViolation, Url};

/// Maximum length of a DNS-1123 label.
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Maximum length of a DNS-1123 subdomain.
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

static DNS1123_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

static DNS1123_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

static C_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static HOST_PORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9.\-]+:[0-9]+$").expect("valid regex"));

pub fn is_dns1123_label(value: &str) -> bool {
    value.len() <= DNS1123_LABEL_MAX_LENGTH && DNS1123_LABEL.is_match(value)
}

pub fn is_dns1123_subdomain(value: &str) -> bool {
    value.len() <= DNS1123_SUBDOMAIN_MAX_LENGTH && DNS1123_SUBDOMAIN.is_match(value)
}

/// C identifiers are the accepted environment variable names.
pub fn is_c_identifier(value: &str) -> bool {
    C_IDENTIFIER.is_match(value)
}

/// Returns the reason a name cannot be used as a single path segment, if any.
pub fn path_segment_name_error(name: &str) -> Option<&'static str> {
    if name == "." || name == ".." {
        return Some("may not be '.' or '..'");
    }
    if name.contains('/') {
        return Some("may not contain '/'");
    }
    if name.contains('%') {
        return Some("may not contain '%'");
    }
    None
}

/// Base that scheme-less references are resolved against.
static REFERENCE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://localhost/").expect("valid base url"));

/// Parse `raw`, resolving it against `base` when given. `Ok(false)` means the
/// parser only got through by skipping whitespace or a malformed percent escape.
fn parses_strictly(raw: &str, base: Option<&Url>) -> Result<bool, ParseError> {
    let lenient = Cell::new(false);
    let report = |violation: SyntaxViolation| {
        if matches!(
            violation,
            SyntaxViolation::PercentDecode
                | SyntaxViolation::TabOrNewlineIgnored
                | SyntaxViolation::C0SpaceIgnored
        ) {
            lenient.set(true);
        }
    };
    Url::options()
        .base_url(base)
        .syntax_violation_callback(Some(&report))
        .parse(raw)?;
    Ok(!lenient.get())
}

/// Reports whether `raw` parses as a URL reference.
///
/// Scheme-less references are accepted as relative references. A bare `host:port`
/// form is accepted too, as that is how proxies are commonly written.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.chars().any(char::is_control) {
        return false;
    }
    match parses_strictly(raw, None) {
        Ok(strict) => strict,
        Err(ParseError::RelativeUrlWithoutBase) => {
            // A colon in the first segment would otherwise read as a scheme.
            let end = raw.find(['/', '?', '#']).unwrap_or(raw.len());
            let first_segment = &raw[..end];
            if first_segment.contains(':') && !HOST_PORT.is_match(first_segment) {
                return false;
            }
            matches!(parses_strictly(raw, Some(&*REFERENCE_BASE)), Ok(true))
        }
        Err(_) => false,
    }
}

/// Returns the lowercased scheme of `raw`, if it has one.
pub fn url_scheme(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|url| url.scheme().to_string())
}
