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

//! Lexical handling of slash-separated paths inside build sources and images.
//!
//! These paths describe locations in a repository checkout or an image filesystem,
//! never on the host, so they are processed purely lexically.

/// Returns the shortest lexically equivalent form of `path`.
///
/// Repeated separators and `.` elements are dropped, and `..` elements consume the
/// element before them. `..` is discarded at the root of an absolute path and
/// kept at the front of a relative one. An empty result is `"."`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = is_abs(path);
    let mut parts: Vec<&str> = Vec::new();
    for element in path.split('/') {
        match element {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            element => parts.push(element),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

pub fn is_abs(path: &str) -> bool {
    path.starts_with('/')
}

/// Reports whether an already cleaned relative path steps above its base directory.
pub fn escapes_base(cleaned: &str) -> bool {
    cleaned == ".." || cleaned.starts_with("../")
}
