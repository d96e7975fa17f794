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

//! Build admission for a container-build subsystem.
//!
//! The crate validates Build, BuildConfig and BuildRequest objects, enforces the
//! allowed transitions on build updates, and injects proxy and environment defaults
//! into build pods. Validation is a set of pure functions returning field errors;
//! the admission plugins wrap them in the usual mutating/validating interfaces.

pub mod admission;
pub mod api;
pub mod plugins;
pub mod validation;

// Re-export commonly used types
pub use admission::{
    AdmissionError, AdmissionResult, Attributes, AttributesRecord, Chain, Interface,
    MutationInterface, Operation, Plugins, ValidationInterface,
};
pub use api::build::{Build, BuildConfig, BuildRequest, BuildSpec};
pub use validation::{ErrorList, FieldError, Path};
