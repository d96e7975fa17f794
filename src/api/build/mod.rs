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

//! Build API types: Build, BuildConfig, BuildRequest and their specifications.
//!
//! The types mirror the JSON shape used on the wire: the strategy and the trigger
//! companions are optional fields, exactly one of which is expected to be set.
//! [`BuildStrategy::resolve`] gives typed access to the strategy that is set, and
//! validation reports the shapes that do not resolve.

use crate::api::core::{ApiObject, EnvVar, LocalObjectReference, ObjectMeta, ObjectReference};
use crate::validation::filepath;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

// ============================================================================
// Source
// ============================================================================

/// GitBuildSource describes a git repository to build from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitBuildSource {
    pub uri: String,
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub git_ref: String,
    #[serde(rename = "httpProxy", skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(rename = "httpsProxy", skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
}

impl GitBuildSource {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    /// Reports whether either proxy is set to a non-empty address.
    pub fn has_proxy(&self) -> bool {
        let set = |p: &Option<String>| p.as_deref().is_some_and(|p| !p.is_empty());
        set(&self.http_proxy) || set(&self.https_proxy)
    }
}

/// BinaryBuildSource describes binary content streamed in at build time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryBuildSource {
    /// When set, the binary stream is saved as a single file with this name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub as_file: String,
}

/// ImageSourcePath is a path copied out of an image into the build context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSourcePath {
    pub source_path: String,
    pub destination_dir: String,
}

impl ImageSourcePath {
    pub fn new(source_path: &str, destination_dir: &str) -> Self {
        Self {
            source_path: source_path.to_string(),
            destination_dir: destination_dir.to_string(),
        }
    }
}

/// ImageSource copies content from an image into the build context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSource {
    pub from: ObjectReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<ImageSourcePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<LocalObjectReference>,
}

/// BuildSource is the set of inputs for a build. Inputs may be combined,
/// except git and binary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitBuildSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryBuildSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageSource>,
    /// Sub-directory of the source the build runs from.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_secret: Option<LocalObjectReference>,
}

impl BuildSource {
    pub fn git(uri: &str) -> Self {
        Self {
            git: Some(GitBuildSource::new(uri)),
            ..Default::default()
        }
    }

    /// Reports whether no input of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.git.is_none() && self.dockerfile.is_none() && self.binary.is_none() && self.images.is_empty()
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// SourceBuildStrategy builds by injecting source into a builder image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceBuildStrategy {
    pub from: ObjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<LocalObjectReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scripts: String,
    pub incremental: bool,
    pub force_pull: bool,
}

/// DockerBuildStrategy builds from a Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerBuildStrategy {
    /// Overrides the FROM image of the Dockerfile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<LocalObjectReference>,
    pub no_cache: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    pub force_pull: bool,
    /// Path of the Dockerfile relative to the context directory.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dockerfile_path: String,
}

/// CustomBuildStrategy delegates the whole build to a custom builder image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomBuildStrategy {
    pub from: ObjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secret: Option<LocalObjectReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    pub expose_docker_socket: bool,
    pub force_pull: bool,
}

/// BuildStrategy holds the strategy variants. Exactly one must be set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_strategy: Option<SourceBuildStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_strategy: Option<DockerBuildStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_strategy: Option<CustomBuildStrategy>,
}

/// A borrowed view of the single strategy set on a [`BuildStrategy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyRef<'a> {
    Source(&'a SourceBuildStrategy),
    Docker(&'a DockerBuildStrategy),
    Custom(&'a CustomBuildStrategy),
}

/// A mutable view of the single strategy set on a [`BuildStrategy`].
#[derive(Debug)]
pub enum StrategyMut<'a> {
    Source(&'a mut SourceBuildStrategy),
    Docker(&'a mut DockerBuildStrategy),
    Custom(&'a mut CustomBuildStrategy),
}

impl BuildStrategy {
    pub fn source(strategy: SourceBuildStrategy) -> Self {
        Self {
            source_strategy: Some(strategy),
            ..Default::default()
        }
    }

    pub fn docker(strategy: DockerBuildStrategy) -> Self {
        Self {
            docker_strategy: Some(strategy),
            ..Default::default()
        }
    }

    pub fn custom(strategy: CustomBuildStrategy) -> Self {
        Self {
            custom_strategy: Some(strategy),
            ..Default::default()
        }
    }

    /// Number of strategy variants that are set.
    pub fn count(&self) -> usize {
        usize::from(self.source_strategy.is_some())
            + usize::from(self.docker_strategy.is_some())
            + usize::from(self.custom_strategy.is_some())
    }

    /// Returns the strategy that is set, or `None` unless exactly one is.
    pub fn resolve(&self) -> Option<StrategyRef<'_>> {
        match (&self.source_strategy, &self.docker_strategy, &self.custom_strategy) {
            (Some(s), None, None) => Some(StrategyRef::Source(s)),
            (None, Some(d), None) => Some(StrategyRef::Docker(d)),
            (None, None, Some(c)) => Some(StrategyRef::Custom(c)),
            _ => None,
        }
    }

    pub fn resolve_mut(&mut self) -> Option<StrategyMut<'_>> {
        match (
            &mut self.source_strategy,
            &mut self.docker_strategy,
            &mut self.custom_strategy,
        ) {
            (Some(s), None, None) => Some(StrategyMut::Source(s)),
            (None, Some(d), None) => Some(StrategyMut::Docker(d)),
            (None, None, Some(c)) => Some(StrategyMut::Custom(c)),
            _ => None,
        }
    }

    /// The image the strategy builds from, if any.
    pub fn input_reference(&self) -> Option<&ObjectReference> {
        self.resolve().and_then(|s| s.from())
    }

    /// The environment list of the strategy that is set.
    pub fn env_mut(&mut self) -> Option<&mut Vec<EnvVar>> {
        self.resolve_mut().map(|s| match s {
            StrategyMut::Source(s) => &mut s.env,
            StrategyMut::Docker(d) => &mut d.env,
            StrategyMut::Custom(c) => &mut c.env,
        })
    }
}

impl<'a> StrategyRef<'a> {
    /// The serialized field name of this strategy.
    pub fn field_name(&self) -> &'static str {
        match self {
            StrategyRef::Source(_) => "sourceStrategy",
            StrategyRef::Docker(_) => "dockerStrategy",
            StrategyRef::Custom(_) => "customStrategy",
        }
    }

    pub fn from(&self) -> Option<&'a ObjectReference> {
        match *self {
            StrategyRef::Source(s) => Some(&s.from),
            StrategyRef::Docker(d) => d.from.as_ref(),
            StrategyRef::Custom(c) => Some(&c.from),
        }
    }

    pub fn env(&self) -> &'a [EnvVar] {
        match *self {
            StrategyRef::Source(s) => &s.env,
            StrategyRef::Docker(d) => &d.env,
            StrategyRef::Custom(c) => &c.env,
        }
    }
}

// ============================================================================
// Output and spec
// ============================================================================

/// BuildOutput describes where the built image is pushed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_secret: Option<LocalObjectReference>,
}

impl BuildOutput {
    pub fn to(reference: ObjectReference) -> Self {
        Self {
            to: Some(reference),
            push_secret: None,
        }
    }
}

/// BuildSpec is the part of a build shared by Build and BuildConfig.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSpec {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account: String,
    pub source: BuildSource,
    pub strategy: BuildStrategy,
    pub output: BuildOutput,
    /// Maximum duration of the build in seconds, measured from pod scheduling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_deadline_seconds: Option<i64>,
}

impl BuildSpec {
    /// Rewrite source and Dockerfile paths into their cleaned form.
    ///
    /// Values that would escape their base directory are left untouched so that
    /// validation reports them as given.
    pub fn normalize(&mut self) {
        if !self.source.context_dir.is_empty() {
            if let Some(cleaned) = clean_relative(&self.source.context_dir) {
                self.source.context_dir = cleaned;
            }
        }
        if let Some(docker) = self.strategy.docker_strategy.as_mut() {
            if !docker.dockerfile_path.is_empty() {
                if let Some(cleaned) = clean_relative(&docker.dockerfile_path) {
                    docker.dockerfile_path = cleaned;
                }
            }
        }
    }
}

fn clean_relative(path: &str) -> Option<String> {
    let cleaned = filepath::clean(path);
    if filepath::is_abs(&cleaned) || filepath::escapes_base(&cleaned) {
        return None;
    }
    if cleaned == "." {
        return Some(String::new());
    }
    Some(cleaned)
}

// ============================================================================
// Build
// ============================================================================

/// BuildPhase is the lifecycle phase of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildPhase {
    /// New builds have been created but not yet scheduled.
    #[default]
    New,
    Pending,
    Running,
    Complete,
    Failed,
    Error,
    Cancelled,
}

impl BuildPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhase::New => "New",
            BuildPhase::Pending => "Pending",
            BuildPhase::Running => "Running",
            BuildPhase::Complete => "Complete",
            BuildPhase::Failed => "Failed",
            BuildPhase::Error => "Error",
            BuildPhase::Cancelled => "Cancelled",
        }
    }

    /// Terminal phases are final: a build never leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildPhase::Complete | BuildPhase::Failed | BuildPhase::Error | BuildPhase::Cancelled
        )
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildStatus {
    pub phase: BuildPhase,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Build is a single execution of a build specification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    pub metadata: ObjectMeta,
    pub spec: BuildSpec,
    pub status: BuildStatus,
}

impl Build {
    pub fn new(metadata: ObjectMeta, spec: BuildSpec) -> Self {
        Self {
            metadata,
            spec,
            status: BuildStatus::default(),
        }
    }

    pub fn with_phase(mut self, phase: BuildPhase) -> Self {
        self.status.phase = phase;
        self
    }
}

impl ApiObject for Build {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "Build"
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// BuildTriggerType names a trigger variant.
///
/// `Unset` and `Unknown` exist so that malformed input survives decoding and is
/// reported by validation instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildTriggerType {
    #[default]
    Unset,
    GitHub,
    Generic,
    ImageChange,
    Unknown(String),
}

impl BuildTriggerType {
    pub fn as_str(&self) -> &str {
        match self {
            BuildTriggerType::Unset => "",
            BuildTriggerType::GitHub => "GitHub",
            BuildTriggerType::Generic => "Generic",
            BuildTriggerType::ImageChange => "ImageChange",
            BuildTriggerType::Unknown(s) => s,
        }
    }
}

impl From<String> for BuildTriggerType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" => BuildTriggerType::Unset,
            "GitHub" => BuildTriggerType::GitHub,
            "Generic" => BuildTriggerType::Generic,
            "ImageChange" => BuildTriggerType::ImageChange,
            _ => BuildTriggerType::Unknown(s),
        }
    }
}

impl From<BuildTriggerType> for String {
    fn from(t: BuildTriggerType) -> Self {
        t.as_str().to_string()
    }
}

/// WebHookTrigger is the companion of the GitHub and Generic triggers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebHookTrigger {
    pub secret: String,
}

/// ImageChangeTrigger starts a build when an image stream tag changes.
///
/// A trigger without `from` is the default trigger: it follows the image the
/// build strategy uses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageChangeTrigger {
    #[serde(rename = "lastTriggeredImageID", skip_serializing_if = "String::is_empty")]
    pub last_triggered_image_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildTriggerPolicy {
    #[serde(rename = "type")]
    pub trigger_type: BuildTriggerType,
    #[serde(rename = "github", skip_serializing_if = "Option::is_none")]
    pub github_webhook: Option<WebHookTrigger>,
    #[serde(rename = "generic", skip_serializing_if = "Option::is_none")]
    pub generic_webhook: Option<WebHookTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_change: Option<ImageChangeTrigger>,
}

impl BuildTriggerPolicy {
    pub fn github(secret: &str) -> Self {
        Self {
            trigger_type: BuildTriggerType::GitHub,
            github_webhook: Some(WebHookTrigger {
                secret: secret.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn generic(secret: &str) -> Self {
        Self {
            trigger_type: BuildTriggerType::Generic,
            generic_webhook: Some(WebHookTrigger {
                secret: secret.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn image_change(from: Option<ObjectReference>) -> Self {
        Self {
            trigger_type: BuildTriggerType::ImageChange,
            image_change: Some(ImageChangeTrigger {
                from,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

// ============================================================================
// BuildConfig and BuildRequest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfigSpec {
    #[serde(flatten)]
    pub build_spec: BuildSpec,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<BuildTriggerPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfigStatus {
    pub last_version: i64,
}

/// BuildConfig is a template from which builds are started.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub metadata: ObjectMeta,
    pub spec: BuildConfigSpec,
    pub status: BuildConfigStatus,
}

impl ApiObject for BuildConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "BuildConfig"
    }
}

/// BuildRequest asks for a new build to be started from a BuildConfig.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildRequest {
    pub metadata: ObjectMeta,
    /// Overrides the strategy image for this build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryBuildSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_version: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl ApiObject for BuildRequest {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        "BuildRequest"
    }
}
