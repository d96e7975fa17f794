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

// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]

//! Property-based tests for build validation and build defaulting.

use proptest::prelude::*;

use build_admission::admission::{AttributesRecord, MutationInterface};
use build_admission::api::build::{
    Build, BuildConfig, BuildConfigSpec, BuildOutput, BuildPhase, BuildSource, BuildSpec,
    BuildStrategy, BuildTriggerPolicy, CustomBuildStrategy, DockerBuildStrategy, GitBuildSource,
    SourceBuildStrategy,
};
use build_admission::api::core::{Container, EnvVar, ObjectMeta, ObjectReference, Pod};
use build_admission::plugins::builddefaults::{BuildDefaultsConfig, Plugin as BuildDefaults};
use build_admission::plugins::buildutil::{self, BUILD_ANNOTATION, BUILD_ENV_VAR};
use build_admission::validation::{self, ErrorType, Path};

const PROXY_DETAIL: &str =
    "only http:// and https:// GIT protocols are allowed with HTTP or HTTPS proxy set";

fn any_phase() -> impl Strategy<Value = BuildPhase> {
    prop_oneof![
        Just(BuildPhase::New),
        Just(BuildPhase::Pending),
        Just(BuildPhase::Running),
        Just(BuildPhase::Complete),
        Just(BuildPhase::Failed),
        Just(BuildPhase::Error),
        Just(BuildPhase::Cancelled),
    ]
}

fn terminal_phase() -> impl Strategy<Value = BuildPhase> {
    prop_oneof![
        Just(BuildPhase::Complete),
        Just(BuildPhase::Failed),
        Just(BuildPhase::Error),
        Just(BuildPhase::Cancelled),
    ]
}

fn any_strategy() -> impl Strategy<Value = BuildStrategy> {
    prop_oneof![
        Just(BuildStrategy::docker(DockerBuildStrategy::default())),
        Just(BuildStrategy::source(SourceBuildStrategy {
            from: ObjectReference::new("DockerImage", "builder"),
            ..Default::default()
        })),
        Just(BuildStrategy::custom(CustomBuildStrategy {
            from: ObjectReference::new("DockerImage", "builder"),
            ..Default::default()
        })),
        Just(BuildStrategy::default()),
    ]
}

/// Strategies where the number of set variants is anything but one.
fn ambiguous_strategy() -> impl Strategy<Value = BuildStrategy> {
    (any::<bool>(), any::<bool>(), any::<bool>())
        .prop_filter("exactly one strategy", |(s, d, c)| {
            [*s, *d, *c].iter().filter(|set| **set).count() != 1
        })
        .prop_map(|(s, d, c)| BuildStrategy {
            source_strategy: s.then(|| SourceBuildStrategy {
                from: ObjectReference::new("DockerImage", "builder"),
                ..Default::default()
            }),
            docker_strategy: d.then(DockerBuildStrategy::default),
            custom_strategy: c.then(|| CustomBuildStrategy {
                from: ObjectReference::new("DockerImage", "builder"),
                ..Default::default()
            }),
        })
}

fn env_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,8}"
}

fn env_vars() -> impl Strategy<Value = Vec<EnvVar>> {
    prop::collection::btree_map(env_name(), "[a-z0-9]{0,8}", 0..5).prop_map(|vars| {
        vars.iter()
            .map(|(name, value)| EnvVar::new(name, value))
            .collect()
    })
}

fn valid_spec() -> BuildSpec {
    BuildSpec {
        source: BuildSource::git("https://github.com/openshift/ruby-hello-world"),
        strategy: BuildStrategy::docker(DockerBuildStrategy::default()),
        ..Default::default()
    }
}

fn build_pod(build: &Build) -> Pod {
    let mut encoded = serde_json::to_value(build).unwrap();
    encoded["kind"] = "Build".into();
    encoded["apiVersion"] = "v1".into();

    let mut container = Container::new("build", "builder");
    container
        .env
        .push(EnvVar::new(BUILD_ENV_VAR, &encoded.to_string()));

    let mut pod = Pod::new("app-1-build", "ns");
    pod.annotations
        .insert(BUILD_ANNOTATION.to_string(), build.metadata.name.clone());
    pod.spec.containers.push(container);
    pod
}

proptest! {
    /// Property: a source with no input yields exactly one Invalid error on the
    /// source itself, whatever the rest of the spec looks like.
    #[test]
    fn empty_source_is_one_invalid_error(strategy in any_strategy(), deadline in prop::option::of(-5i64..5)) {
        let spec = BuildSpec {
            strategy,
            completion_deadline_seconds: deadline,
            ..Default::default()
        };
        let errs = validation::validate_build_spec(&spec, &Path::new("spec"));
        let on_source: Vec<_> = errs.iter().filter(|e| e.field == "spec.source").collect();
        prop_assert_eq!(on_source.len(), 1);
        prop_assert_eq!(on_source[0].error_type, ErrorType::Invalid);
    }

    /// Property: a strategy without exactly one variant is Invalid at its path.
    #[test]
    fn ambiguous_strategy_is_invalid(strategy in ambiguous_strategy()) {
        let spec = BuildSpec { strategy, ..valid_spec() };
        let errs = validation::validate_build_spec(&spec, &Path::new("spec"));
        prop_assert!(errs
            .iter()
            .any(|e| e.field == "spec.strategy" && e.error_type == ErrorType::Invalid));
    }

    /// Property: a git:// uri with any proxy set yields exactly one error.
    #[test]
    fn git_protocol_with_proxy_is_rejected(
        host in "[a-z]{1,10}\\.com",
        repo in "[a-z]{1,10}",
        proxy in "http://[a-z]{1,8}:[0-9]{2,4}",
        https in any::<bool>(),
    ) {
        let mut git = GitBuildSource::new(&format!("git://{}/{}", host, repo));
        if https {
            git.https_proxy = Some(proxy);
        } else {
            git.http_proxy = Some(proxy);
        }
        let spec = BuildSpec {
            source: BuildSource { git: Some(git), ..Default::default() },
            ..valid_spec()
        };
        let errs = validation::validate_build_spec(&spec, &Path::new("spec"));
        prop_assert_eq!(errs.len(), 1);
        prop_assert_eq!(errs[0].error_type, ErrorType::Invalid);
        prop_assert_eq!(errs[0].field.as_str(), "spec.source.git.uri");
        prop_assert_eq!(errs[0].detail.as_str(), PROXY_DETAIL);
    }

    /// Property: more than one default ImageChange trigger is always rejected.
    #[test]
    fn multiple_default_image_change_triggers_are_invalid(count in 2usize..6) {
        let config = BuildConfig {
            metadata: ObjectMeta::new("app", "ns"),
            spec: BuildConfigSpec {
                build_spec: BuildSpec {
                    strategy: BuildStrategy::source(SourceBuildStrategy {
                        from: ObjectReference::new("ImageStreamTag", "ruby:latest"),
                        ..Default::default()
                    }),
                    ..valid_spec()
                },
                triggers: (0..count).map(|_| BuildTriggerPolicy::image_change(None)).collect(),
            },
            ..Default::default()
        };
        let errs = validation::validate_build_config(&config);
        prop_assert!(errs.iter().any(|e| e.error_type == ErrorType::Invalid
            && e.field.starts_with("spec.triggers")));
    }

    /// Property: a terminal build never changes phase, but may be rewritten as is.
    #[test]
    fn terminal_phase_is_final(old_phase in terminal_phase(), new_phase in any_phase()) {
        let old = Build::new(ObjectMeta::new("app-1", "ns"), valid_spec()).with_phase(old_phase);
        let updated = old.clone().with_phase(new_phase);
        let errs = validation::validate_build_update(&updated, &old);
        if new_phase == old_phase {
            prop_assert!(errs.is_empty());
        } else {
            prop_assert_eq!(errs.len(), 1);
            prop_assert_eq!(errs[0].field.as_str(), "status.phase");
            prop_assert_eq!(errs[0].error_type, ErrorType::Invalid);
        }
    }

    /// Property: defaults fill what the build leaves unset, explicit values win,
    /// and applying the defaults twice equals applying them once.
    #[test]
    fn build_defaults_are_applied_once(
        defaults in env_vars(),
        explicit in env_vars(),
        explicit_proxy in prop::option::of("http://[a-z]{1,8}:[0-9]{2,4}"),
    ) {
        let mut build = Build::new(
            ObjectMeta::new("app-1", "ns"),
            BuildSpec {
                strategy: BuildStrategy::source(SourceBuildStrategy {
                    from: ObjectReference::new("DockerImage", "builder"),
                    env: explicit.clone(),
                    ..Default::default()
                }),
                output: BuildOutput::default(),
                ..valid_spec()
            },
        );
        build.spec.source.git.as_mut().unwrap().http_proxy = explicit_proxy.clone();

        let plugin = BuildDefaults::new(Some(BuildDefaultsConfig {
            git_http_proxy: "http://default:3128".to_string(),
            git_https_proxy: String::new(),
            env: defaults.clone(),
        }));
        let mut attrs = AttributesRecord::new_pod(build_pod(&build));
        plugin.admit(&mut attrs).unwrap();
        let (once, _) = buildutil::get_build(&attrs).unwrap();

        let git = once.spec.source.git.as_ref().unwrap();
        let expected_proxy = explicit_proxy.unwrap_or_else(|| "http://default:3128".to_string());
        prop_assert_eq!(git.http_proxy.as_deref(), Some(expected_proxy.as_str()));
        prop_assert_eq!(git.https_proxy.as_deref(), None);

        let env = once.spec.strategy.resolve().unwrap().env();
        for var in &explicit {
            prop_assert_eq!(env.iter().find(|e| e.name == var.name), Some(var));
        }
        for var in &defaults {
            let found = env.iter().find(|e| e.name == var.name).unwrap();
            if !explicit.iter().any(|e| e.name == var.name) {
                prop_assert_eq!(found, var);
            }
        }

        plugin.admit(&mut attrs).unwrap();
        let (twice, _) = buildutil::get_build(&attrs).unwrap();
        prop_assert_eq!(twice, once);
    }
}
