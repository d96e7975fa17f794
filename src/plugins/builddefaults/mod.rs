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

//! BuildDefaults admission controller.
//!
//! Injects cluster-wide git proxy settings and environment variables into the
//! build carried by a build pod. Values set explicitly on the build are kept.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface,
    Operation, Plugins,
};
use crate::api::build::Build;
use crate::api::core::{resource, EnvVar};
use crate::plugins::buildutil;
use crate::validation::{names, validate_strategy_env, ErrorList, FieldError, Path};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

/// Plugin name for the BuildDefaults admission controller.
pub const PLUGIN_NAME: &str = "BuildDefaults";

/// Register the BuildDefaults plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, |config: Option<&mut dyn Read>| {
        let config = match config {
            Some(reader) => Some(read_config(reader)?),
            None => None,
        };
        Ok(Arc::new(Plugin::new(config)) as Arc<dyn Interface>)
    });
}

/// BuildDefaultsConfig holds the defaults applied to every build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildDefaultsConfig {
    #[serde(rename = "gitHTTPProxy", skip_serializing_if = "String::is_empty")]
    pub git_http_proxy: String,
    #[serde(rename = "gitHTTPSProxy", skip_serializing_if = "String::is_empty")]
    pub git_https_proxy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// Decode and validate a BuildDefaultsConfig.
pub fn read_config(reader: &mut dyn Read) -> AdmissionResult<BuildDefaultsConfig> {
    let config: BuildDefaultsConfig = serde_json::from_reader(reader).map_err(|e| {
        AdmissionError::bad_request(format!("unable to decode {} config: {}", PLUGIN_NAME, e))
    })?;
    let errs = validate_build_defaults_config(&config);
    if !errs.is_empty() {
        let msgs: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
        return Err(AdmissionError::bad_request(format!(
            "invalid {} config: {}",
            PLUGIN_NAME,
            msgs.join(", ")
        )));
    }
    Ok(config)
}

/// Validate the proxy addresses and the environment of a BuildDefaultsConfig.
pub fn validate_build_defaults_config(config: &BuildDefaultsConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    for (proxy, field) in [
        (&config.git_http_proxy, "gitHTTPProxy"),
        (&config.git_https_proxy, "gitHTTPSProxy"),
    ] {
        if !proxy.is_empty() && !names::is_valid_url(proxy) {
            errs.push(FieldError::invalid(
                &Path::new(field),
                proxy.as_str(),
                "proxy is not a valid url",
            ));
        }
    }
    errs.extend(validate_strategy_env(&config.env, &Path::new("env")));
    errs
}

/// Plugin is an implementation of the BuildDefaults admission controller.
pub struct Plugin {
    handler: Handler,
    config: Option<BuildDefaultsConfig>,
}

impl Plugin {
    /// Create a new BuildDefaults admission controller. Without a config it
    /// admits everything unchanged.
    pub fn new(config: Option<BuildDefaultsConfig>) -> Self {
        debug!(
            plugin = PLUGIN_NAME,
            configured = config.is_some(),
            "created admission plugin"
        );
        Self {
            handler: Handler::new(&[Operation::Create]).with_resources(&[resource("pods")]),
            config,
        }
    }

    fn apply_defaults(config: &BuildDefaultsConfig, build: &mut Build) {
        let build_name = build.metadata.name.clone();

        if let Some(env) = buildutil::build_env_mut(build) {
            for var in &config.env {
                if env.iter().any(|e| e.name == var.name) {
                    continue;
                }
                debug!(build = %build_name, env = %var.name, "adding default environment variable");
                env.push(var.clone());
            }
        }

        let Some(git) = build.spec.source.git.as_mut() else {
            return;
        };
        if !config.git_http_proxy.is_empty() && git.http_proxy.is_none() {
            debug!(build = %build_name, proxy = %config.git_http_proxy, "setting default git http proxy");
            git.http_proxy = Some(config.git_http_proxy.clone());
        }
        if !config.git_https_proxy.is_empty() && git.https_proxy.is_none() {
            debug!(build = %build_name, proxy = %config.git_https_proxy, "setting default git https proxy");
            git.https_proxy = Some(config.git_https_proxy.clone());
        }
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn as_mutation(&self) -> Option<&dyn MutationInterface> {
        Some(self)
    }
}

impl MutationInterface for Plugin {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        let Some(config) = self.config.as_ref() else {
            return Ok(());
        };
        if !self.handler.handles_resource(attributes) || !buildutil::is_build_pod(attributes) {
            return Ok(());
        }

        let (mut build, version) = buildutil::get_build(attributes)?;
        info!(
            namespace = %build.metadata.namespace,
            build = %build.metadata.name,
            "applying build defaults"
        );
        Self::apply_defaults(config, &mut build);
        buildutil::set_build(attributes, &build, &version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AttributesRecord;
    use crate::api::build::{
        BuildSource, BuildSpec, BuildStrategy, CustomBuildStrategy, DockerBuildStrategy,
        SourceBuildStrategy,
    };
    use crate::api::core::{ObjectMeta, ObjectReference, Pod};
    use crate::plugins::buildutil::build_pod;

    fn build_with(strategy: BuildStrategy) -> Build {
        Build::new(
            ObjectMeta::new("app-1", "ns"),
            BuildSpec {
                source: BuildSource::git("https://github.com/openshift/ruby-hello-world"),
                strategy,
                ..Default::default()
            },
        )
    }

    fn docker_build() -> Build {
        build_with(BuildStrategy::docker(DockerBuildStrategy::default()))
    }

    fn source_build() -> Build {
        build_with(BuildStrategy::source(SourceBuildStrategy {
            from: ObjectReference::new("DockerImage", "openshift/ruby-20-centos7"),
            ..Default::default()
        }))
    }

    fn proxy_config() -> BuildDefaultsConfig {
        BuildDefaultsConfig {
            git_http_proxy: "http".to_string(),
            git_https_proxy: "https".to_string(),
            ..Default::default()
        }
    }

    fn env_config() -> BuildDefaultsConfig {
        BuildDefaultsConfig {
            env: vec![EnvVar::new("VAR1", "VALUE1"), EnvVar::new("VAR2", "VALUE2")],
            ..Default::default()
        }
    }

    fn admit(config: BuildDefaultsConfig, pod: Pod) -> AttributesRecord {
        let plugin = Plugin::new(Some(config));
        let mut attrs = AttributesRecord::new_pod(pod);
        plugin.admit(&mut attrs).unwrap();
        attrs
    }

    fn admitted_build(attrs: &AttributesRecord) -> Build {
        buildutil::get_build(attrs).unwrap().0
    }

    #[test]
    fn test_handles() {
        let plugin = Plugin::default();
        assert!(plugin.handles(Operation::Create));
        assert!(!plugin.handles(Operation::Update));
        assert!(!plugin.handles(Operation::Delete));
    }

    #[test]
    fn test_proxy_defaults() {
        let attrs = admit(proxy_config(), build_pod(&docker_build(), "v1"));
        let git = admitted_build(&attrs).spec.source.git.unwrap();
        assert_eq!(git.http_proxy.as_deref(), Some("http"));
        assert_eq!(git.https_proxy.as_deref(), Some("https"));
    }

    #[test]
    fn test_explicit_proxy_wins() {
        let mut build = docker_build();
        let git = build.spec.source.git.as_mut().unwrap();
        git.http_proxy = Some("http://explicit:8080".to_string());
        git.https_proxy = Some(String::new());

        let attrs = admit(proxy_config(), build_pod(&build, "v1"));
        let git = admitted_build(&attrs).spec.source.git.unwrap();
        assert_eq!(git.http_proxy.as_deref(), Some("http://explicit:8080"));
        assert_eq!(git.https_proxy.as_deref(), Some(""));
    }

    #[test]
    fn test_proxy_defaults_without_git_source() {
        let mut build = docker_build();
        build.spec.source = BuildSource {
            dockerfile: Some("FROM scratch".to_string()),
            ..Default::default()
        };
        let attrs = admit(proxy_config(), build_pod(&build, "v1"));
        assert!(admitted_build(&attrs).spec.source.git.is_none());
    }

    #[test]
    fn test_env_defaults() {
        let attrs = admit(env_config(), build_pod(&source_build(), "v1"));
        let build = admitted_build(&attrs);
        let env = build.spec.strategy.resolve().unwrap().env();
        assert_eq!(env, &[EnvVar::new("VAR1", "VALUE1"), EnvVar::new("VAR2", "VALUE2")]);
    }

    #[test]
    fn test_env_defaults_keep_existing_values() {
        let mut build = build_with(BuildStrategy::custom(CustomBuildStrategy {
            from: ObjectReference::new("DockerImage", "builder"),
            env: vec![EnvVar::new("VAR1", "mine")],
            ..Default::default()
        }));
        build.metadata.name = "custom-1".to_string();

        let attrs = admit(env_config(), build_pod(&build, "v1"));
        let build = admitted_build(&attrs);
        let env = build.spec.strategy.resolve().unwrap().env();
        assert_eq!(env, &[EnvVar::new("VAR1", "mine"), EnvVar::new("VAR2", "VALUE2")]);
    }

    #[test]
    fn test_admit_is_idempotent() {
        let config = BuildDefaultsConfig {
            env: env_config().env,
            ..proxy_config()
        };
        let plugin = Plugin::new(Some(config));
        let mut attrs = AttributesRecord::new_pod(build_pod(&source_build(), "v1"));
        plugin.admit(&mut attrs).unwrap();
        let once = admitted_build(&attrs);
        plugin.admit(&mut attrs).unwrap();
        assert_eq!(admitted_build(&attrs), once);
    }

    #[test]
    fn test_keeps_fields_it_does_not_default() {
        let mut pod = build_pod(&docker_build(), "v1");
        let env = &mut pod.spec.containers[0].env[0];
        let mut raw: serde_json::Value = serde_json::from_str(&env.value).unwrap();
        raw["metadata"]["uid"] = "1234".into();
        raw["spec"]["revision"] = serde_json::json!({"git": {"commit": "abc123"}});
        raw["status"]["startTimestamp"] = "2015-01-01T00:00:00Z".into();
        env.value = raw.to_string();

        let attrs = admit(proxy_config(), pod);
        let raw = &attrs.get_pod().unwrap().spec.containers[0].env[0].value;
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value["metadata"]["uid"], "1234");
        assert_eq!(value["spec"]["revision"]["git"]["commit"], "abc123");
        assert_eq!(value["status"]["startTimestamp"], "2015-01-01T00:00:00Z");
        assert_eq!(value["spec"]["source"]["git"]["httpProxy"], "http");
    }

    #[test]
    fn test_keeps_encoding_version() {
        let attrs = admit(proxy_config(), build_pod(&docker_build(), "v1beta3"));
        assert_eq!(buildutil::get_build(&attrs).unwrap().1, "v1beta3");
    }

    #[test]
    fn test_ignores_non_build_pods() {
        let pod = Pod::new("web", "ns");
        let attrs = admit(proxy_config(), pod.clone());
        assert_eq!(attrs.get_pod(), Some(&pod));
    }

    #[test]
    fn test_without_config_is_noop() {
        let mut pod = build_pod(&docker_build(), "v1");
        pod.spec.containers[0].env[0].value = "{not json".to_string();
        let plugin = Plugin::default();
        let mut attrs = AttributesRecord::new_pod(pod);
        assert!(plugin.admit(&mut attrs).is_ok());
    }

    #[test]
    fn test_bad_build_json() {
        let mut pod = build_pod(&docker_build(), "v1");
        pod.spec.containers[0].env[0].value = "{not json".to_string();
        let plugin = Plugin::new(Some(proxy_config()));
        let mut attrs = AttributesRecord::new_pod(pod);
        let err = plugin.admit(&mut attrs).unwrap_err();
        assert!(matches!(err, AdmissionError::BadRequest(_)));
    }

    #[test]
    fn test_read_config() {
        let json = r#"{
            "apiVersion": "v1",
            "kind": "BuildDefaultsConfig",
            "gitHTTPProxy": "http://proxy:3128",
            "env": [{"name": "VAR1", "value": "VALUE1"}]
        }"#;
        let config = read_config(&mut json.as_bytes()).unwrap();
        assert_eq!(config.git_http_proxy, "http://proxy:3128");
        assert!(config.git_https_proxy.is_empty());
        assert_eq!(config.env, vec![EnvVar::new("VAR1", "VALUE1")]);
    }

    #[test]
    fn test_read_config_rejects_invalid() {
        let err = read_config(&mut r#"{"gitHTTPSProxy": "%zz"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, AdmissionError::BadRequest(_)));
        assert!(err.to_string().contains("gitHTTPSProxy"));

        let err = read_config(&mut r#"{"env": [{"name": "1BAD"}]}"#.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("env[0].name"));

        let err = read_config(&mut "not json".as_bytes()).unwrap_err();
        assert!(matches!(err, AdmissionError::BadRequest(_)));
    }

    #[test]
    fn test_register() {
        let plugins = Plugins::new();
        register(&plugins);
        assert!(plugins.is_registered(PLUGIN_NAME));

        let mut config = r#"{"gitHTTPProxy": "http"}"#.as_bytes();
        let plugin = plugins
            .new_from_plugins(PLUGIN_NAME, Some(&mut config as &mut dyn Read))
            .unwrap();
        assert!(plugin.handles(Operation::Create));
        assert!(plugin.as_mutation().is_some());
        assert!(plugin.as_validation().is_none());

        let mut config = "[".as_bytes();
        let result = plugins.new_from_plugins(PLUGIN_NAME, Some(&mut config as &mut dyn Read));
        assert!(matches!(result, Err(AdmissionError::BadRequest(_))));
    }
}
