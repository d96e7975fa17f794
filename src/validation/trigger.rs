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

//! Validation of build triggers.

use super::field::{ErrorList, FieldError, Path};
use super::reference::validate_image_reference;
use crate::api::build::{BuildConfig, BuildTriggerPolicy, BuildTriggerType, WebHookTrigger};
use crate::api::core::ObjectReference;
use crate::api::image::IMAGE_STREAM_TAG_KIND;
use std::collections::HashSet;

const DEFAULT_TRIGGER_DETAIL: &str =
    "a default ImageChange trigger can only be used when the strategy includes an ImageStreamTag reference";

/// Validate a single trigger on its own.
///
/// A default ImageChange trigger (one without `from`) is accepted here; whether the
/// strategy supplies a usable reference is checked by
/// [`validate_image_change_triggers`].
pub fn validate_trigger(trigger: &BuildTriggerPolicy, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();

    match &trigger.trigger_type {
        BuildTriggerType::Unset => {
            errs.push(FieldError::required(&path.child("type"), ""));
        }
        BuildTriggerType::GitHub => {
            errs.extend(validate_webhook(
                trigger.github_webhook.as_ref(),
                &path.child("github"),
            ));
        }
        BuildTriggerType::Generic => {
            errs.extend(validate_webhook(
                trigger.generic_webhook.as_ref(),
                &path.child("generic"),
            ));
        }
        BuildTriggerType::ImageChange => {
            let Some(image_change) = &trigger.image_change else {
                errs.push(FieldError::required(&path.child("imageChange"), ""));
                return errs;
            };
            if let Some(from) = &image_change.from {
                let from_path = path.child("imageChange").child("from");
                if from.kind != IMAGE_STREAM_TAG_KIND {
                    errs.push(FieldError::invalid(
                        &from_path.child("kind"),
                        from.kind.as_str(),
                        "only an ImageStreamTag type of reference is allowed in an ImageChange trigger",
                    ));
                } else {
                    errs.extend(validate_image_reference(from, &from_path));
                }
            }
        }
        BuildTriggerType::Unknown(t) => {
            errs.push(FieldError::invalid(
                &path.child("type"),
                t.as_str(),
                "invalid trigger type",
            ));
        }
    }

    errs
}

fn validate_webhook(webhook: Option<&WebHookTrigger>, path: &Path) -> ErrorList {
    match webhook {
        None => vec![FieldError::required(path, "")],
        Some(webhook) if webhook.secret.is_empty() => {
            vec![FieldError::required(&path.child("secret"), "")]
        }
        Some(_) => ErrorList::new(),
    }
}

/// Validate every trigger of a build config, plus the rules that span triggers.
///
/// Only one default ImageChange trigger is allowed, and it requires the strategy to
/// build from an ImageStreamTag. No two ImageChange triggers may resolve to the
/// same stream tag; references without a namespace resolve in the config's.
pub fn validate_image_change_triggers(config: &BuildConfig, path: &Path) -> ErrorList {
    let mut errs = ErrorList::new();
    let strategy_from = config.spec.build_spec.strategy.input_reference();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut has_default = false;

    for (i, trigger) in config.spec.triggers.iter().enumerate() {
        let trigger_path = path.index(i);
        errs.extend(validate_trigger(trigger, &trigger_path));

        if trigger.trigger_type != BuildTriggerType::ImageChange {
            continue;
        }
        let Some(image_change) = &trigger.image_change else {
            continue;
        };

        let from: &ObjectReference = match &image_change.from {
            Some(from) => {
                if from.kind != IMAGE_STREAM_TAG_KIND {
                    continue;
                }
                from
            }
            None => {
                let image_change_path = trigger_path.child("imageChange");
                if has_default {
                    errs.push(FieldError::invalid(
                        &image_change_path,
                        "",
                        "only one ImageChange trigger may omit from",
                    ));
                    continue;
                }
                has_default = true;
                match strategy_from {
                    None => {
                        errs.push(FieldError::required(
                            &image_change_path.child("from"),
                            DEFAULT_TRIGGER_DETAIL,
                        ));
                        continue;
                    }
                    Some(from) if from.kind != IMAGE_STREAM_TAG_KIND => {
                        errs.push(FieldError::invalid(
                            &image_change_path,
                            "",
                            DEFAULT_TRIGGER_DETAIL,
                        ));
                        continue;
                    }
                    Some(from) => from,
                }
            }
        };

        let namespace = if from.namespace.is_empty() {
            config.metadata.namespace.clone()
        } else {
            from.namespace.clone()
        };
        if !seen.insert((namespace, from.name.clone())) {
            errs.push(FieldError::invalid(
                &trigger_path.child("imageChange").child("from"),
                from.name.as_str(),
                "multiple ImageChange triggers refer to the same image stream tag",
            ));
        }
    }

    errs
}
