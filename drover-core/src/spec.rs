//! Serde model for droverfile target bodies.
//!
//! A document's top level is a mapping of target id → [`TargetSpec`], plus
//! the reserved `_meta` key handled by the resolver. Plugin params stay an
//! opaque [`serde_yaml::Value`] here; each plugin deserializes its own.

use serde::Deserialize;
use serde_yaml::Value;

use crate::contract::{ActionPolicy, CheckPolicy};

/// Target-level failure-policy defaults.
///
/// Every flag distinguishes "unset" from an explicit `false`;
/// `cancel_on_action_failure` alone defaults to on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetConfig {
    pub cancel_on_check_failure: Option<bool>,
    pub exit_on_check_failure: Option<bool>,
    pub cancel_on_action_failure: Option<bool>,
    pub exit_on_action_failure: Option<bool>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            cancel_on_check_failure: None,
            exit_on_check_failure: None,
            cancel_on_action_failure: Some(true),
            exit_on_action_failure: None,
        }
    }
}

/// One check descriptor: selector, policy, opaque params.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSpec {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub config: CheckPolicy,
    #[serde(default)]
    pub params: Value,
}

/// One action descriptor: selector, policy, opaque params.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionSpec {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub config: ActionPolicy,
    #[serde(default)]
    pub params: Value,
}

/// A target body as it appears under a top-level document key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetSpec {
    #[serde(default)]
    pub config: TargetConfig,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}
