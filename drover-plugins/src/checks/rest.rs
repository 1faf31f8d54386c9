//! HTTP gate.
//!
//! Transport failures, unexpected status codes, and missing body matches are
//! all reported as execution errors (and so are always fatal to the run);
//! the boolean outcome only goes true on full success. Inversion still
//! applies on top.

use std::collections::HashMap;

use serde::Deserialize;

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

use crate::http::{self, TlsParams};
use crate::params::parse_params;

const TYPE_TAG: &str = "rest";

pub(crate) fn default_method() -> String {
    "GET".to_string()
}

pub(crate) fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_expect_code() -> u16 {
    200
}

#[derive(Debug, Clone, Deserialize)]
struct RestCheckParams {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    matches: Vec<String>,
    /// 0 accepts any status.
    #[serde(default = "default_expect_code", rename = "expectCode")]
    expect_code: u16,
    #[serde(default)]
    timeout: u64,
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(default)]
    tls: TlsParams,
}

pub struct RestCheck {
    outcome: bool,
    policy: CheckPolicy,
    params: RestCheckParams,
}

impl RestCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<RestCheck, PluginError> {
        Ok(RestCheck {
            outcome: false,
            policy: spec.config.clone(),
            params: parse_params(TYPE_TAG, &spec.params)?,
        })
    }
}

impl Check for RestCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        self.outcome = false;

        let agent = http::build_agent(TYPE_TAG, self.params.timeout, &self.params.tls)?;
        let (status, body) = http::send(
            TYPE_TAG,
            &agent,
            &self.params.method,
            &self.params.url,
            &self.params.content_type,
            &self.params.headers,
            &self.params.username,
            &self.params.password,
            &self.params.body,
        )?;

        if self.params.expect_code != 0 && status != self.params.expect_code {
            return Err(PluginError::execution(
                TYPE_TAG,
                format!(
                    "unexpected status code: got {status}, want {}",
                    self.params.expect_code
                ),
            ));
        }
        for needle in &self.params.matches {
            if !body.contains(needle) {
                return Err(PluginError::execution(
                    TYPE_TAG,
                    format!("response body does not contain expected string: {needle}"),
                ));
            }
        }

        self.outcome = true;
        Ok(())
    }

    fn result(&self) -> bool {
        self.outcome
    }

    fn policy(&self) -> &CheckPolicy {
        &self.policy
    }
}
