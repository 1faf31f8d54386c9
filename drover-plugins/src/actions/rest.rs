//! Fire-and-log HTTP action. Only transport-level failure is an error; the
//! response status is logged and otherwise ignored.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::checks::rest::{default_content_type, default_method};
use crate::http::{self, TlsParams};
use crate::params::parse_params;

const TYPE_TAG: &str = "rest";

fn default_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize)]
struct RestActionParams {
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
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(default)]
    tls: TlsParams,
}

#[derive(Debug)]
pub struct RestAction {
    policy: ActionPolicy,
    params: RestActionParams,
}

impl RestAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<RestAction, PluginError> {
        Ok(RestAction {
            policy: spec.config.clone(),
            params: parse_params(TYPE_TAG, &spec.params)?,
        })
    }
}

impl Action for RestAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }

        let agent = http::build_agent(TYPE_TAG, self.params.timeout, &self.params.tls)?;
        let (status, _body) = http::send(
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
        debug!(url = %self.params.url, status, "rest call returned");
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(params: &str) -> RestAction {
        let spec: ActionSpec =
            serde_yaml::from_str(&format!("type: rest\nparams:\n{params}")).expect("spec");
        RestAction::from_spec(&spec).expect("build")
    }

    #[test]
    fn posts_body_with_content_type() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(r#"{"event":"done"}"#)
            .with_status(202)
            .create();

        let mut fire = action(&format!(
            "  url: {}/hook\n  method: POST\n  body: '{{\"event\":\"done\"}}'\n",
            server.url()
        ));
        fire.execute(&CancellationToken::new()).expect("execute");
        mock.assert();
    }

    #[test]
    fn error_status_is_not_a_failure() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/hook").with_status(500).create();

        let mut fire = action(&format!("  url: {}/hook\n", server.url()));
        fire.execute(&CancellationToken::new()).expect("execute");
    }

    #[test]
    fn url_param_is_required() {
        let spec: ActionSpec = serde_yaml::from_str("type: rest").expect("spec");
        let err = RestAction::from_spec(&spec).unwrap_err();
        assert!(matches!(err, PluginError::InvalidParams { .. }));
    }
}
