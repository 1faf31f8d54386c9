//! Shared HTTP plumbing for the rest and template plugins.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use drover_core::PluginError;

/// Methods the rest plugins accept; anything else is an execution error.
const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// TLS knobs shared by rest check/action and the template fetcher.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TlsParams {
    pub insecure_skip_verify: bool,
    pub ca_file: Option<PathBuf>,
}

/// Build a ureq agent with the given timeout (0 = library default) and TLS
/// configuration.
pub(crate) fn build_agent(
    type_tag: &str,
    timeout_secs: u64,
    tls: &TlsParams,
) -> Result<ureq::Agent, PluginError> {
    let mut builder = ureq::AgentBuilder::new();
    if timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_secs));
    }

    if tls.insecure_skip_verify || tls.ca_file.is_some() {
        let mut connector = native_tls::TlsConnector::builder();
        if tls.insecure_skip_verify {
            connector.danger_accept_invalid_certs(true);
        }
        if let Some(ca_file) = &tls.ca_file {
            let pem = fs::read(ca_file).map_err(|source| {
                PluginError::execution(
                    type_tag,
                    format!("failed to read CA file {}: {source}", ca_file.display()),
                )
            })?;
            let certificate = native_tls::Certificate::from_pem(&pem)
                .map_err(|source| PluginError::execution(type_tag, source))?;
            connector.add_root_certificate(certificate);
        }
        let connector = connector
            .build()
            .map_err(|source| PluginError::execution(type_tag, source))?;
        builder = builder.tls_connector(Arc::new(connector));
    }

    Ok(builder.build())
}

/// Fire one request and hand back `(status, body)`. Non-2xx statuses are
/// returned, not treated as transport failures — the caller decides what a
/// given status means.
#[allow(clippy::too_many_arguments)]
pub(crate) fn send(
    type_tag: &str,
    agent: &ureq::Agent,
    method: &str,
    url: &str,
    content_type: &str,
    headers: &HashMap<String, String>,
    username: &str,
    password: &str,
    body: &str,
) -> Result<(u16, String), PluginError> {
    let method = method.to_uppercase();
    if !METHODS.contains(&method.as_str()) {
        return Err(PluginError::execution(
            type_tag,
            format!("unsupported HTTP method: {method}"),
        ));
    }

    let mut request = agent.request(&method, url);
    if !content_type.is_empty() {
        request = request.set("Content-Type", content_type);
    }
    for (header, value) in headers {
        request = request.set(header, value);
    }
    if !username.is_empty() && !password.is_empty() {
        let credentials = BASE64.encode(format!("{username}:{password}"));
        request = request.set("Authorization", &format!("Basic {credentials}"));
    }

    let result = if body.is_empty() {
        request.call()
    } else {
        request.send_string(body)
    };

    match result {
        Ok(response) => {
            let status = response.status();
            let text = response
                .into_string()
                .map_err(|source| PluginError::execution(type_tag, source))?;
            Ok((status, text))
        }
        Err(ureq::Error::Status(status, response)) => {
            let text = response.into_string().unwrap_or_default();
            Ok((status, text))
        }
        Err(source) => Err(PluginError::execution(
            type_tag,
            format!("HTTP request failed: {source}"),
        )),
    }
}
