//! Renders a tera template with data from a JSON/YAML source and writes the
//! result to a file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tera::Tera;
use tracing::debug;

use drover_core::{Action, ActionPolicy, ActionSpec, CancellationToken, PluginError};

use crate::http::{self, TlsParams};
use crate::params::parse_params;

const TYPE_TAG: &str = "template";

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateParams {
    /// Path or http(s) URL of the template.
    template_source: String,
    /// Path, URL, or (with `is_data_source_inline`) raw data string.
    #[serde(default)]
    data_source: String,
    #[serde(default)]
    is_data_source_inline: bool,
    #[serde(default = "default_format")]
    data_source_format: String,
    output_path: PathBuf,
    /// Headers for fetching remote template/data sources.
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    insecure_skip_verify: bool,
}

#[derive(Debug)]
pub struct TemplateAction {
    policy: ActionPolicy,
    params: TemplateParams,
}

impl TemplateAction {
    pub fn from_spec(spec: &ActionSpec) -> Result<TemplateAction, PluginError> {
        let params: TemplateParams = parse_params(TYPE_TAG, &spec.params)?;
        match params.data_source_format.to_lowercase().as_str() {
            "json" | "yaml" => {}
            other => {
                return Err(PluginError::config(
                    TYPE_TAG,
                    format!("unsupported data source format: {other}"),
                ));
            }
        }
        Ok(TemplateAction {
            policy: spec.config.clone(),
            params,
        })
    }

    fn fetch_content(&self, source: &str) -> Result<String, PluginError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            debug!(url = source, "fetching remote content");
            let tls = TlsParams {
                insecure_skip_verify: self.params.insecure_skip_verify,
                ca_file: None,
            };
            let agent = http::build_agent(TYPE_TAG, 0, &tls)?;
            let (status, body) = http::send(
                TYPE_TAG,
                &agent,
                "GET",
                source,
                "",
                &self.params.headers,
                "",
                "",
                "",
            )?;
            if status >= 400 {
                return Err(PluginError::execution(
                    TYPE_TAG,
                    format!("failed to fetch {source}: status {status}"),
                ));
            }
            return Ok(body);
        }

        debug!(path = source, "reading local content");
        fs::read_to_string(source).map_err(|source_err| {
            PluginError::execution(TYPE_TAG, format!("failed to read {source}: {source_err}"))
        })
    }

    fn build_context(&self) -> Result<tera::Context, PluginError> {
        if self.params.data_source.trim().is_empty() {
            return Ok(tera::Context::new());
        }

        let raw = if self.params.is_data_source_inline {
            self.params.data_source.clone()
        } else {
            self.fetch_content(&self.params.data_source)?
        };

        match self.params.data_source_format.to_lowercase().as_str() {
            "json" => {
                let value: serde_json::Value = serde_json::from_str(&raw).map_err(|source| {
                    PluginError::execution(
                        TYPE_TAG,
                        format!("failed to parse JSON data source: {source}"),
                    )
                })?;
                tera::Context::from_value(value)
                    .map_err(|source| PluginError::execution(TYPE_TAG, source))
            }
            _ => {
                let value: serde_yaml::Value = serde_yaml::from_str(&raw).map_err(|source| {
                    PluginError::execution(
                        TYPE_TAG,
                        format!("failed to parse YAML data source: {source}"),
                    )
                })?;
                tera::Context::from_serialize(value)
                    .map_err(|source| PluginError::execution(TYPE_TAG, source))
            }
        }
    }
}

impl Action for TemplateAction {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }

        let template = self.fetch_content(&self.params.template_source)?;
        let context = self.build_context()?;

        let name = Path::new(&self.params.template_source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        let mut tera = Tera::default();
        tera.add_raw_template(&name, &template)
            .map_err(|source| PluginError::execution(TYPE_TAG, source))?;
        let rendered = tera
            .render(&name, &context)
            .map_err(|source| PluginError::execution(TYPE_TAG, source))?;

        if let Some(parent) = self.params.output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                PluginError::execution(
                    TYPE_TAG,
                    format!("failed to create output directory {}: {source}", parent.display()),
                )
            })?;
        }
        fs::write(&self.params.output_path, rendered).map_err(|source| {
            PluginError::execution(
                TYPE_TAG,
                format!(
                    "failed to write output file {}: {source}",
                    self.params.output_path.display()
                ),
            )
        })?;

        debug!(output_path = %self.params.output_path.display(), "template rendered");
        Ok(())
    }

    fn policy(&self) -> &ActionPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn action(params: &str) -> Result<TemplateAction, PluginError> {
        let spec: ActionSpec =
            serde_yaml::from_str(&format!("type: template\nparams:\n{params}")).expect("spec");
        TemplateAction::from_spec(&spec)
    }

    #[test]
    fn renders_with_inline_json_data() {
        let dir = TempDir::new().expect("tempdir");
        let template = dir.path().join("greeting.tera");
        fs::write(&template, "hello {{ name }}").expect("write template");
        let output = dir.path().join("out/greeting.txt");

        let mut render = action(&format!(
            "  template_source: {}\n  data_source: '{{\"name\":\"drover\"}}'\n  is_data_source_inline: true\n  output_path: {}\n",
            template.display(),
            output.display()
        ))
        .expect("build");
        render.execute(&CancellationToken::new()).expect("execute");

        assert_eq!(fs::read_to_string(&output).expect("read"), "hello drover");
    }

    #[test]
    fn renders_with_yaml_data_file() {
        let dir = TempDir::new().expect("tempdir");
        let template = dir.path().join("greeting.tera");
        fs::write(&template, "env={{ env }}").expect("write template");
        let data = dir.path().join("data.yaml");
        fs::write(&data, "env: production\n").expect("write data");
        let output = dir.path().join("out.txt");

        let mut render = action(&format!(
            "  template_source: {}\n  data_source: {}\n  data_source_format: yaml\n  output_path: {}\n",
            template.display(),
            data.display(),
            output.display()
        ))
        .expect("build");
        render.execute(&CancellationToken::new()).expect("execute");

        assert_eq!(fs::read_to_string(&output).expect("read"), "env=production");
    }

    #[test]
    fn remote_template_is_fetched() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/tpl")
            .with_status(200)
            .with_body("count={{ count }}")
            .create();
        let dir = TempDir::new().expect("tempdir");
        let output = dir.path().join("out.txt");

        let mut render = action(&format!(
            "  template_source: {}/tpl\n  data_source: '{{\"count\": 3}}'\n  is_data_source_inline: true\n  output_path: {}\n",
            server.url(),
            output.display()
        ))
        .expect("build");
        render.execute(&CancellationToken::new()).expect("execute");

        assert_eq!(fs::read_to_string(&output).expect("read"), "count=3");
    }

    #[test]
    fn unsupported_format_fails_at_build() {
        let err = action("  template_source: /tmp/x\n  output_path: /tmp/y\n  data_source_format: toml\n")
            .unwrap_err();
        assert!(matches!(err, PluginError::Config { .. }));
    }

    #[test]
    fn bad_template_syntax_is_an_execution_error() {
        let dir = TempDir::new().expect("tempdir");
        let template = dir.path().join("broken.tera");
        fs::write(&template, "{{ unclosed").expect("write template");

        let mut render = action(&format!(
            "  template_source: {}\n  output_path: {}\n",
            template.display(),
            dir.path().join("out.txt").display()
        ))
        .expect("build");
        let err = render.execute(&CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PluginError::Execution { .. }));
    }
}
