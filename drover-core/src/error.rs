//! Error types for drover-core.

use thiserror::Error;

/// Boxed error source carried by plugin execution failures.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by plugin construction and execution.
///
/// An execution failure is distinct from a check's boolean outcome: the
/// outcome feeds the failure-policy state machine, while an execution failure
/// from a check is always fatal to the run.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Selector string with no registered check factory.
    #[error("unknown check type: {0}")]
    UnknownCheckType(String),

    /// Selector string with no registered action factory.
    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    /// The descriptor's `params` block did not deserialize for this plugin.
    #[error("invalid params for '{type_tag}' plugin: {source}")]
    InvalidParams {
        type_tag: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The params deserialized but fail the plugin's own validation.
    #[error("invalid config for '{type_tag}' plugin: {message}")]
    Config { type_tag: String, message: String },

    /// The plugin itself failed while executing.
    #[error("'{type_tag}' plugin failed: {source}")]
    Execution {
        type_tag: String,
        #[source]
        source: BoxedError,
    },

    /// The cancellation token was observed signaled.
    #[error("operation cancelled")]
    Cancelled,
}

impl PluginError {
    /// Convenience constructor for [`PluginError::Execution`].
    pub fn execution(type_tag: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        PluginError::Execution {
            type_tag: type_tag.into(),
            source: source.into(),
        }
    }

    /// Convenience constructor for [`PluginError::InvalidParams`].
    pub fn invalid_params(type_tag: impl Into<String>, source: serde_yaml::Error) -> Self {
        PluginError::InvalidParams {
            type_tag: type_tag.into(),
            source,
        }
    }

    /// Convenience constructor for [`PluginError::Config`].
    pub fn config(type_tag: impl Into<String>, message: impl Into<String>) -> Self {
        PluginError::Config {
            type_tag: type_tag.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the target graph engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A run or dependency referenced an id absent from the table.
    #[error("target '{0}' not found")]
    UnknownTarget(String),

    /// A check failed its gate and the effective cancel policy was set.
    #[error("check failed for target '{target}', cancelling run")]
    CheckCancelled { target: String },

    /// An action failed and the effective cancel policy was set.
    #[error("action failed for target '{target}', cancelling run: {source}")]
    ActionCancelled {
        target: String,
        #[source]
        source: PluginError,
    },

    /// A check's execution itself failed — fatal regardless of policy.
    #[error("check execution failed for target '{target}': {source}")]
    CheckExecution {
        target: String,
        #[source]
        source: PluginError,
    },

    /// The cancellation token was observed signaled.
    #[error("run cancelled")]
    Cancelled,
}

/// Raised on inserting a target id that is already present in the table.
#[derive(Debug, Error)]
#[error("target '{0}' already exists")]
pub struct DuplicateTarget(pub String);
