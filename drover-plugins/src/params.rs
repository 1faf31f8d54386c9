//! Shared plugin helpers: param deserialization and cancellable waits.

use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use drover_core::{CancellationToken, PluginError};

/// How often blocking waits re-check the cancellation token.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Deserialize a descriptor's `params` block into a plugin's params struct.
/// A missing block deserializes as an empty mapping so defaults apply;
/// genuinely required fields still fail.
pub(crate) fn parse_params<T: DeserializeOwned>(
    type_tag: &str,
    value: &Value,
) -> Result<T, PluginError> {
    let value = if value.is_null() {
        Value::Mapping(Mapping::new())
    } else {
        value.clone()
    };
    serde_yaml::from_value(value).map_err(|source| PluginError::invalid_params(type_tag, source))
}

/// Sleep for `duration` unless the token fires first. Returns `false` on
/// cancellation.
pub(crate) fn wait_cancellable(duration: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

pub(crate) fn default_true() -> bool {
    true
}
