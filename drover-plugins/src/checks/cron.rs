//! Cron-schedule gate: passes when the expression is due right now.

use std::str::FromStr;

use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use serde::Deserialize;

use drover_core::{CancellationToken, Check, CheckPolicy, CheckSpec, PluginError};

use crate::params::parse_params;

const TYPE_TAG: &str = "cron";

#[derive(Debug, Clone, Deserialize)]
struct CronParams {
    expression: String,
    #[serde(default = "default_timezone")]
    timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug)]
pub struct CronCheck {
    outcome: bool,
    policy: CheckPolicy,
    schedule: Schedule,
    timezone: Tz,
}

impl CronCheck {
    pub fn from_spec(spec: &CheckSpec) -> Result<CronCheck, PluginError> {
        let params: CronParams = parse_params(TYPE_TAG, &spec.params)?;

        let expression = normalize_expression(&params.expression);
        let schedule = Schedule::from_str(&expression).map_err(|source| {
            PluginError::config(
                TYPE_TAG,
                format!("invalid cron expression '{}': {source}", params.expression),
            )
        })?;
        let timezone = Tz::from_str(&params.timezone).map_err(|_| {
            PluginError::config(TYPE_TAG, format!("unknown timezone '{}'", params.timezone))
        })?;

        Ok(CronCheck {
            outcome: false,
            policy: spec.config.clone(),
            schedule,
            timezone,
        })
    }
}

/// Standard 5-field expressions get an any-seconds field prepended so a due
/// minute matches at whatever second the check happens to run.
fn normalize_expression(expression: &str) -> String {
    if expression.split_whitespace().count() == 5 {
        format!("* {expression}")
    } else {
        expression.to_string()
    }
}

impl Check for CronCheck {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PluginError> {
        if cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        let now = Utc::now().with_timezone(&self.timezone);
        self.outcome = self.schedule.includes(now);
        Ok(())
    }

    fn result(&self) -> bool {
        self.outcome
    }

    fn policy(&self) -> &CheckPolicy {
        &self.policy
    }
}
