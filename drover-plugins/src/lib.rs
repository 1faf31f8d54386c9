//! # drover-plugins
//!
//! Built-in check and action plugins for the drover orchestrator, plus
//! [`builtin_registry`] which registers all of them under their selector
//! strings.

mod http;
mod params;
mod process;

pub mod actions;
pub mod checks;

use drover_core::{Action, Check, PluginRegistry};

/// A plugin registry with every built-in check and action registered.
///
/// Checks: `dummy`, `file`, `cron`, `localstate`, `shell`, `rest`.
/// Actions: `dummy`, `print`, `sleep`, `localstate`, `rest`, `shell`,
/// `template`.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();

    registry.register_check("dummy", |spec| {
        Ok(Box::new(checks::DummyCheck::from_spec(spec)?) as Box<dyn Check>)
    });
    registry.register_check("file", |spec| {
        Ok(Box::new(checks::FileCheck::from_spec(spec)?) as Box<dyn Check>)
    });
    registry.register_check("cron", |spec| {
        Ok(Box::new(checks::CronCheck::from_spec(spec)?) as Box<dyn Check>)
    });
    registry.register_check("localstate", |spec| {
        Ok(Box::new(checks::LocalStateCheck::from_spec(spec)?) as Box<dyn Check>)
    });
    registry.register_check("shell", |spec| {
        Ok(Box::new(checks::ShellCheck::from_spec(spec)?) as Box<dyn Check>)
    });
    registry.register_check("rest", |spec| {
        Ok(Box::new(checks::RestCheck::from_spec(spec)?) as Box<dyn Check>)
    });

    registry.register_action("dummy", |spec| {
        Ok(Box::new(actions::DummyAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("print", |spec| {
        Ok(Box::new(actions::PrintAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("sleep", |spec| {
        Ok(Box::new(actions::SleepAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("localstate", |spec| {
        Ok(Box::new(actions::LocalStateAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("rest", |spec| {
        Ok(Box::new(actions::RestAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("shell", |spec| {
        Ok(Box::new(actions::ShellAction::from_spec(spec)?) as Box<dyn Action>)
    });
    registry.register_action("template", |spec| {
        Ok(Box::new(actions::TemplateAction::from_spec(spec)?) as Box<dyn Action>)
    });

    registry
}

#[cfg(test)]
mod tests {
    use drover_core::{ActionSpec, CheckSpec, PluginError};

    use super::*;

    #[test]
    fn every_builtin_check_selector_resolves() {
        let registry = builtin_registry();
        // Selectors whose params have no required fields build directly.
        for selector in ["dummy", "shell"] {
            let spec: CheckSpec =
                serde_yaml::from_str(&format!("type: {selector}")).expect("spec");
            registry
                .build_check(&spec)
                .unwrap_or_else(|err| panic!("{selector} should build: {err}"));
        }
        // The rest fail on missing params, not on the selector.
        for selector in ["file", "cron", "localstate", "rest"] {
            let spec: CheckSpec =
                serde_yaml::from_str(&format!("type: {selector}")).expect("spec");
            let err = registry.build_check(&spec).unwrap_err();
            assert!(
                !matches!(err, PluginError::UnknownCheckType(_)),
                "{selector} must be registered"
            );
        }
    }

    #[test]
    fn every_builtin_action_selector_resolves() {
        let registry = builtin_registry();
        for selector in ["dummy", "print", "shell"] {
            let spec: ActionSpec =
                serde_yaml::from_str(&format!("type: {selector}")).expect("spec");
            registry
                .build_action(&spec)
                .unwrap_or_else(|err| panic!("{selector} should build: {err}"));
        }
        for selector in ["sleep", "localstate", "rest", "template"] {
            let spec: ActionSpec =
                serde_yaml::from_str(&format!("type: {selector}")).expect("spec");
            let err = registry.build_action(&spec).unwrap_err();
            assert!(
                !matches!(err, PluginError::UnknownActionType(_)),
                "{selector} must be registered"
            );
        }
    }

    #[test]
    fn unknown_selectors_stay_unknown() {
        let registry = builtin_registry();
        let spec: CheckSpec = serde_yaml::from_str("type: telepathy").expect("spec");
        let err = registry.build_check(&spec).unwrap_err();
        assert!(matches!(err, PluginError::UnknownCheckType(_)));
    }
}
