//! Execution context: read-only view of bound arguments for handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::args::{ArgKind, ArgSpec, ArgValue};
use crate::console::Console;
use crate::error::{Cancelled, ContextError};

/// Snapshot of one parse, handed to a command handler.
///
/// Cheap to clone; async handlers can move it into spawned work.
#[derive(Clone)]
pub struct Context {
    args: Arc<[ArgSpec]>,
    cancel: CancellationToken,
    help: Arc<str>,
    console: Console,
}

impl Context {
    pub fn new(args: Vec<ArgSpec>, cancel: CancellationToken, help: String, console: Console) -> Self {
        Self {
            args: args.into(),
            cancel,
            help: help.into(),
            console,
        }
    }

    pub fn arguments(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Help text of the running command (or app).
    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once cancellation was requested, for use with `?`.
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// True when no user-declared argument has a value or default.
    pub fn no_argument_values_exist(&self) -> bool {
        self.args.iter().all(|a| a.is_built_in() || !a.exists())
    }

    /// Positional by name.
    pub fn get(&self, name: &str) -> Option<&ArgSpec> {
        self.args
            .iter()
            .find(|a| a.kind() == ArgKind::Positional && a.name() == name)
    }

    /// Positional by index.
    pub fn get_index(&self, index: usize) -> Option<&ArgSpec> {
        self.args
            .iter()
            .find(|a| a.kind() == ArgKind::Positional && a.index() == Some(index))
    }

    /// Option by long name, then identifier.
    pub fn option(&self, key: &str) -> Option<&ArgSpec> {
        self.flag(ArgKind::Option, key)
    }

    /// Switch by long name, then identifier.
    pub fn switch(&self, key: &str) -> Option<&ArgSpec> {
        self.flag(ArgKind::Switch, key)
    }

    fn flag(&self, kind: ArgKind, key: &str) -> Option<&ArgSpec> {
        self.args
            .iter()
            .find(|a| a.kind() == kind && a.name() == key)
            .or_else(|| {
                self.args
                    .iter()
                    .find(|a| a.kind() == kind && a.identifier() == key)
            })
    }

    /// Effective value of a positional, if any.
    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.get(name).and_then(ArgSpec::effective_value)
    }

    /// Effective value of a positional, or an error naming what is absent.
    pub fn require(&self, name: &str) -> Result<&ArgValue, ContextError> {
        let spec = self.get(name).ok_or_else(|| ContextError::NotFound {
            kind: ArgKind::Positional,
            key: name.to_string(),
        })?;
        spec.effective_value()
            .ok_or_else(|| ContextError::NoValue(name.to_string()))
    }

    pub fn require_index(&self, index: usize) -> Result<&ArgValue, ContextError> {
        let spec = self
            .get_index(index)
            .ok_or(ContextError::IndexNotFound(index))?;
        spec.effective_value()
            .ok_or_else(|| ContextError::NoValue(spec.name().to_string()))
    }

    pub fn option_value(&self, key: &str) -> Option<&ArgValue> {
        self.option(key).and_then(ArgSpec::effective_value)
    }

    /// Every value bound to a repeated option; the default alone when unbound.
    pub fn option_values(&self, key: &str) -> Vec<&ArgValue> {
        match self.option(key) {
            Some(spec) if !spec.values().is_empty() => spec.values().iter().collect(),
            Some(spec) => spec.get_default().into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Whether a switch was given (or defaults to true).
    pub fn is_set(&self, key: &str) -> bool {
        self.switch(key)
            .and_then(ArgSpec::effective_value)
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{match_tokens, ArgRegistry, MatchOptions};

    fn context(specs: Vec<ArgSpec>, tokens: &[&str]) -> Context {
        let mut registry = ArgRegistry::new();
        for spec in specs {
            registry.add(spec).unwrap();
        }
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        match_tokens(&mut registry, &tokens, &MatchOptions::default());
        Context::new(
            registry.specs().to_vec(),
            CancellationToken::new(),
            "help".to_string(),
            Console::capture().0,
        )
    }

    #[test]
    fn positional_lookups() {
        let ctx = context(
            vec![ArgSpec::positional("a"), ArgSpec::positional("b").default_value("B")],
            &["A"],
        );
        assert_eq!(ctx.value("a"), Some(&ArgValue::from("A")));
        assert_eq!(ctx.require_index(1).unwrap(), &ArgValue::from("B"));
        assert!(ctx.get_index(2).is_none());
        assert!(matches!(ctx.require("zzz"), Err(ContextError::NotFound { .. })));
    }

    #[test]
    fn flag_lookups_use_both_keys() {
        let ctx = context(
            vec![
                ArgSpec::option("o", "output"),
                ArgSpec::switch_named("v", "verbose"),
            ],
            &["--output=x", "-v"],
        );
        assert_eq!(ctx.option_value("o"), Some(&ArgValue::from("x")));
        assert_eq!(ctx.option_value("output"), Some(&ArgValue::from("x")));
        assert!(ctx.is_set("verbose"));
        assert!(ctx.is_set("v"));
        assert!(!ctx.is_set("help"));
    }

    #[test]
    fn repeated_option_values() {
        let ctx = context(vec![ArgSpec::option("n", "number").default_value(0)], &["-n=1", "-n=2"]);
        let values: Vec<String> = ctx.option_values("n").iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn no_argument_values_ignores_builtins() {
        let ctx = context(vec![ArgSpec::positional("a")], &["--help"]);
        assert!(ctx.no_argument_values_exist());

        let ctx = context(vec![ArgSpec::positional("a")], &["x"]);
        assert!(!ctx.no_argument_values_exist());
    }

    #[test]
    fn missing_value_reports_name() {
        let ctx = context(vec![ArgSpec::positional("a")], &[]);
        assert_eq!(ctx.require("a"), Err(ContextError::NoValue("a".to_string())));
    }

    #[test]
    fn check_cancelled_follows_token() {
        let ctx = context(vec![], &[]);
        assert!(ctx.check_cancelled().is_ok());
        ctx.cancellation().cancel();
        assert_eq!(ctx.check_cancelled(), Err(Cancelled));
    }
}
