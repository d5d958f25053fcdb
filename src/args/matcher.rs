//! Token matcher: raw argv to bound specs plus classified failures.
//!
//! One pass binds every token it can, then preprocesses and validates each
//! bound spec exactly once, then applies the same treatment to unbound
//! defaults. Failures never stop the pass, so all bad, missing, and unknown
//! arguments are reported together.

use std::sync::Arc;

use crate::args::constraint::{FsProbe, OsFs};
use crate::args::preprocess;
use crate::args::registry::ArgRegistry;
use crate::args::spec::{ArgId, ArgKind, ArgValue};

/// Lexical shape of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// The literal `--`.
    EndOfOptions,
    /// `-key`, `--key`, optionally with `=value` or `:value`.
    Flag { key: &'a str, value: Option<&'a str> },
    /// Starts with `-` but has no key (e.g. `-`, `-=x`).
    Malformed,
    /// Anything else.
    Bare(&'a str),
}

/// Classify a token without consulting any registry.
pub fn lex(arg: &str) -> Token<'_> {
    if arg == "--" {
        return Token::EndOfOptions;
    }
    let Some(body) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
        return Token::Bare(arg);
    };
    let (key, value) = match body.find([':', '=']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    if key.is_empty() {
        Token::Malformed
    } else {
        Token::Flag { key, value }
    }
}

/// A bound value that failed its constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct BadArgument {
    pub id: ArgId,
    pub name: String,
    /// Constraint name, as shown in diagnostics.
    pub constraint: String,
    /// Offending value; `None` when there was nothing to check.
    pub value: Option<String>,
}

/// A required spec that was never bound and has no default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArgument {
    pub id: ArgId,
    pub name: String,
}

/// Outcome of one pass. A token lands in at most one list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub bad: Vec<BadArgument>,
    pub missing: Vec<MissingArgument>,
    pub unknown: Vec<String>,
}

impl MatchResult {
    pub fn is_success(&self) -> bool {
        self.bad.is_empty() && self.missing.is_empty() && self.unknown.is_empty()
    }
}

/// Per-pass knobs.
#[derive(Clone)]
pub struct MatchOptions {
    /// When false, no constraint is evaluated.
    pub check_constraints: bool,
    pub fs: Arc<dyn FsProbe>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            check_constraints: true,
            fs: Arc::new(OsFs),
        }
    }
}

/// Bind `args` into `registry`, replacing values from any previous pass.
pub fn match_tokens(registry: &mut ArgRegistry, args: &[String], options: &MatchOptions) -> MatchResult {
    registry.clear_values();

    let mut end_of_options = false;
    let mut position: Option<usize> = None;
    let mut bound: Vec<ArgId> = Vec::new();
    let mut result = MatchResult::default();

    for arg in args {
        let token = lex(arg);
        let target = match token {
            Token::EndOfOptions if !end_of_options => {
                end_of_options = true;
                continue;
            }
            Token::Flag { key, value } if !end_of_options => {
                let kind = if value.is_some() {
                    ArgKind::Option
                } else {
                    ArgKind::Switch
                };
                registry
                    .flag(kind, key)
                    .filter(|s| !s.is_top_level_only())
                    .and_then(|s| s.id())
                    .map(|id| {
                        let value = match value {
                            Some(v) => ArgValue::String(v.to_string()),
                            None => ArgValue::Bool(true),
                        };
                        (id, value)
                    })
            }
            Token::Malformed if !end_of_options => None,
            _ => {
                let next = position.map_or(0, |p| p + 1);
                position = Some(next);
                registry
                    .positional_at(next)
                    .and_then(|s| s.id())
                    .map(|id| (id, ArgValue::String(arg.clone())))
            }
        };

        match target {
            Some((id, value)) => {
                tracing::trace!(token = %arg, ?id, "bound");
                if let Some(spec) = registry.get_mut(id) {
                    spec.push_value(value);
                }
                if !bound.contains(&id) {
                    bound.push(id);
                }
            }
            None => {
                tracing::trace!(token = %arg, "unknown");
                result.unknown.push(arg.clone());
            }
        }
    }

    for id in bound {
        resolve(registry, id, options, &mut result);
    }

    let defaulted: Vec<ArgId> = registry
        .specs()
        .iter()
        .filter(|s| {
            !s.is_built_in() && !s.is_required() && s.values().is_empty() && s.get_default().is_some()
        })
        .filter_map(|s| s.id())
        .collect();
    for id in defaulted {
        resolve(registry, id, options, &mut result);
    }

    result.missing = registry
        .specs()
        .iter()
        .filter(|s| s.is_required() && !s.exists())
        .filter_map(|s| s.id().map(|id| (id, s.name())))
        .filter(|(id, _)| !result.bad.iter().any(|b| b.id == *id))
        .map(|(id, name)| MissingArgument {
            id,
            name: name.to_string(),
        })
        .collect();

    tracing::debug!(
        tokens = args.len(),
        bad = result.bad.len(),
        missing = result.missing.len(),
        unknown = result.unknown.len(),
        "argument match pass complete"
    );

    result
}

/// Preprocess one spec, then check its bound values (or its default when unbound).
fn resolve(registry: &mut ArgRegistry, id: ArgId, options: &MatchOptions, result: &mut MatchResult) {
    let Some(spec) = registry.get_mut(id) else {
        return;
    };
    preprocess::apply(spec);

    let constraint = spec.get_constraint();
    if !options.check_constraints || constraint.is_none() {
        return;
    }

    let failing = if spec.values().is_empty() {
        let value = spec.get_default();
        (!constraint.check(value, options.fs.as_ref())).then(|| value.map(|v| v.to_string()))
    } else {
        spec.values()
            .iter()
            .find(|v| !constraint.check(Some(*v), options.fs.as_ref()))
            .map(|v| Some(v.to_string()))
    };

    if let Some(value) = failing {
        tracing::trace!(name = spec.name(), constraint = %constraint, "constraint failed");
        result.bad.push(BadArgument {
            id,
            name: spec.name().to_string(),
            constraint: constraint.name().into_owned(),
            value,
        });
    }
}
