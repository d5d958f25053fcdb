//! Help, usage, version, and diagnostic text.
//!
//! Everything here is a pure function of the registries; no parse is needed.
//! Returned text carries no trailing newline.

use std::fmt::Write as _;

use crate::args::{ArgId, ArgKind, ArgRegistry, ArgSpec, MatchResult};
use crate::command::Command;

const HELP_HINT: &str = "(use --help switch to view help)";

/// Which specs a help block may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    Command,
}

impl Scope {
    fn admits(self, spec: &ArgSpec) -> bool {
        self == Scope::TopLevel || !spec.is_top_level_only()
    }
}

/// Usage fragment: visible switches, then visible options, then positionals by index.
pub fn usage_text(registry: &ArgRegistry) -> Option<String> {
    let parts: Vec<String> = of_kind(registry, ArgKind::Switch)
        .chain(of_kind(registry, ArgKind::Option))
        .filter(|s| !s.is_hidden_in_usage())
        .chain(positionals(registry))
        .map(ArgSpec::usage_text)
        .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}

fn of_kind(registry: &ArgRegistry, kind: ArgKind) -> impl Iterator<Item = &ArgSpec> {
    registry.specs().iter().filter(move |s| s.kind() == kind)
}

fn positionals(registry: &ArgRegistry) -> impl Iterator<Item = &ArgSpec> {
    let mut specs: Vec<&ArgSpec> = of_kind(registry, ArgKind::Positional).collect();
    specs.sort_by_key(|s| s.index());
    specs.into_iter()
}

fn entry(out: &mut String, label: &str, help: Option<&str>) {
    match help {
        Some(help) => {
            let _ = write!(out, "\n {} - {}", label, help);
        }
        None => {
            let _ = write!(out, "\n {}", label);
        }
    }
}

fn section<'a>(out: &mut String, heading: &str, specs: impl Iterator<Item = &'a ArgSpec>, label: fn(&ArgSpec) -> String) {
    let mut specs = specs.peekable();
    if specs.peek().is_none() {
        return;
    }
    let _ = write!(out, "\n\n{}:", heading);
    for spec in specs {
        entry(out, &label(spec), spec.help_text());
    }
}

fn argument_sections(out: &mut String, registry: &ArgRegistry, scope: Scope, include_positionals: bool) {
    section(
        out,
        "Switches",
        of_kind(registry, ArgKind::Switch).filter(|s| scope.admits(s)),
        ArgSpec::long_name_identifier,
    );
    section(
        out,
        "Options",
        of_kind(registry, ArgKind::Option).filter(|s| scope.admits(s)),
        ArgSpec::name_identifier,
    );
    if include_positionals {
        section(
            out,
            "Arguments",
            positionals(registry).filter(|s| scope.admits(s)),
            ArgSpec::name_identifier,
        );
    }
}

/// Top-level help for an app.
///
/// Command-based apps list their commands ahead of the top-level switches and
/// options, and use `command [arguments]` as the usage fragment.
pub fn app_help(title: Option<&str>, name: &str, registry: &ArgRegistry, commands: &[Command]) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        out.push_str(title);
        out.push('\n');
    }

    let usage = if commands.is_empty() {
        usage_text(registry)
    } else {
        Some("command [arguments]".to_string())
    };
    out.push_str("Usage: ");
    out.push_str(name);
    if let Some(usage) = usage {
        out.push(' ');
        out.push_str(&usage);
    }

    if commands.is_empty() {
        argument_sections(&mut out, registry, Scope::TopLevel, true);
    } else {
        out.push_str("\n\nCommands:");
        for command in commands {
            entry(&mut out, command.name(), command.title_text());
        }
        argument_sections(&mut out, registry, Scope::TopLevel, false);
    }
    out
}

/// Help for one command; top-level-only built-ins are left out.
pub(crate) fn command_help(command: &Command) -> String {
    let mut out = String::new();
    if let Some(title) = command.title_text() {
        out.push_str(title);
        out.push('\n');
    }
    out.push_str("Command: ");
    out.push_str(command.name());
    if let Some(usage) = usage_text(command.registry()) {
        out.push(' ');
        out.push_str(&usage);
    }
    argument_sections(&mut out, command.registry(), Scope::Command, true);
    out
}

/// `name — title (vX.Y)`, or `name (vX.Y)` without a title.
pub fn version_text(name: &str, title: Option<&str>, version: &str) -> String {
    match title {
        Some(title) => format!("{} — {} (v{})", name, title, version),
        None => format!("{} (v{})", name, version),
    }
}

/// Diagnostics for a failed match, in bad / missing / unknown order.
///
/// Empty when the result carries no failures.
pub fn diagnostics(result: &MatchResult, registry: &ArgRegistry) -> String {
    let mut lines: Vec<String> = Vec::new();
    let label = |id: ArgId| {
        registry
            .get(id)
            .map(|s| (s.name_identifier(), s.help_text().unwrap_or_default().to_string()))
    };

    if !result.bad.is_empty() {
        lines.push(format!("Bad arguments {}:", HELP_HINT));
        for bad in &result.bad {
            let (shown, help) = label(bad.id).unwrap_or_else(|| (bad.name.clone(), String::new()));
            lines.push(format!(
                " {} - {} - {}: {}",
                shown,
                help,
                bad.constraint,
                bad.value.as_deref().unwrap_or_default()
            ));
        }
    }

    if !result.missing.is_empty() {
        lines.push(format!("Missing required arguments {}:", HELP_HINT));
        for missing in &result.missing {
            let (shown, help) = label(missing.id).unwrap_or_else(|| (missing.name.clone(), String::new()));
            lines.push(format!(" {} - {}", shown, help));
        }
    }

    if !result.unknown.is_empty() {
        lines.push(format!("Unknown arguments {}: {}", HELP_HINT, result.unknown.join(", ")));
    }

    lines.join("\n")
}

pub fn unknown_command(token: &str) -> String {
    format!("Unknown command: {}", token)
}
