//! Argument spec: declarative description of one accepted argument.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use crate::args::constraint::Constraint;
use crate::error::ValueError;

/// How an argument is bound from the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Bound by order among bare tokens.
    Positional,
    /// Flagged, value attached with `=` or `:` (e.g. `-o=out.txt`).
    Option,
    /// Flagged boolean presence (e.g. `--verbose`).
    Switch,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Positional => write!(f, "positional"),
            ArgKind::Option => write!(f, "option"),
            ArgKind::Switch => write!(f, "switch"),
        }
    }
}

/// Opaque handle assigned when a spec is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgId(pub(crate) usize);

/// A bound or default value.
///
/// Typed accessors parse from the canonical string form on demand, so any
/// variant can be read as any type it converts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
}

impl ArgValue {
    /// The string payload, only for the `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            ArgValue::Int(i) => Ok(*i),
            other => {
                let text = other.to_string();
                text.parse().map_err(|_| ValueError::NotAnInteger(text))
            }
        }
    }

    pub fn as_uint(&self) -> Result<u64, ValueError> {
        match self {
            ArgValue::Int(i) if *i >= 0 => Ok(*i as u64),
            other => {
                let text = other.to_string();
                text.parse()
                    .map_err(|_| ValueError::NotAnUnsignedInteger(text))
            }
        }
    }

    pub fn as_double(&self) -> Result<f64, ValueError> {
        match self {
            ArgValue::Double(d) => Ok(*d),
            ArgValue::Int(i) => Ok(*i as f64),
            other => {
                let text = other.to_string();
                text.parse().map_err(|_| ValueError::NotADouble(text))
            }
        }
    }

    /// Case-insensitive `true` / `false`.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            ArgValue::Bool(b) => Ok(*b),
            other => {
                let text = other.to_string();
                parse_bool(&text).ok_or(ValueError::NotABoolean(text))
            }
        }
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::String(s) => write!(f, "{}", s),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Double(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(value.into())
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Double(value)
    }
}

/// Value transforms applied after matching, before constraint checks.
///
/// Flags combine with `|`; they always run in the order env expansion,
/// then absolute path resolution, then the spec's custom transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preprocess(u8);

impl Preprocess {
    pub const NONE: Preprocess = Preprocess(0);
    /// Expand `$VAR`, `${VAR}` and a leading `~`.
    pub const EXPAND_ENV: Preprocess = Preprocess(1);
    /// Resolve relative paths against the current directory.
    pub const ABSOLUTE_PATH: Preprocess = Preprocess(1 << 1);

    pub fn contains(self, other: Preprocess) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for Preprocess {
    type Output = Preprocess;

    fn bitor(self, rhs: Preprocess) -> Preprocess {
        Preprocess(self.0 | rhs.0)
    }
}

/// Caller-supplied transform receiving the whole spec.
pub type CustomPreprocess = Arc<dyn Fn(&mut ArgSpec) + Send + Sync>;

/// One accepted argument and, after a parse, its bound values.
#[derive(Clone)]
pub struct ArgSpec {
    name: String,
    identifier: String,
    kind: ArgKind,
    index: Option<usize>,
    required: bool,
    constraint: Constraint,
    default: Option<ArgValue>,
    /// Default as seen by the current parse; reset from `default` each pass.
    resolved_default: Option<ArgValue>,
    values: Vec<ArgValue>,
    preprocess: Preprocess,
    custom_preprocess: Option<CustomPreprocess>,
    help: Option<String>,
    hide_in_usage: bool,
    top_level_only: bool,
    built_in: bool,
    id: Option<ArgId>,
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .field("index", &self.index)
            .field("required", &self.required)
            .field("constraint", &self.constraint)
            .field("default", &self.default)
            .field("resolved_default", &self.resolved_default)
            .field("values", &self.values)
            .field("preprocess", &self.preprocess)
            .field("custom_preprocess", &self.custom_preprocess.is_some())
            .finish_non_exhaustive()
    }
}

impl ArgSpec {
    fn new(name: &str, identifier: &str, kind: ArgKind) -> Self {
        Self {
            name: name.to_string(),
            identifier: identifier.to_string(),
            kind,
            index: None,
            required: false,
            constraint: Constraint::None,
            default: None,
            resolved_default: None,
            values: Vec::new(),
            preprocess: Preprocess::NONE,
            custom_preprocess: None,
            help: None,
            hide_in_usage: false,
            top_level_only: false,
            built_in: false,
            id: None,
        }
    }

    /// A positional argument; its index is assigned at registration.
    pub fn positional(name: &str) -> Self {
        Self::new(name, "", ArgKind::Positional)
    }

    /// An option matched by `identifier` (e.g. `-o=x`) or by its value label `name` (`--output=x`).
    pub fn option(identifier: &str, name: &str) -> Self {
        Self::new(name, identifier, ArgKind::Option)
    }

    /// A switch whose identifier doubles as its name.
    pub fn switch(identifier: &str) -> Self {
        Self::new(identifier, identifier, ArgKind::Switch)
    }

    /// A switch with distinct short identifier and long name (e.g. `-v` / `--verbose`).
    pub fn switch_named(identifier: &str, name: &str) -> Self {
        Self::new(name, identifier, ArgKind::Switch)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn default_value(mut self, value: impl Into<ArgValue>) -> Self {
        let value = value.into();
        self.resolved_default = Some(value.clone());
        self.default = Some(value);
        self
    }

    pub fn preprocess(mut self, flags: Preprocess) -> Self {
        self.preprocess = flags;
        self
    }

    pub fn custom_preprocess<F>(mut self, transform: F) -> Self
    where
        F: Fn(&mut ArgSpec) + Send + Sync + 'static,
    {
        self.custom_preprocess = Some(Arc::new(transform));
        self
    }

    /// Leave this spec out of the usage line (it is still listed in help sections).
    pub fn hide_in_usage(mut self) -> Self {
        self.hide_in_usage = true;
        self
    }

    /// Only list this spec in top-level help, never in a command's help.
    pub fn top_level_only(mut self) -> Self {
        self.top_level_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    /// Position among positionals; `None` for options and switches.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Default for the current parse, after preprocessing.
    pub fn get_default(&self) -> Option<&ArgValue> {
        self.resolved_default.as_ref()
    }

    /// Replace the current parse's default. The declared default is kept.
    pub fn set_default(&mut self, value: Option<ArgValue>) {
        self.resolved_default = value;
    }

    /// Default as declared, before any preprocessing.
    pub fn declared_default(&self) -> Option<&ArgValue> {
        self.default.as_ref()
    }

    pub fn values(&self) -> &[ArgValue] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vec<ArgValue> {
        &mut self.values
    }

    /// First bound value.
    pub fn value(&self) -> Option<&ArgValue> {
        self.values.first()
    }

    /// Bound value, else default.
    pub fn effective_value(&self) -> Option<&ArgValue> {
        self.value().or(self.resolved_default.as_ref())
    }

    pub fn exists(&self) -> bool {
        self.effective_value().is_some()
    }

    pub fn is_default_value(&self) -> bool {
        self.values.is_empty() && self.resolved_default.is_some()
    }

    pub fn has_multiple_values(&self) -> bool {
        self.values.len() > 1
    }

    pub fn preprocess_flags(&self) -> Preprocess {
        self.preprocess
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_hidden_in_usage(&self) -> bool {
        self.hide_in_usage
    }

    pub fn is_top_level_only(&self) -> bool {
        self.top_level_only
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    /// Assigned at registration; `None` for a spec not yet added to a registry.
    pub fn id(&self) -> Option<ArgId> {
        self.id
    }

    /// Deduplication identity: (identifier, name, kind).
    pub fn identity(&self) -> (&str, &str, ArgKind) {
        (&self.identifier, &self.name, self.kind)
    }

    /// Both lookup keys of an option or switch.
    pub(crate) fn keys(&self) -> [&str; 2] {
        [&self.name, &self.identifier]
    }

    /// How the spec appears on the usage line.
    pub fn usage_text(&self) -> String {
        match self.kind {
            ArgKind::Positional if self.required => self.name.clone(),
            ArgKind::Positional => format!("[{}]", self.name),
            ArgKind::Option | ArgKind::Switch => format!("-{}", self.identifier),
        }
    }

    pub fn name_identifier(&self) -> String {
        match self.kind {
            ArgKind::Positional => self.name.clone(),
            ArgKind::Option => format!("{}:{}", self.identifier, self.name),
            ArgKind::Switch => self.identifier.clone(),
        }
    }

    /// Like [`name_identifier`](Self::name_identifier), but switches list both keys.
    pub fn long_name_identifier(&self) -> String {
        match self.kind {
            ArgKind::Switch if self.identifier != self.name => {
                format!("{},{}", self.identifier, self.name)
            }
            _ => self.name_identifier(),
        }
    }

    pub(crate) fn custom_transform(&self) -> Option<CustomPreprocess> {
        self.custom_preprocess.clone()
    }

    pub(crate) fn assign(&mut self, id: ArgId, index: Option<usize>) {
        self.id = Some(id);
        self.index = index;
    }

    pub(crate) fn mark_built_in(mut self) -> Self {
        self.built_in = true;
        self
    }

    pub(crate) fn push_value(&mut self, value: ArgValue) {
        self.values.push(value);
    }

    /// Drop bound values and restore the declared default.
    pub(crate) fn clear_values(&mut self) {
        self.values.clear();
        self.resolved_default = self.default.clone();
    }
}
