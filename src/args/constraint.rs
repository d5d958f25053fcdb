//! Constraint validator: pure predicates over a candidate value.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::args::spec::{parse_bool, ArgValue};

/// Filesystem existence probe used by path constraints.
pub trait FsProbe: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FsProbe for OsFs {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Target type check for [`Constraint::ConvertsTo`].
#[derive(Clone)]
pub struct Conversion {
    type_name: Cow<'static, str>,
    check: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl Conversion {
    pub fn new<F>(type_name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            check: Arc::new(check),
        }
    }

    /// Passes when the value parses as `T`.
    pub fn parse<T: FromStr + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        Self::new(short.to_string(), |s| s.parse::<T>().is_ok())
    }

    /// Passes when the value names one of `variants`, ignoring case.
    pub fn variants(type_name: &str, variants: &[&str]) -> Self {
        let variants: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
        Self::new(type_name.to_string(), move |s| {
            variants.iter().any(|v| v.eq_ignore_ascii_case(s))
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn accepts(&self, value: &str) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Conversion").field(&self.type_name).finish()
    }
}

/// Validation rule attached to a spec.
#[derive(Debug, Clone, Default)]
pub enum Constraint {
    #[default]
    None,
    NotEmpty,
    /// Fails for empty strings too: an empty string is all whitespace.
    NotWhiteSpace,
    NotEmptyOrWhiteSpace,
    IsInteger,
    IsUnsignedInteger,
    IsDouble,
    IsBoolean,
    FileExists,
    FileDoesNotExist,
    DirectoryExists,
    DirectoryDoesNotExist,
    /// Absolute URL with a scheme.
    IsUrl,
    ConvertsTo(Conversion),
}

impl Constraint {
    pub fn is_none(&self) -> bool {
        matches!(self, Constraint::None)
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Constraint::None => "None".into(),
            Constraint::NotEmpty => "NotEmpty".into(),
            Constraint::NotWhiteSpace => "NotWhiteSpace".into(),
            Constraint::NotEmptyOrWhiteSpace => "NotEmptyOrWhiteSpace".into(),
            Constraint::IsInteger => "IsInteger".into(),
            Constraint::IsUnsignedInteger => "IsUnsignedInteger".into(),
            Constraint::IsDouble => "IsDouble".into(),
            Constraint::IsBoolean => "IsBoolean".into(),
            Constraint::FileExists => "FileExists".into(),
            Constraint::FileDoesNotExist => "FileDoesNotExist".into(),
            Constraint::DirectoryExists => "DirectoryExists".into(),
            Constraint::DirectoryDoesNotExist => "DirectoryDoesNotExist".into(),
            Constraint::IsUrl => "IsUrl".into(),
            Constraint::ConvertsTo(c) => format!("ConvertsToType({})", c.type_name()).into(),
        }
    }

    /// Evaluate against a candidate value; `None` means no value at all.
    pub fn check(&self, value: Option<&ArgValue>, fs: &dyn FsProbe) -> bool {
        if self.is_none() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        let text = value.as_str();

        match self {
            Constraint::None => true,
            Constraint::NotEmpty => text.is_some_and(|s| !s.is_empty()),
            Constraint::NotWhiteSpace | Constraint::NotEmptyOrWhiteSpace => {
                text.is_some_and(|s| !s.trim().is_empty())
            }
            Constraint::IsInteger => match value {
                ArgValue::Int(_) => true,
                _ => text.is_some_and(|s| s.parse::<i64>().is_ok()),
            },
            Constraint::IsUnsignedInteger => match value {
                ArgValue::Int(i) => *i >= 0,
                _ => text.is_some_and(|s| s.parse::<u64>().is_ok()),
            },
            Constraint::IsDouble => match value {
                ArgValue::Double(_) | ArgValue::Int(_) => true,
                _ => text.is_some_and(|s| s.parse::<f64>().is_ok()),
            },
            Constraint::IsBoolean => match value {
                ArgValue::Bool(_) => true,
                _ => text.and_then(parse_bool).is_some(),
            },
            Constraint::FileExists => text.is_some_and(|s| fs.is_file(Path::new(s))),
            Constraint::FileDoesNotExist => text.is_some_and(|s| !fs.is_file(Path::new(s))),
            Constraint::DirectoryExists => text.is_some_and(|s| fs.is_dir(Path::new(s))),
            Constraint::DirectoryDoesNotExist => {
                text.is_some_and(|s| !fs.is_dir(Path::new(s)))
            }
            Constraint::IsUrl => text.is_some_and(|s| url::Url::parse(s).is_ok()),
            Constraint::ConvertsTo(conversion) => conversion.accepts(&value.to_string()),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
