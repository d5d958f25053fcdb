//! Entry program name and version.

use std::path::Path;

/// Name and display version of the program being run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    name: String,
    version: String,
}

impl EntryInfo {
    /// `version` is normalized with [`format_version`].
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: format_version(version),
        }
    }

    /// Name from the running executable's file stem; version `0.0`.
    pub fn from_process() -> Self {
        let name = std::env::args_os()
            .next()
            .as_deref()
            .and_then(|arg0| Path::new(arg0).file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "app".to_string());
        Self::new(&name, "0.0")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Entry info for the calling crate, from its Cargo metadata.
#[macro_export]
macro_rules! entry_info {
    () => {
        $crate::entry::EntryInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
}

/// `major.minor`, plus `.patch` only when patch > 0.
///
/// Pre-release and build suffixes are dropped; strings that do not start with
/// a numeric major component are returned unchanged.
pub fn format_version(raw: &str) -> String {
    let core = raw.split(['-', '+']).next().unwrap_or(raw);
    let mut parts = core.split('.').map(|p| p.parse::<u64>());

    let Some(Ok(major)) = parts.next() else {
        return raw.to_string();
    };
    let minor = match parts.next() {
        Some(Ok(m)) => m,
        Some(Err(_)) => return raw.to_string(),
        None => 0,
    };
    match parts.next() {
        Some(Ok(patch)) if patch > 0 => format!("{}.{}.{}", major, minor, patch),
        _ => format!("{}.{}", major, minor),
    }
}
