//! Argument registry: single source of truth for one command's arguments.

use crate::args::spec::{ArgId, ArgKind, ArgSpec};
use crate::error::DefinitionError;

/// Identifier of the built-in help switch.
pub const HELP: &str = "help";
/// Identifier of the built-in version switch.
pub const VERSION: &str = "version";

/// Ordered collection of specs scoped to one command or a non-command app.
#[derive(Debug, Clone)]
pub struct ArgRegistry {
    specs: Vec<ArgSpec>,
    max_positional: Option<usize>,
}

impl Default for ArgRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgRegistry {
    /// Registry for a top-level app, seeded with `help` and `version`.
    pub fn new() -> Self {
        Self::seeded(false)
    }

    /// Registry for a command; its `version` switch is only shown at the top level.
    pub fn for_command() -> Self {
        Self::seeded(true)
    }

    fn seeded(version_top_level_only: bool) -> Self {
        let help = ArgSpec::switch(HELP).help("Show help").hide_in_usage();
        let mut version = ArgSpec::switch(VERSION).help("Show version").hide_in_usage();
        if version_top_level_only {
            version = version.top_level_only();
        }

        let mut registry = Self {
            specs: Vec::new(),
            max_positional: None,
        };
        for spec in [help, version] {
            registry.push(spec.mark_built_in());
        }
        registry
    }

    /// Register a spec, assigning positionals the next index.
    ///
    /// Fails fast on a missing identifier, a duplicate (identifier, name, kind)
    /// identity, or a name/identifier already used by another spec of the same kind.
    pub fn add(&mut self, spec: ArgSpec) -> Result<ArgId, DefinitionError> {
        if spec.kind() != ArgKind::Positional && spec.identifier().trim().is_empty() {
            return Err(DefinitionError::MissingIdentifier {
                name: spec.name().to_string(),
            });
        }

        if self.specs.iter().any(|s| s.identity() == spec.identity()) {
            return Err(DefinitionError::DuplicateArgument {
                identity: spec.long_name_identifier(),
            });
        }

        if spec.kind() != ArgKind::Positional {
            let taken = self
                .specs
                .iter()
                .filter(|s| s.kind() == spec.kind())
                .flat_map(|s| s.keys())
                .find(|key| spec.keys().contains(key));
            if let Some(key) = taken {
                return Err(DefinitionError::AmbiguousKey {
                    kind: spec.kind(),
                    key: key.to_string(),
                });
            }
        }

        Ok(self.push(spec))
    }

    fn push(&mut self, mut spec: ArgSpec) -> ArgId {
        let id = ArgId(self.specs.len());
        let index = if spec.kind() == ArgKind::Positional {
            let next = self.max_positional.map_or(0, |i| i + 1);
            self.max_positional = Some(next);
            Some(next)
        } else {
            None
        };
        spec.assign(id, index);
        self.specs.push(spec);
        id
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    pub fn get(&self, id: ArgId) -> Option<&ArgSpec> {
        self.specs.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ArgId) -> Option<&mut ArgSpec> {
        self.specs.get_mut(id.0)
    }

    pub fn find<P>(&self, predicate: P) -> Option<&ArgSpec>
    where
        P: Fn(&ArgSpec) -> bool,
    {
        self.specs.iter().find(|s| predicate(s))
    }

    /// Highest assigned positional index.
    pub fn max_positional_index(&self) -> Option<usize> {
        self.max_positional
    }

    pub fn positional_at(&self, index: usize) -> Option<&ArgSpec> {
        self.find(|s| s.kind() == ArgKind::Positional && s.index() == Some(index))
    }

    pub fn positional_named(&self, name: &str) -> Option<&ArgSpec> {
        self.find(|s| s.kind() == ArgKind::Positional && s.name() == name)
    }

    /// Option or switch lookup: long name first, then identifier.
    pub fn flag(&self, kind: ArgKind, key: &str) -> Option<&ArgSpec> {
        self.find(|s| s.kind() == kind && s.name() == key)
            .or_else(|| self.find(|s| s.kind() == kind && s.identifier() == key))
    }

    /// True when user code declared anything beyond the built-ins.
    pub fn has_user_arguments(&self) -> bool {
        self.specs.iter().any(|s| !s.is_built_in())
    }

    /// Whether `args` carries `-key` / `--key` for a registered switch, before any `--`.
    pub fn switch_present(&self, key: &str, args: &[String]) -> bool {
        let Some(spec) = self.flag(ArgKind::Switch, key) else {
            return false;
        };
        args.iter()
            .take_while(|a| a.as_str() != "--")
            .filter_map(|a| a.strip_prefix("--").or_else(|| a.strip_prefix('-')))
            .any(|bare| bare == spec.name() || bare == spec.identifier())
    }

    pub(crate) fn clear_values(&mut self) {
        for spec in &mut self.specs {
            spec.clear_values();
        }
    }
}
