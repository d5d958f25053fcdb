//! Integration tests for argument matching.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cliframe::args::{
    expand_env, match_tokens, ArgKind, ArgRegistry, ArgSpec, ArgValue, Constraint, FsProbe,
    MatchOptions, OsFs, Preprocess,
};

fn raw_args(args: Vec<&str>) -> Vec<String> {
    args.into_iter().map(String::from).collect()
}

fn registry(specs: Vec<ArgSpec>) -> ArgRegistry {
    let mut registry = ArgRegistry::new();
    for spec in specs {
        registry.add(spec).unwrap();
    }
    registry
}

fn your_name() -> ArgRegistry {
    registry(vec![ArgSpec::positional("yourName")
        .required()
        .help("The name of the user")
        .constraint(Constraint::NotEmptyOrWhiteSpace)])
}

struct FakeFs {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl FsProbe for FakeFs {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}

// =============================================================================
// POSITIONAL BINDING
// =============================================================================

#[test]
fn positionals_bind_in_declaration_order() {
    let names = ["a", "b", "c", "d"];
    let mut registry = registry(names.iter().map(|n| ArgSpec::positional(n)).collect());

    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["one", "two", "three", "four"]),
        &MatchOptions::default(),
    );

    assert!(result.is_success());
    for (index, expected) in ["one", "two", "three", "four"].iter().enumerate() {
        let spec = registry.positional_at(index).unwrap();
        assert_eq!(spec.name(), names[index]);
        assert_eq!(spec.value(), Some(&ArgValue::from(*expected)));
    }
}

#[test]
fn surplus_positionals_are_unknown() {
    let mut registry = registry(vec![ArgSpec::positional("a")]);
    let result = match_tokens(&mut registry, &raw_args(vec!["x", "y", "z"]), &MatchOptions::default());
    assert_eq!(result.unknown, raw_args(vec!["y", "z"]));
}

#[test]
fn end_of_options_forces_positional() {
    let mut registry = registry(vec![
        ArgSpec::switch_named("v", "verbose"),
        ArgSpec::positional("first"),
        ArgSpec::positional("second"),
    ]);
    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["--", "-v", "--verbose"]),
        &MatchOptions::default(),
    );

    assert!(result.is_success());
    assert!(registry.flag(ArgKind::Switch, "v").unwrap().values().is_empty());
    assert_eq!(
        registry.positional_named("first").unwrap().value(),
        Some(&ArgValue::from("-v"))
    );
    assert_eq!(
        registry.positional_named("second").unwrap().value(),
        Some(&ArgValue::from("--verbose"))
    );
}

// =============================================================================
// OPTIONS AND SWITCHES
// =============================================================================

#[test]
fn long_and_short_forms_reach_the_same_spec() {
    for token in ["--output=a.txt", "--output:a.txt", "-o=a.txt", "-o:a.txt", "--o=a.txt", "-output=a.txt"] {
        let mut registry = registry(vec![ArgSpec::option("o", "output")]);
        let result = match_tokens(&mut registry, &raw_args(vec![token]), &MatchOptions::default());
        assert!(result.is_success(), "{token}");
        assert_eq!(
            registry.flag(ArgKind::Option, "output").unwrap().value(),
            Some(&ArgValue::from("a.txt")),
            "{token}"
        );
    }
}

#[test]
fn switch_binds_true() {
    let mut registry = registry(vec![ArgSpec::switch_named("v", "verbose")]);
    let result = match_tokens(&mut registry, &raw_args(vec!["-v"]), &MatchOptions::default());
    assert!(result.is_success());
    assert_eq!(
        registry.flag(ArgKind::Switch, "verbose").unwrap().value(),
        Some(&ArgValue::Bool(true))
    );
}

#[test]
fn switch_with_value_is_unknown() {
    let mut registry = registry(vec![ArgSpec::switch_named("v", "verbose")]);
    let result = match_tokens(&mut registry, &raw_args(vec!["--verbose=yes"]), &MatchOptions::default());
    assert_eq!(result.unknown, raw_args(vec!["--verbose=yes"]));
}

#[test]
fn unmatched_flag_is_unknown() {
    let mut registry = registry(vec![ArgSpec::positional("a")]);
    let result = match_tokens(&mut registry, &raw_args(vec!["--nope", "x"]), &MatchOptions::default());
    assert_eq!(result.unknown, raw_args(vec!["--nope"]));
    assert_eq!(registry.positional_named("a").unwrap().value(), Some(&ArgValue::from("x")));
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

#[test]
fn your_name_scenarios() {
    let mut registry = your_name();

    let result = match_tokens(&mut registry, &raw_args(vec!["World"]), &MatchOptions::default());
    assert!(result.is_success());
    assert_eq!(
        registry.positional_named("yourName").unwrap().value(),
        Some(&ArgValue::from("World"))
    );

    let result = match_tokens(&mut registry, &[], &MatchOptions::default());
    assert_eq!(result.missing.len(), 1);
    assert_eq!(result.missing[0].name, "yourName");
    assert!(result.bad.is_empty());

    let result = match_tokens(&mut registry, &raw_args(vec![""]), &MatchOptions::default());
    assert_eq!(result.bad.len(), 1);
    assert_eq!(result.bad[0].name, "yourName");
    assert_eq!(result.bad[0].constraint, "NotEmptyOrWhiteSpace");
    assert_eq!(result.bad[0].value.as_deref(), Some(""));
    assert!(result.missing.is_empty());
}

#[test]
fn bad_required_value_is_not_also_missing() {
    let mut registry = registry(vec![ArgSpec::option("n", "count")
        .required()
        .constraint(Constraint::IsUnsignedInteger)]);
    let result = match_tokens(&mut registry, &raw_args(vec!["-n=-3"]), &MatchOptions::default());
    assert_eq!(result.bad.len(), 1);
    assert!(result.missing.is_empty());
}

#[test]
fn all_failures_are_reported_in_one_pass() {
    let mut registry = registry(vec![
        ArgSpec::positional("count").required().constraint(Constraint::IsInteger),
        ArgSpec::option("r", "ratio").required().constraint(Constraint::IsDouble),
        ArgSpec::option("m", "mode").required(),
    ]);
    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["ten", "--ratio=half", "--what"]),
        &MatchOptions::default(),
    );

    let bad: Vec<&str> = result.bad.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(bad, vec!["count", "ratio"]);
    assert_eq!(result.missing.len(), 1);
    assert_eq!(result.missing[0].name, "mode");
    assert_eq!(result.unknown, raw_args(vec!["--what"]));
}

#[test]
fn default_satisfies_optional_spec() {
    let mut registry = registry(vec![ArgSpec::option("l", "level").default_value(3)]);
    let result = match_tokens(&mut registry, &[], &MatchOptions::default());
    assert!(result.is_success());

    let spec = registry.flag(ArgKind::Option, "level").unwrap();
    assert!(spec.is_default_value());
    assert_eq!(spec.effective_value().unwrap().as_int(), Ok(3));
}

// =============================================================================
// CONSTRAINTS AND PREPROCESSING
// =============================================================================

#[test]
fn none_constraint_always_passes() {
    for value in [None, Some(ArgValue::from("")), Some(ArgValue::from("  ")), Some(ArgValue::Int(-1))] {
        assert!(Constraint::None.check(value.as_ref(), &OsFs));
    }
}

#[test]
fn path_constraints_use_the_probe() {
    let fs = FakeFs {
        files: HashSet::from([PathBuf::from("/data/input.csv")]),
        dirs: HashSet::from([PathBuf::from("/data")]),
    };
    let options = MatchOptions {
        check_constraints: true,
        fs: Arc::new(fs),
    };
    let mut registry = registry(vec![
        ArgSpec::positional("input").constraint(Constraint::FileExists),
        ArgSpec::positional("out").constraint(Constraint::DirectoryExists),
        ArgSpec::positional("fresh").constraint(Constraint::FileDoesNotExist),
    ]);

    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["/data/input.csv", "/data", "/data/new.csv"]),
        &options,
    );
    assert!(result.is_success());

    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["/data/missing.csv", "/data/input.csv", "/data/input.csv"]),
        &options,
    );
    let bad: Vec<&str> = result.bad.iter().map(|b| b.constraint.as_str()).collect();
    assert_eq!(bad, vec!["FileExists", "DirectoryExists", "FileDoesNotExist"]);
}

#[test]
fn url_constraint() {
    let mut registry = registry(vec![ArgSpec::option("u", "url").constraint(Constraint::IsUrl)]);
    let result = match_tokens(
        &mut registry,
        &raw_args(vec!["--url=https://example.com/a?b=c"]),
        &MatchOptions::default(),
    );
    assert!(result.is_success());

    let result = match_tokens(&mut registry, &raw_args(vec!["--url=not a url"]), &MatchOptions::default());
    assert_eq!(result.bad.len(), 1);
}

#[test]
fn expansion_and_absolute_path_are_fixed_points() {
    std::env::set_var("CLIFRAME_TEST_DIR", "nested/dir");
    let mut registry = registry(vec![ArgSpec::positional("dir")
        .preprocess(Preprocess::EXPAND_ENV | Preprocess::ABSOLUTE_PATH)]);

    match_tokens(&mut registry, &raw_args(vec!["$CLIFRAME_TEST_DIR"]), &MatchOptions::default());
    let once = registry.positional_named("dir").unwrap().value().unwrap().to_string();
    assert!(Path::new(&once).is_absolute());
    assert!(once.ends_with("nested/dir") || once.ends_with("nested\\dir"));

    match_tokens(&mut registry, &raw_args(vec![once.as_str()]), &MatchOptions::default());
    let twice = registry.positional_named("dir").unwrap().value().unwrap().to_string();
    assert_eq!(once, twice);
    assert_eq!(expand_env(&once), once);
}

#[test]
fn repeated_passes_preprocess_the_default_once_each() {
    let mut registry = registry(vec![ArgSpec::option("t", "tag")
        .default_value("x")
        .custom_preprocess(|spec| {
            if let Some(ArgValue::String(s)) = spec.get_default() {
                let next = format!("{s}!");
                spec.set_default(Some(ArgValue::String(next)));
            }
        })]);

    for _ in 0..3 {
        let result = match_tokens(&mut registry, &[], &MatchOptions::default());
        assert!(result.is_success());
    }

    let spec = registry.flag(ArgKind::Option, "tag").unwrap();
    assert_eq!(spec.effective_value(), Some(&ArgValue::from("x!")));
    assert_eq!(spec.declared_default(), Some(&ArgValue::from("x")));
}

#[test]
fn env_default_follows_the_environment_between_passes() {
    let mut registry = registry(vec![ArgSpec::option("d", "dir")
        .default_value("$CLIFRAME_REPARSE_DIR")
        .preprocess(Preprocess::EXPAND_ENV)]);

    std::env::set_var("CLIFRAME_REPARSE_DIR", "first");
    match_tokens(&mut registry, &[], &MatchOptions::default());
    assert_eq!(
        registry.flag(ArgKind::Option, "dir").unwrap().effective_value(),
        Some(&ArgValue::from("first"))
    );

    std::env::set_var("CLIFRAME_REPARSE_DIR", "second");
    match_tokens(&mut registry, &[], &MatchOptions::default());
    assert_eq!(
        registry.flag(ArgKind::Option, "dir").unwrap().effective_value(),
        Some(&ArgValue::from("second"))
    );
}

#[test]
fn bound_value_leaves_the_default_alone() {
    std::env::set_var("CLIFRAME_BOUND_DEFAULT", "expanded");
    let mut registry = registry(vec![ArgSpec::option("d", "dir")
        .default_value("$CLIFRAME_BOUND_DEFAULT")
        .preprocess(Preprocess::EXPAND_ENV)]);

    match_tokens(&mut registry, &raw_args(vec!["--dir=given"]), &MatchOptions::default());

    let spec = registry.flag(ArgKind::Option, "dir").unwrap();
    assert_eq!(spec.value(), Some(&ArgValue::from("given")));
    assert_eq!(spec.get_default(), Some(&ArgValue::from("$CLIFRAME_BOUND_DEFAULT")));
}
