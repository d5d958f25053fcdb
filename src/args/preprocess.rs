//! Value preprocessing: env expansion, path resolution, custom transform.

use std::path::Path;

use crate::args::spec::{ArgSpec, ArgValue, Preprocess};

/// Expand `$VAR` / `${VAR}` and a leading `~`. Unknown variables are kept verbatim.
pub fn expand_env(value: &str) -> String {
    shellexpand::full_with_context_no_errors(
        value,
        || dirs::home_dir().map(|home| home.to_string_lossy().into_owned()),
        |var| std::env::var(var).ok(),
    )
    .into_owned()
}

/// Resolve against the current directory. Values that cannot be resolved are returned unchanged.
pub fn absolutize(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match std::path::absolute(Path::new(value)) {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Transforms bound values, or the parse's default when nothing is bound.
fn transform_strings(spec: &mut ArgSpec, f: fn(&str) -> String) {
    if !spec.values().is_empty() {
        for value in spec.values_mut().iter_mut() {
            if let ArgValue::String(s) = value {
                *s = f(s);
            }
        }
    } else if let Some(ArgValue::String(s)) = spec.get_default() {
        let next = f(s);
        spec.set_default(Some(ArgValue::String(next)));
    }
}

/// Run the spec's transforms over its bound values (or default), in fixed order.
pub(crate) fn apply(spec: &mut ArgSpec) {
    let flags = spec.preprocess_flags();

    if flags.contains(Preprocess::EXPAND_ENV) {
        transform_strings(spec, expand_env);
    }
    if flags.contains(Preprocess::ABSOLUTE_PATH) {
        transform_strings(spec, absolutize);
    }
    if let Some(custom) = spec.custom_transform() {
        custom(spec);
    }
}
