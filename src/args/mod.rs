//! Argument model and matching engine.
//!
//! ```text
//! argv → lex → bind (registry) → preprocess → constraint check → MatchResult
//! ```
//!
//! Each stage is a plain function over the registry and can be tested on its own.

mod constraint;
mod matcher;
mod preprocess;
mod registry;
mod spec;

pub use constraint::{Constraint, Conversion, FsProbe, OsFs};
pub use matcher::{lex, match_tokens, BadArgument, MatchOptions, MatchResult, MissingArgument, Token};
pub use preprocess::{absolutize, expand_env};
pub use registry::{ArgRegistry, HELP, VERSION};
pub use spec::{ArgId, ArgKind, ArgSpec, ArgValue, CustomPreprocess, Preprocess};
