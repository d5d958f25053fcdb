//! Declarative command-line arguments: declare specs, match argv against
//! them, validate, and dispatch to a sync or async handler.

pub mod app;
pub mod args;
pub mod command;
pub mod config;
pub mod console;
pub mod context;
pub mod entry;
pub mod error;
pub mod help;
pub mod logging;
pub mod shutdown;

pub use app::{App, ParseOutcome};
pub use args::{ArgKind, ArgRegistry, ArgSpec, ArgValue, Constraint, Conversion, Preprocess};
pub use command::{Command, Handler};
pub use config::AppSettings;
pub use console::Console;
pub use context::Context;
pub use entry::EntryInfo;
pub use error::{Cancelled, ContextError, DefinitionError, HandlerFault, ValueError};
