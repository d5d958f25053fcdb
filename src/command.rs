//! Commands and their handlers.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use futures_core::future::BoxFuture;

use crate::args::{ArgId, ArgRegistry, ArgSpec};
use crate::context::Context;
use crate::error::{Cancelled, DefinitionError, HandlerFault};
use crate::help;

tokio::task_local! {
    static IN_HANDLER: &'static str;
}

static PANIC_HOOK: Once = Once::new();

/// Wrap the current panic hook so panics inside a handler are logged instead
/// of printed; they are reported through the handler fault. Other panics go
/// to the previous hook.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| match IN_HANDLER.try_with(|origin| *origin) {
            Ok(origin) => {
                tracing::debug!(origin, location = ?info.location(), "handler panicked");
            }
            Err(_) => default_hook(info),
        }));
    });
}

type SyncFn = dyn Fn(Context) -> anyhow::Result<i32> + Send + Sync;
type AsyncFn = dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<i32>> + Send + Sync;

/// User logic bound to a command or app: exactly one of sync or async.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Handler {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Context) -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        Handler::Sync(Arc::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<i32>> + Send + 'static,
    {
        Handler::Async(Arc::new(
            move |ctx| -> BoxFuture<'static, anyhow::Result<i32>> { Box::pin(f(ctx)) },
        ))
    }

    /// Run the handler, turning errors and panics into faults.
    ///
    /// Async handlers run on a spawned task, so this needs a tokio runtime.
    /// Panic output for the handler is routed to `tracing` instead of the
    /// process's panic hook; a hook set after the first invocation replaces this.
    pub(crate) async fn invoke(&self, ctx: Context, origin: &'static str) -> Result<i32, HandlerFault> {
        install_panic_hook();
        let token = ctx.cancellation().clone();
        let outcome = match self {
            Handler::Sync(f) => {
                let f = Arc::clone(f);
                let call = move || IN_HANDLER.sync_scope(origin, || f(ctx));
                panic::catch_unwind(AssertUnwindSafe(call))
                    .map_err(|payload| HandlerFault::Panicked {
                        origin,
                        message: panic_message(payload.as_ref()),
                    })?
            }
            Handler::Async(f) => match tokio::spawn(IN_HANDLER.scope(origin, f(ctx))).await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let payload = e.into_panic();
                    return Err(HandlerFault::Panicked {
                        origin,
                        message: panic_message(payload.as_ref()),
                    });
                }
                Err(_) => return Err(HandlerFault::Cancelled),
            },
        };

        outcome.map_err(|e| {
            if e.downcast_ref::<Cancelled>().is_some() || token.is_cancelled() {
                HandlerFault::Cancelled
            } else {
                HandlerFault::Failed {
                    origin,
                    message: e.to_string(),
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// A named sub-command with its own arguments.
#[derive(Clone)]
pub struct Command {
    name: String,
    title: Option<String>,
    registry: ArgRegistry,
    handler: Handler,
    check_constraints: bool,
}

impl Command {
    pub fn new(name: &str, handler: Handler) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            registry: ArgRegistry::for_command(),
            handler,
            check_constraints: true,
        }
    }

    /// Build a command and register `arguments` in order.
    pub fn with_arguments(
        name: &str,
        arguments: impl IntoIterator<Item = ArgSpec>,
        handler: Handler,
    ) -> Result<Self, DefinitionError> {
        let mut command = Self::new(name, handler);
        for spec in arguments {
            command.add_argument(spec)?;
        }
        Ok(command)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Skip constraint checks for this command's arguments.
    pub fn skip_constraint_checks(mut self) -> Self {
        self.check_constraints = false;
        self
    }

    pub fn add_argument(&mut self, spec: ArgSpec) -> Result<ArgId, DefinitionError> {
        self.registry.add(spec)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn registry(&self) -> &ArgRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ArgRegistry {
        &mut self.registry
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn checks_constraints(&self) -> bool {
        self.check_constraints
    }

    pub fn help_text(&self) -> String {
        help::command_help(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> Context {
        Context::new(Vec::new(), CancellationToken::new(), String::new(), Console::capture().0)
    }

    #[tokio::test]
    async fn sync_and_async_return_codes() {
        let sync = Handler::sync(|_| Ok(3));
        assert_eq!(sync.invoke(ctx(), "command").await, Ok(3));

        let asynchronous = Handler::asynchronous(|_| async { anyhow::Ok(4) });
        assert_eq!(asynchronous.invoke(ctx(), "command").await, Ok(4));
    }

    #[tokio::test]
    async fn errors_become_faults() {
        let handler = Handler::sync(|_| anyhow::bail!("disk full"));
        assert_eq!(
            handler.invoke(ctx(), "command").await,
            Err(HandlerFault::Failed {
                origin: "command",
                message: "disk full".to_string()
            })
        );
    }

    #[tokio::test]
    async fn panics_are_caught_for_both_variants() {
        let sync = Handler::sync(|_| panic!("boom"));
        assert!(matches!(
            sync.invoke(ctx(), "console").await,
            Err(HandlerFault::Panicked { origin: "console", message }) if message == "boom"
        ));

        let asynchronous = Handler::asynchronous(|_| async {
            if true {
                panic!("async boom");
            }
            anyhow::Ok(0)
        });
        assert!(matches!(
            asynchronous.invoke(ctx(), "command").await,
            Err(HandlerFault::Panicked { message, .. }) if message == "async boom"
        ));
    }

    #[tokio::test]
    async fn cancelled_error_is_reported_as_cancellation() {
        let handler = Handler::asynchronous(|ctx: Context| async move {
            ctx.cancellation().cancel();
            ctx.check_cancelled()?;
            anyhow::Ok(0)
        });
        assert_eq!(handler.invoke(ctx(), "command").await, Err(HandlerFault::Cancelled));
    }

    #[test]
    fn with_arguments_registers_in_order() {
        let command = Command::with_arguments(
            "copy",
            [ArgSpec::positional("src"), ArgSpec::positional("dst")],
            Handler::sync(|_| Ok(0)),
        )
        .unwrap();
        assert_eq!(command.registry().positional_at(1).unwrap().name(), "dst");
    }

    #[test]
    fn with_arguments_surfaces_definition_errors() {
        let result = Command::with_arguments(
            "bad",
            [ArgSpec::switch("")],
            Handler::sync(|_| Ok(0)),
        );
        assert!(matches!(result, Err(DefinitionError::MissingIdentifier { .. })));
    }
}
