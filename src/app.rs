//! Command router and run loop.
//!
//! `parse` walks one invocation through the router states (start, command
//! selected, no command) and either settles on a handler or ends the run with
//! an exit code. `execute` then runs that handler under a cancellation token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::args::{match_tokens, ArgId, ArgRegistry, ArgSpec, FsProbe, MatchOptions, OsFs, HELP, VERSION};
use crate::command::{Command, Handler};
use crate::config::AppSettings;
use crate::console::Console;
use crate::context::Context;
use crate::entry::EntryInfo;
use crate::error::DefinitionError;
use crate::help;
use crate::shutdown::{CancelCoordinator, InterruptHook};

/// Result of [`App::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Arguments bound; call [`App::execute`].
    Proceed,
    /// The run ended during parsing (help, version, or a user input error).
    Exit(i32),
}

/// What the last successful parse selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    TopLevel,
    Command(usize),
}

/// A console application: either top-level arguments with one handler, or a
/// set of named commands.
pub struct App {
    info: EntryInfo,
    title: Option<String>,
    registry: ArgRegistry,
    handler: Option<Handler>,
    commands: Vec<Command>,
    settings: AppSettings,
    console: Console,
    fs: Arc<dyn FsProbe>,
    on_cancel: Option<InterruptHook>,
    on_terminate: Option<InterruptHook>,
    selection: Option<Selection>,
}

impl App {
    pub fn new(info: EntryInfo) -> Self {
        Self {
            info,
            title: None,
            registry: ArgRegistry::new(),
            handler: None,
            commands: Vec::new(),
            settings: AppSettings::default(),
            console: Console::stdio(),
            fs: Arc::new(OsFs),
            on_cancel: None,
            on_terminate: None,
            selection: None,
        }
    }

    /// Non-command app: `arguments` registered in order, bound to `handler`.
    pub fn with_arguments(
        info: EntryInfo,
        arguments: impl IntoIterator<Item = ArgSpec>,
        handler: Handler,
    ) -> Result<Self, DefinitionError> {
        let mut app = Self::new(info).handler(handler);
        for spec in arguments {
            app.add_argument(spec)?;
        }
        Ok(app)
    }

    /// Command-based app.
    pub fn with_commands(
        info: EntryInfo,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<Self, DefinitionError> {
        let mut app = Self::new(info);
        for command in commands {
            app.add_command(command)?;
        }
        Ok(app)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FsProbe>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Skip constraint checks for top-level arguments and every command.
    pub fn skip_constraint_checks(mut self) -> Self {
        self.settings.check_constraints = false;
        self
    }

    pub fn default_command(mut self, name: &str) -> Self {
        self.settings.default_command = Some(name.to_string());
        self
    }

    pub fn handle_interrupts(mut self, enabled: bool) -> Self {
        self.settings.handle_interrupts = enabled;
        self
    }

    /// Called on the first interrupt; return `false` to keep the token alive.
    pub fn on_cancel<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(hook));
        self
    }

    /// Called on later interrupts; return `false` to keep the process alive.
    pub fn on_terminate<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.on_terminate = Some(Arc::new(hook));
        self
    }

    pub fn add_argument(&mut self, spec: ArgSpec) -> Result<ArgId, DefinitionError> {
        if !self.commands.is_empty() {
            return Err(DefinitionError::MixedAppModes);
        }
        self.registry.add(spec)
    }

    pub fn add_command(&mut self, command: Command) -> Result<(), DefinitionError> {
        if self.registry.has_user_arguments() || self.handler.is_some() {
            return Err(DefinitionError::MixedAppModes);
        }
        if self.commands.iter().any(|c| c.name() == command.name()) {
            return Err(DefinitionError::DuplicateCommand {
                name: command.name().to_string(),
            });
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn version(&self) -> &str {
        self.info.version()
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_command_based(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn registry(&self) -> &ArgRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn help_text(&self) -> String {
        help::app_help(self.title_text(), self.name(), &self.registry, &self.commands)
    }

    pub fn version_text(&self) -> String {
        help::version_text(self.name(), self.title_text(), self.version())
    }

    fn match_options(&self, command_checks: bool) -> MatchOptions {
        MatchOptions {
            check_constraints: self.settings.check_constraints && command_checks,
            fs: Arc::clone(&self.fs),
        }
    }

    /// Route `args` and bind them, printing help, version, or diagnostics
    /// when the run ends here.
    pub fn parse(&mut self, args: &[String]) -> Result<ParseOutcome, DefinitionError> {
        self.selection = None;

        if !self.is_command_based() {
            return Ok(self.parse_top_level(args));
        }

        let substituted;
        let args = if args.is_empty() {
            match &self.settings.default_command {
                Some(name) => {
                    self.command_index(name)
                        .ok_or_else(|| DefinitionError::UnknownDefaultCommand { name: name.clone() })?;
                    tracing::debug!(command = %name, "no arguments, using default command");
                    substituted = vec![name.clone()];
                    substituted.as_slice()
                }
                None => {
                    self.console.line(self.help_text());
                    return Ok(ParseOutcome::Exit(0));
                }
            }
        } else {
            if let Some(name) = &self.settings.default_command {
                self.command_index(name)
                    .ok_or_else(|| DefinitionError::UnknownDefaultCommand { name: name.clone() })?;
            }
            args
        };

        match self.command_index(&args[0]) {
            Some(index) => Ok(self.parse_command(index, &args[1..])),
            None => {
                if let Some(outcome) = self.builtin_request(args) {
                    return Ok(outcome);
                }
                tracing::debug!(token = %args[0], "unknown command");
                self.console.error(help::unknown_command(&args[0]));
                Ok(ParseOutcome::Exit(1))
            }
        }
    }

    fn command_index(&self, name: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.name() == name)
    }

    /// `--help` / `--version` against the top-level registry.
    fn builtin_request(&self, args: &[String]) -> Option<ParseOutcome> {
        if self.registry.switch_present(HELP, args) {
            self.console.line(self.help_text());
            return Some(ParseOutcome::Exit(0));
        }
        if self.registry.switch_present(VERSION, args) {
            self.console.line(self.version_text());
            return Some(ParseOutcome::Exit(0));
        }
        None
    }

    fn parse_top_level(&mut self, args: &[String]) -> ParseOutcome {
        if let Some(outcome) = self.builtin_request(args) {
            return outcome;
        }

        let options = self.match_options(true);
        let result = match_tokens(&mut self.registry, args, &options);
        if !result.is_success() {
            let text = help::diagnostics(&result, &self.registry);
            self.report_failure(&text, self.help_text());
            return ParseOutcome::Exit(1);
        }

        self.selection = Some(Selection::TopLevel);
        ParseOutcome::Proceed
    }

    fn parse_command(&mut self, index: usize, rest: &[String]) -> ParseOutcome {
        tracing::debug!(command = %self.commands[index].name(), "command selected");

        if self.commands[index].registry().switch_present(HELP, rest) {
            self.console.line(self.commands[index].help_text());
            return ParseOutcome::Exit(0);
        }

        let options = self.match_options(self.commands[index].checks_constraints());
        let command = &mut self.commands[index];
        let result = match_tokens(command.registry_mut(), rest, &options);
        if !result.is_success() {
            let text = help::diagnostics(&result, command.registry());
            let help = command.help_text();
            self.report_failure(&text, help);
            return ParseOutcome::Exit(1);
        }

        self.selection = Some(Selection::Command(index));
        ParseOutcome::Proceed
    }

    fn report_failure(&self, diagnostics: &str, help: String) {
        if diagnostics.is_empty() {
            self.console.line(help);
        } else {
            self.console.error(diagnostics);
        }
    }

    /// Run the handler chosen by the last [`parse`](Self::parse).
    ///
    /// Handler errors and panics are reported and become exit code 1; only
    /// construction mistakes come back as `Err`.
    ///
    /// With `handle_interrupts` on, the first call installs tokio's SIGINT
    /// handler, which stays installed after this returns. A host that keeps
    /// running afterwards no longer terminates on Ctrl+C by default; turn
    /// `handle_interrupts` off if that matters.
    pub async fn execute(&self, external: Option<CancellationToken>) -> Result<i32, DefinitionError> {
        let selection = self.selection.ok_or(DefinitionError::NotParsed)?;

        let (handler, specs, help, origin) = match selection {
            Selection::TopLevel => (
                self.handler.clone().ok_or(DefinitionError::HandlerNotSet)?,
                self.registry.specs().to_vec(),
                self.help_text(),
                "console",
            ),
            Selection::Command(index) => {
                let command = &self.commands[index];
                (
                    command.handler().clone(),
                    command.registry().specs().to_vec(),
                    command.help_text(),
                    "command",
                )
            }
        };

        let coordinator = Arc::new(
            CancelCoordinator::new(external.as_ref(), self.console.clone())
                .with_hooks(self.on_cancel.clone(), self.on_terminate.clone()),
        );
        let listener = self.settings.handle_interrupts.then(|| coordinator.listen());

        let ctx = Context::new(specs, coordinator.token(), help, self.console.clone());
        let result = handler.invoke(ctx, origin).await;

        if let Some(listener) = listener {
            listener.abort();
        }

        match result {
            Ok(code) => Ok(code),
            Err(fault) => {
                tracing::warn!(origin, "{}", fault);
                self.console.error(fault.to_string());
                Ok(1)
            }
        }
    }

    /// Parse `args` and, when parsing does not end the run, execute.
    pub async fn run(&mut self, args: &[String]) -> Result<i32, DefinitionError> {
        self.run_inner(args, None).await
    }

    /// Like [`run`](Self::run), with handler cancellation also driven by `token`.
    pub async fn run_with_cancellation(
        &mut self,
        args: &[String],
        token: CancellationToken,
    ) -> Result<i32, DefinitionError> {
        self.run_inner(args, Some(token)).await
    }

    async fn run_inner(&mut self, args: &[String], token: Option<CancellationToken>) -> Result<i32, DefinitionError> {
        match self.parse(args)? {
            ParseOutcome::Exit(code) => Ok(code),
            ParseOutcome::Proceed => self.execute(token).await,
        }
    }
}
