use cliframe::args::Preprocess;
use cliframe::logging::init_tracing;
use cliframe::{App, AppSettings, ArgSpec, Command, Constraint, Context, Handler};

const APP_NAME: &str = "cliframe";

fn greet() -> Result<Command, cliframe::DefinitionError> {
    let command = Command::with_arguments(
        "greet",
        [
            ArgSpec::positional("yourName")
                .required()
                .help("The name of the user")
                .constraint(Constraint::NotEmptyOrWhiteSpace),
            ArgSpec::switch_named("l", "loud").help("Shout the greeting"),
            ArgSpec::option("g", "greeting")
                .help("Greeting word")
                .default_value("Hello"),
        ],
        Handler::sync(|ctx: Context| {
            let name = ctx.require("yourName")?;
            let greeting = ctx
                .option_value("greeting")
                .map(|v| v.to_string())
                .unwrap_or_default();
            let mut text = format!("{}, {}!", greeting, name);
            if ctx.is_set("loud") {
                text = text.to_uppercase();
            }
            ctx.console().line(text);
            Ok(0)
        }),
    )?;
    Ok(command.title("Greet someone"))
}

fn double() -> Result<Command, cliframe::DefinitionError> {
    let command = Command::with_arguments(
        "double",
        [ArgSpec::positional("number")
            .required()
            .help("The number to double")
            .constraint(Constraint::IsInteger)],
        Handler::sync(|ctx: Context| {
            let number = ctx.require("number")?.as_int()?;
            ctx.console().line((number * 2).to_string());
            Ok(0)
        }),
    )?;
    Ok(command.title("Double a number"))
}

fn sum() -> Result<Command, cliframe::DefinitionError> {
    let command = Command::with_arguments(
        "sum",
        [ArgSpec::option("n", "number")
            .help("A number to add; repeat for more")
            .constraint(Constraint::IsInteger)],
        Handler::asynchronous(|ctx: Context| async move {
            let mut total: i64 = 0;
            for value in ctx.option_values("number") {
                ctx.check_cancelled()?;
                total += value.as_int()?;
                tokio::task::yield_now().await;
            }
            ctx.console().line(total.to_string());
            anyhow::Ok(0)
        }),
    )?;
    Ok(command.title("Add numbers"))
}

fn path() -> Result<Command, cliframe::DefinitionError> {
    let command = Command::with_arguments(
        "path",
        [ArgSpec::positional("dir")
            .help("Directory to resolve")
            .default_value(".")
            .preprocess(Preprocess::EXPAND_ENV | Preprocess::ABSOLUTE_PATH)
            .constraint(Constraint::DirectoryExists)],
        Handler::sync(|ctx: Context| {
            let dir = ctx.require("dir")?;
            ctx.console().line(dir.to_string());
            Ok(0)
        }),
    )?;
    Ok(command.title("Resolve a directory path"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::load(APP_NAME)?;
    init_tracing(settings.log_filter.as_deref().unwrap_or("warn"));

    let mut app = App::with_commands(cliframe::entry_info!(), [greet()?, double()?, sum()?, path()?])?
        .title("Command-line toolkit demo")
        .with_settings(settings);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = app.run(&args).await?;
    std::process::exit(code);
}
