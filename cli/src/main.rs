use async_trait::async_trait;
use command_tree::{
    AppSettings, AssignError, CallbackInterceptor, CancellationToken, Command, CommandApp,
    CommandContext, CommandResult, Configurator, EmptySettings, ParameterSpec, Settings,
    ValidationResult, Value, ValueKind,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings of `greet`.
#[derive(Debug, Default)]
struct GreetSettings {
    name: String,
    shout: bool,
    times: i64,
}

impl Settings for GreetSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("name", ValueKind::String).with_description("Who to greet"),
            ParameterSpec::flag("shout")
                .with_short('s')
                .with_description("Print the greeting in upper case"),
            ParameterSpec::option("times", ValueKind::Integer)
                .with_short('n')
                .with_default("1")
                .with_description("How many times to greet"),
        ]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        match parameter {
            "name" => self.name = value.into_typed()?,
            "shout" => self.shout = value.into_typed()?,
            "times" => self.times = value.into_typed()?,
            other => return Err(AssignError::UnknownParameter(other.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> ValidationResult {
        if self.times < 1 {
            return ValidationResult::error("--times must be at least 1");
        }
        ValidationResult::success()
    }
}

struct Greet;

#[async_trait]
impl Command for Greet {
    type Settings = GreetSettings;

    async fn execute(&self, _context: &CommandContext, settings: &GreetSettings) -> CommandResult {
        let mut greeting = format!("Hello, {}!", settings.name);
        if settings.shout {
            greeting = greeting.to_uppercase();
        }
        for _ in 0..settings.times {
            println!("{greeting}");
        }
        Ok(0)
    }
}

/// Options shared by every `db` command.
#[derive(Debug, Default)]
struct DbSettings {
    verbose: bool,
}

impl DbSettings {
    fn assign_field(&mut self, parameter: &str, value: Value) -> Result<bool, AssignError> {
        match parameter {
            "verbose" => self.verbose = value.into_typed()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Settings for DbSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::flag("verbose")
                .with_short('v')
                .with_description("Report every step"),
        ]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        if self.assign_field(parameter, value)? {
            Ok(())
        } else {
            Err(AssignError::UnknownParameter(parameter.to_string()))
        }
    }
}

#[derive(Debug, Default)]
struct MigrateSettings {
    db: DbSettings,
    target: Option<i64>,
    dry_run: bool,
}

impl Settings for MigrateSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::optional("target", ValueKind::Integer)
                .with_description("Schema version to migrate to"),
            ParameterSpec::flag("dry_run")
                .with_long("dry-run")
                .with_description("Show the plan without applying it"),
        ]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        if self.db.assign_field(parameter, value.clone())? {
            return Ok(());
        }
        match parameter {
            "target" => self.target = value.into_typed()?,
            "dry_run" => self.dry_run = value.into_typed()?,
            other => return Err(AssignError::UnknownParameter(other.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> ValidationResult {
        match self.target {
            Some(target) if target < 0 => ValidationResult::error("target version must not be negative"),
            _ => ValidationResult::success(),
        }
    }
}

struct Migrate;

#[async_trait]
impl Command for Migrate {
    type Settings = MigrateSettings;

    async fn execute(&self, _context: &CommandContext, settings: &MigrateSettings) -> CommandResult {
        let target = settings
            .target
            .map_or_else(|| "latest".to_string(), |t| t.to_string());
        if settings.db.verbose {
            println!("planning migration to {target}");
        }
        if settings.dry_run {
            println!("would migrate to {target}");
        } else {
            println!("migrated to {target}");
        }
        Ok(0)
    }
}

struct Status;

#[async_trait]
impl Command for Status {
    type Settings = DbSettings;

    async fn execute(&self, context: &CommandContext, settings: &DbSettings) -> CommandResult {
        println!("database is up to date");
        if settings.verbose {
            println!("resolved as '{}'", context.command_path());
        }
        Ok(0)
    }
}

#[derive(Debug, Default)]
struct AddSettings {
    numbers: Vec<f64>,
}

impl Settings for AddSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("numbers", ValueKind::Float)
                .allow_multiple()
                .with_description("Numbers to add"),
        ]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        match parameter {
            "numbers" => self.numbers = value.into_typed()?,
            other => return Err(AssignError::UnknownParameter(other.to_string())),
        }
        Ok(())
    }
}

fn configure(config: &mut Configurator<'_>) {
    config
        .add_command("greet", Greet)
        .with_alias("hello")
        .with_description("Greets someone")
        .with_example(["greet", "world"])
        .with_example(["greet", "world", "--shout", "-n", "3"]);

    config
        .add_branch_with::<DbSettings, _>("db", |db| {
            db.add_command("migrate", Migrate)
                .with_description("Applies schema migrations")
                .with_example(["db", "migrate", "7", "--dry-run"]);
            db.set_default_command(Status)
                .with_description("Shows the schema status");
        })
        .with_description("Database maintenance")
        .with_example(["db", "-v"]);

    config
        .add_async_delegate("add", |_ctx: &CommandContext, settings: &AddSettings| {
            Box::pin(async move {
                let sum: f64 = settings.numbers.iter().sum();
                println!("{sum}");
                Ok(0)
            })
        })
        .with_description("Adds numbers")
        .with_example(["add", "1", "2.5", "-3"]);

    config
        .add_delegate("echo", |ctx: &CommandContext, _settings: &EmptySettings| {
            println!("{}", ctx.remaining().join(" "));
            0
        })
        .with_description("Prints the arguments after --")
        .with_example(["echo", "--", "a", "b"]);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let settings = AppSettings {
        application_name: Some("tree-demo".to_string()),
        application_version: Some(PACKAGE_VERSION.to_string()),
        validate_examples: true,
        ..AppSettings::default()
    };
    let app = CommandApp::builder("tree-demo")
        .with_settings(settings)
        .with_interceptor(
            CallbackInterceptor::new()
                .on_intercept(|ctx, _settings| debug!(command = %ctx.command_path(), "starting"))
                .on_result(|ctx, _settings, code| {
                    info!(command = %ctx.command_path(), exit_code = *code, "finished");
                }),
        )
        .configure(configure)
        .build();

    let app = match app {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cancellation = CancellationToken::new();
    let on_ctrl_c = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    match app.run(&args, cancellation).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
