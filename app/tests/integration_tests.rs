use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use command_tree::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
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
        vec![ParameterSpec::flag("verbose").with_short('v')]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        if self.assign_field(parameter, value)? {
            Ok(())
        } else {
            Err(AssignError::UnknownParameter(parameter.to_string()))
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct MigrateSettings {
    db: DbSettings,
    target: Option<i64>,
    dry_run: bool,
}

impl Settings for MigrateSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::optional("target", ValueKind::Integer),
            ParameterSpec::flag("dry_run").with_long("dry-run"),
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
            Some(target) if target < 0 => ValidationResult::error("target must not be negative"),
            _ => ValidationResult::success(),
        }
    }
}

struct Migrate;

#[async_trait]
impl Command for Migrate {
    type Settings = MigrateSettings;

    fn validate(&self, _context: &CommandContext, settings: &MigrateSettings) -> ValidationResult {
        if settings.dry_run && settings.target.is_none() {
            return ValidationResult::error("--dry-run needs a target");
        }
        ValidationResult::success()
    }

    async fn execute(&self, _context: &CommandContext, settings: &MigrateSettings) -> CommandResult {
        Ok(settings.target.map_or(0, |target| target as i32))
    }
}

struct Status;

#[async_trait]
impl Command for Status {
    type Settings = DbSettings;

    async fn execute(&self, _context: &CommandContext, settings: &DbSettings) -> CommandResult {
        Ok(if settings.verbose { 2 } else { 1 })
    }
}

struct Fail;

#[async_trait]
impl Command for Fail {
    type Settings = EmptySettings;

    async fn execute(&self, _context: &CommandContext, _settings: &EmptySettings) -> CommandResult {
        Err("boom".into())
    }
}

struct Sleep;

#[async_trait]
impl Command for Sleep {
    type Settings = EmptySettings;

    async fn execute(&self, _context: &CommandContext, _settings: &EmptySettings) -> CommandResult {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(0)
    }
}

fn builder() -> CommandAppBuilder {
    CommandApp::builder("app").configure(|config| {
        config.add_branch_with::<DbSettings, _>("db", |db| {
            db.add_command("migrate", Migrate).with_alias("up");
            db.set_default_command(Status);
        });
        config.add_command("fail", Fail);
        config.add_command("sleep", Sleep);
        config
            .add_delegate("echo", |ctx: &CommandContext, _s: &EmptySettings| {
                ctx.remaining().len() as i32
            })
            .with_data("echo-data");
        config.add_async_delegate("wait", |ctx: &CommandContext, _s: &EmptySettings| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                Ok(ctx.path().len() as i32)
            })
        });
    })
}

fn tester(builder: CommandAppBuilder) -> CommandAppTester {
    CommandAppTester::new(builder.build().unwrap())
}

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Recording {
    name: &'static str,
    log: Log,
    result: Option<i32>,
}

impl Interceptor for Recording {
    fn intercept(
        &self,
        _context: &CommandContext,
        _settings: &mut dyn Settings,
    ) -> Result<(), BoxError> {
        self.log.push(format!("{}:intercept", self.name));
        Ok(())
    }

    fn intercept_result(&self, _context: &CommandContext, _settings: &dyn Settings, result: &mut i32) {
        self.log.push(format!("{}:result:{}", self.name, result));
        if let Some(code) = self.result {
            *result = code;
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution, binding and settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_default_command_receives_inherited_flag() {
    let tester = tester(builder());
    let result = tester.run(&["db", "--verbose"]).await.unwrap();

    assert_eq!(result.exit_code, 2);
    assert_eq!(result.settings_as::<DbSettings>(), Some(&DbSettings { verbose: true }));
    assert_eq!(result.context.path(), vec!["app", "db", "__default_command"]);
    assert_eq!(result.context.command_path(), "app db");
}

#[tokio::test]
async fn test_leaf_settings_compose_branch_settings() {
    let tester = tester(builder());
    let result = tester.run(&["db", "up", "-v", "7"]).await.unwrap();

    assert_eq!(result.exit_code, 7);
    let settings = result.settings_as::<MigrateSettings>().unwrap();
    assert!(settings.db.verbose);
    assert_eq!(settings.target, Some(7));
    assert_eq!(result.context.name(), "migrate");
}

#[tokio::test]
async fn test_remaining_and_data_exposed_on_context() {
    let tester = tester(builder());
    let result = tester.run(&["echo", "--", "a", "b", "c"]).await.unwrap();

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.context.remaining(), ["a", "b", "c"].map(String::from));
    assert_eq!(result.context.data_as::<&str>(), Some(&"echo-data"));
}

#[tokio::test]
async fn test_async_delegate() {
    let tester = tester(builder());
    let result = tester.run(&["wait"]).await.unwrap();
    assert_eq!(result.exit_code, 2);
}

#[tokio::test]
async fn test_settings_resolved_from_services() {
    let mut services = ServiceRegistry::new();
    services.register_instance(MigrateSettings {
        target: Some(3),
        ..MigrateSettings::default()
    });
    let tester = tester(builder().with_services(services));

    let result = tester.run(&["db", "migrate"]).await.unwrap();
    assert_eq!(result.exit_code, 3);

    let result = tester.run(&["db", "migrate", "5"]).await.unwrap();
    assert_eq!(result.exit_code, 5);
}

#[tokio::test]
async fn test_resolved_only_settings_unavailable() {
    let tester = tester(CommandApp::builder("app").configure(|config| {
        config.add_resolved_command("migrate", Migrate);
    }));

    let err = tester.run(&["migrate"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(matches!(
        err,
        CommandError::Runtime(RuntimeError::SettingsUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_custom_converter_registered_on_app() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Port(u16);

    #[derive(Debug, Default)]
    struct ServeSettings {
        port: Option<u16>,
    }

    impl Settings for ServeSettings {
        fn parameters() -> Vec<ParameterSpec> {
            vec![ParameterSpec::option("port", ValueKind::Custom(CustomType::of::<Port>())).with_short('p')]
        }

        fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
            match parameter {
                "port" => self.port = value.downcast_ref::<Port>().map(|port| port.0),
                other => return Err(AssignError::UnknownParameter(other.to_string())),
            }
            Ok(())
        }
    }

    let app = CommandApp::builder("app")
        .with_converter(|raw: &str| {
            raw.parse::<u16>()
                .map(Port)
                .map_err(|_| format!("'{raw}' is not a port"))
        })
        .configure(|config| {
            config.add_delegate("serve", |_ctx: &CommandContext, s: &ServeSettings| {
                i32::from(s.port.unwrap_or(0))
            });
        });
    let tester = tester(app);

    assert_eq!(tester.run(&["serve", "-p", "8080"]).await.unwrap().exit_code, 8080);

    let err = tester.run(&["serve", "-p", "http"]).await.unwrap_err();
    assert_eq!(err.offending(), Some("port"));
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_interceptors_run_in_registration_order() {
    let log = Log::default();
    let tester = tester(
        builder()
            .with_interceptor(Recording {
                name: "I1",
                log: log.clone(),
                result: Some(10),
            })
            .with_interceptor(Recording {
                name: "I2",
                log: log.clone(),
                result: Some(20),
            }),
    );

    let result = tester.run(&["db"]).await.unwrap();

    assert_eq!(
        log.entries(),
        vec!["I1:intercept", "I2:intercept", "I1:result:1", "I2:result:10"]
    );
    assert_eq!(result.exit_code, 20);
}

#[tokio::test]
async fn test_interceptor_can_mutate_settings() {
    let tester = tester(builder().with_interceptor(CallbackInterceptor::new().on_intercept(
        |_ctx, settings| {
            if let Some(settings) = settings.downcast_mut::<DbSettings>() {
                settings.verbose = true;
            }
        },
    )));

    let result = tester.run(&["db"]).await.unwrap();
    assert_eq!(result.exit_code, 2);
}

#[tokio::test]
async fn test_settings_validation_runs_before_command_validation() {
    let log = Log::default();
    let tester = tester(builder().with_interceptor(Recording {
        name: "I1",
        log: log.clone(),
        result: None,
    }));

    let err = tester.run(&["db", "migrate", "--", "-3"]).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Validation(ValidationError { scope: ValidationScope::Settings, ref message })
            if message == "target must not be negative"
    ));

    let err = tester.run(&["db", "migrate", "--dry-run"]).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Validation(ValidationError { scope: ValidationScope::Command, .. })
    ));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_command_failure_is_runtime_error() {
    let tester = tester(builder());
    let err = tester.run(&["fail"]).await.unwrap_err();

    assert!(matches!(
        err,
        CommandError::Runtime(RuntimeError::CommandFailed { ref command, .. }) if command == "app fail"
    ));
    assert_eq!(err.to_string(), "command 'app fail' failed: boom");
}

#[tokio::test]
async fn test_cancellation_stops_running_command() {
    let token = CancellationToken::new();
    let tester = tester(builder()).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let err = tokio::time::timeout(Duration::from_secs(5), tester.run(&["sleep"]))
        .await
        .unwrap()
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(
        err,
        CommandError::Runtime(RuntimeError::Cancelled { .. })
    ));
}

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unhandled_failure_reported_as_minus_one() {
    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<ErrorKind>>>);

    impl ErrorReporter for Collect {
        fn report(&self, error: &CommandError) {
            self.0.lock().unwrap().push(error.kind());
        }
    }

    let reported = Collect::default();
    let tester = tester(builder().with_reporter(reported.clone()));

    assert_eq!(tester.run_to_exit_code(&["nope"]).await.unwrap(), -1);
    assert_eq!(tester.run_to_exit_code(&["fail"]).await.unwrap(), -1);
    assert_eq!(
        *reported.0.lock().unwrap(),
        vec![ErrorKind::Parse, ErrorKind::Runtime]
    );
}

#[tokio::test]
async fn test_propagate_exceptions_returns_error() {
    let settings = AppSettings {
        propagate_exceptions: true,
        ..AppSettings::default()
    };
    let tester = tester(builder().with_settings(settings));

    let err = tester.run_to_exit_code(&["db", "nope"]).await.unwrap_err();
    assert!(matches!(err, CommandError::Parse(ParseError::UnexpectedArgument { .. })));
}

#[tokio::test]
async fn test_sync_exception_handler_sets_exit_code() {
    let tester = tester(builder().with_exception_handler(|error, _services| match error.kind() {
        ErrorKind::Parse => 64,
        _ => 70,
    }));

    assert_eq!(tester.run_to_exit_code(&["--bogus"]).await.unwrap(), 64);
    assert_eq!(tester.run_to_exit_code(&["fail"]).await.unwrap(), 70);
}

#[tokio::test]
async fn test_async_exception_handler_sees_cancellation() {
    let tester = tester(builder().with_async_exception_handler(|error, _services, cancellation| {
        Box::pin(async move {
            tokio::task::yield_now().await;
            if cancellation.is_cancelled() {
                130
            } else {
                error.to_string().len() as i32
            }
        })
    }));

    let code = tester.run_to_exit_code(&["fail"]).await.unwrap();
    assert_eq!(code, "command 'app fail' failed: boom".len() as i32);
}

// ---------------------------------------------------------------------------
// Configuration and built-ins
// ---------------------------------------------------------------------------

#[test]
fn test_invalid_example_rejected_when_validation_enabled() {
    fn configure(config: &mut Configurator<'_>) {
        config
            .add_command("fail", Fail)
            .with_example(["fail", "--force"]);
    }
    let settings = AppSettings {
        validate_examples: true,
        ..AppSettings::default()
    };

    assert!(CommandApp::builder("app").configure(configure).build().is_ok());
    let err = CommandApp::builder("app")
        .with_settings(settings)
        .configure(configure)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidExample { .. }));
}

#[test]
fn test_duplicate_command_rejected_at_build() {
    let err = CommandApp::builder("app")
        .configure(|config| {
            config.add_command("fail", Fail);
            config.add_command("sleep", Sleep).with_alias("fail");
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::DuplicateCommand { .. }));
}

#[test]
fn test_inherited_default_rejected_by_settings_at_build() {
    let err = CommandApp::builder("app")
        .configure(|config| {
            config.add_parameter(
                ParameterSpec::option("profile", ValueKind::String).with_default("dev"),
            );
            config.add_command("fail", Fail);
        })
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigurationError::UnassignableDefault { ref command, ref parameter, .. }
            if command == "app fail" && parameter == "profile"
    ));
}

#[tokio::test]
async fn test_builtins_accept_inherited_root_defaults() {
    #[derive(Debug, Default)]
    struct ProfileSettings {
        profile: String,
    }

    impl Settings for ProfileSettings {
        fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
            match parameter {
                "profile" => self.profile = value.into_typed()?,
                other => return Err(AssignError::UnknownParameter(other.to_string())),
            }
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let tester = tester(
        CommandApp::builder("app")
            .with_introspector(JsonIntrospector::new(buffer.clone()))
            .configure(|config| {
                config.add_parameter(
                    ParameterSpec::option("profile", ValueKind::String).with_default("dev"),
                );
                config.add_delegate("show", |_ctx: &CommandContext, s: &ProfileSettings| {
                    s.profile.len() as i32
                });
            }),
    );

    assert_eq!(tester.run(&["show", "--profile", "prod"]).await.unwrap().exit_code, 4);
    assert_eq!(tester.run(&["cli", "version"]).await.unwrap().exit_code, 0);
    assert_eq!(buffer.contents(), "app ?\n");
}

#[tokio::test]
async fn test_builtin_commands_write_through_introspector() {
    let buffer = Buffer::default();
    let settings = AppSettings {
        application_name: Some("demo".into()),
        application_version: Some("1.2.3".into()),
        ..AppSettings::default()
    };
    let tester = tester(
        builder()
            .with_settings(settings)
            .with_introspector(JsonIntrospector::new(buffer.clone())),
    );

    assert_eq!(tester.run(&["cli", "version"]).await.unwrap().exit_code, 0);
    assert_eq!(buffer.contents(), "demo 1.2.3\n");

    let result = tester.run(&["cli", "explain", "db", "-d"]).await.unwrap();
    assert!(result.settings_as::<ExplainSettings>().unwrap().detailed);
    let explained = buffer.contents();
    let json = explained.trim_start_matches("demo 1.2.3\n");
    let model: CommandModel = serde_json::from_str(json).unwrap();
    assert_eq!(model.name, "db");
    assert_eq!(model.parameters.len(), 1);
    assert!(model.children.iter().any(|child| child.name == "migrate"));
    assert_eq!(model.children.len(), 1);
}

#[tokio::test]
async fn test_builtin_branch_is_hidden() {
    let buffer = Buffer::default();
    let tester = tester(builder().with_introspector(JsonIntrospector::new(buffer.clone())));

    tester.run(&["cli", "xmldoc"]).await.unwrap();
    let model: CommandModel = serde_json::from_str(&buffer.contents()).unwrap();
    assert!(model.find_child("cli").is_none());
    assert!(model.find_child("db").is_some());

    let err = tester.run(&["cli", "explain", "missing"]).await.unwrap_err();
    assert!(matches!(err, CommandError::Runtime(RuntimeError::CommandFailed { .. })));
}

#[test]
fn test_run_blocking() {
    let app = builder().build().unwrap();
    assert_eq!(app.run_blocking(&["db", "-v"]).unwrap(), 2);
}
