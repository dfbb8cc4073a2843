//! Command application runtime.
//!
//! Builds on `command-tree-core` to run commands:
//!
//! - [`CommandApp`] owns the finished tree and global [`AppSettings`], and
//!   runs argument vectors to exit codes.
//! - [`Command`] is implemented by typed commands; [`DelegateCommand`] and
//!   [`AsyncDelegateCommand`] wrap closures.
//! - [`Interceptor`]s run before and after every command, in registration
//!   order.
//! - Failures are propagated, passed to an exception handler, or reported
//!   through an [`ErrorReporter`] and mapped to `-1`.
//! - A hidden `cli` branch provides `version`, `explain` and `xmldoc`, whose
//!   output goes to an [`Introspector`].
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use command_tree::*;
//!
//! #[derive(Debug, Default)]
//! struct AddSettings {
//!     numbers: Vec<i64>,
//! }
//!
//! impl Settings for AddSettings {
//!     fn parameters() -> Vec<ParameterSpec> {
//!         vec![ParameterSpec::required("numbers", ValueKind::Integer).allow_multiple()]
//!     }
//!
//!     fn assign(&mut self, parameter: &str, value: Value) -> std::result::Result<(), AssignError> {
//!         match parameter {
//!             "numbers" => self.numbers = value.into_typed()?,
//!             other => return Err(AssignError::UnknownParameter(other.to_string())),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct Add;
//!
//! #[async_trait]
//! impl Command for Add {
//!     type Settings = AddSettings;
//!
//!     async fn execute(&self, _ctx: &CommandContext, settings: &AddSettings) -> CommandResult {
//!         Ok(settings.numbers.iter().sum::<i64>() as i32)
//!     }
//! }
//!
//! let app = CommandApp::builder("calc")
//!     .configure(|config| {
//!         config.add_command("add", Add).with_description("Adds numbers");
//!     })
//!     .build()
//!     .unwrap();
//!
//! let code = tokio_test::block_on(app.run(&["add", "10", "-4"], CancellationToken::new()));
//! assert_eq!(code.unwrap(), 6);
//! ```

mod app;
mod builtins;
mod cancel;
mod command;
mod config;
mod configurator;
mod context;
mod interceptor;
mod introspect;
mod pipeline;
mod report;
mod testing;

pub use app::{CommandApp, CommandAppBuilder};
pub use builtins::{BUILTIN_BRANCH, ExplainSettings};
pub use cancel::CancellationToken;
pub use command::{
    AsyncDelegateCommand, BoxFuture, Command, CommandResult, DelegateCommand, DynCommand, Handler,
};
pub use config::AppSettings;
pub use configurator::{CommandConfigurator, Configurator};
pub use context::CommandContext;
pub use interceptor::{CallbackInterceptor, Interceptor};
pub use introspect::{Introspector, JsonIntrospector};
pub use pipeline::{Execution, Stage};
pub use report::{ErrorReporter, TracingReporter};
pub use testing::{CommandAppResult, CommandAppTester};

pub use command_tree_core::{
    AssignError, BoundValues, BoxError, CaseSensitivity, CommandError, CommandKind,
    CommandModel, ConfigurationError, CustomType, DuplicateOptionPolicy, EmptySettings,
    ErrorKind, FromValue, NoServices, ParameterKind, ParameterSpec, ParseError, RuntimeError,
    ServiceRegistry, ServiceResolver, Settings, SettingsType, ValidationError,
    ValidationResult, ValidationScope, Value, ValueArity, ValueKind,
};
