//! The command application: configuration, runs and failure policy.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use command_tree_core::{
    Binder, CommandBuilder, CommandError, CommandTree, ConfigurationError, ConverterRegistry,
    EmptySettings, NoServices, RuntimeError, ServiceResolver, SettingsType, Tokenizer,
    TreeBuilder, TreeResolver, validate_default_assignment, validate_examples,
};
use tracing::{debug, info, warn};

use crate::builtins;
use crate::cancel::CancellationToken;
use crate::command::{BoxFuture, Handler};
use crate::config::AppSettings;
use crate::configurator::Configurator;
use crate::context::CommandContext;
use crate::interceptor::Interceptor;
use crate::introspect::{Introspector, JsonIntrospector};
use crate::pipeline::{self, Execution, Stage};
use crate::report::{ErrorReporter, TracingReporter};

type SyncHandler = Arc<dyn Fn(&CommandError, &dyn ServiceResolver) -> i32 + Send + Sync>;
type AsyncHandler = Arc<
    dyn for<'a> Fn(&'a CommandError, &'a dyn ServiceResolver, &'a CancellationToken) -> BoxFuture<'a, i32>
        + Send
        + Sync,
>;

#[derive(Clone)]
enum ExceptionHandler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

/// Builder for a [`CommandApp`].
pub struct CommandAppBuilder {
    root: CommandBuilder<Handler>,
    settings: AppSettings,
    converters: ConverterRegistry,
    interceptors: Vec<Arc<dyn Interceptor>>,
    services: Arc<dyn ServiceResolver>,
    exception_handler: Option<ExceptionHandler>,
    reporter: Arc<dyn ErrorReporter>,
    introspector: Arc<dyn Introspector>,
}

impl CommandAppBuilder {
    fn new(name: &str) -> Self {
        Self {
            root: CommandBuilder::branch(name),
            settings: AppSettings::default(),
            converters: ConverterRegistry::new(),
            interceptors: Vec::new(),
            services: Arc::new(NoServices),
            exception_handler: None,
            reporter: Arc::new(TracingReporter),
            introspector: Arc::new(JsonIntrospector::default()),
        }
    }

    /// Registers commands on the root of the tree.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut Configurator<'_>),
    {
        configure(&mut Configurator::new(&mut self.root));
        self
    }

    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers a converter for a custom parameter value type.
    pub fn with_converter<T, F>(mut self, convert: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        self.converters.register(convert);
        self
    }

    /// Appends an interceptor; interceptors run in registration order.
    pub fn with_interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Sets the resolver used to create settings instances.
    pub fn with_services<R: ServiceResolver + 'static>(mut self, services: R) -> Self {
        self.services = Arc::new(services);
        self
    }

    /// Handles failures with a synchronous callback returning the exit code.
    pub fn with_exception_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandError, &dyn ServiceResolver) -> i32 + Send + Sync + 'static,
    {
        self.exception_handler = Some(ExceptionHandler::Sync(Arc::new(handler)));
        self
    }

    /// Handles failures with an asynchronous callback returning the exit code.
    pub fn with_async_exception_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(
                &'a CommandError,
                &'a dyn ServiceResolver,
                &'a CancellationToken,
            ) -> BoxFuture<'a, i32>
            + Send
            + Sync
            + 'static,
    {
        self.exception_handler = Some(ExceptionHandler::Async(Arc::new(handler)));
        self
    }

    /// Sets where the built-in commands write their output.
    pub fn with_introspector<I: Introspector + 'static>(mut self, introspector: I) -> Self {
        self.introspector = Arc::new(introspector);
        self
    }

    /// Sets how unhandled failures are reported.
    pub fn with_reporter<R: ErrorReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Adds the built-in commands and finalizes the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for any structural defect, for a
    /// default value a command's settings type does not accept, or for an
    /// example that does not parse when example validation is enabled.
    pub fn build(self) -> Result<CommandApp, ConfigurationError> {
        let mut root = self.root;
        let name = self
            .settings
            .application_name
            .clone()
            .unwrap_or_else(|| root.name().to_string());
        let version = self
            .settings
            .application_version
            .clone()
            .unwrap_or_else(|| "?".to_string());
        root.push_child(builtins::branch(
            Arc::clone(&self.introspector),
            name,
            version,
            self.settings.case_sensitivity,
        ));

        let tree = TreeBuilder::new(root)
            .case_sensitivity(self.settings.case_sensitivity)
            .with_converters(self.converters)
            .build()?;

        if let Some(error) = validate_default_assignment(&tree).into_iter().next() {
            return Err(error);
        }

        if self.settings.validate_examples {
            let errors = validate_examples(&tree, &self.settings.parser_settings());
            if let Some(error) = errors.into_iter().next() {
                return Err(error);
            }
        }

        info!(
            application = tree.node(tree.root()).name(),
            commands = tree.len(),
            "command application built"
        );
        Ok(CommandApp {
            tree: Arc::new(tree),
            settings: self.settings,
            interceptors: self.interceptors,
            services: self.services,
            exception_handler: self.exception_handler,
            reporter: self.reporter,
        })
    }
}

impl fmt::Debug for CommandAppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandAppBuilder")
            .field("root", &self.root.name())
            .field("settings", &self.settings)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// A configured command-line application.
///
/// The tree is immutable once built, so one application can serve any
/// number of concurrent runs.
///
/// # Examples
///
/// ```
/// use command_tree::{CancellationToken, CommandApp, CommandContext, EmptySettings};
///
/// let app = CommandApp::builder("app")
///     .configure(|config| {
///         config.add_delegate("hello", |_ctx: &CommandContext, _settings: &EmptySettings| 7);
///     })
///     .build()
///     .unwrap();
///
/// let code = tokio_test::block_on(app.run(&["hello"], CancellationToken::new())).unwrap();
/// assert_eq!(code, 7);
/// ```
#[derive(Clone)]
pub struct CommandApp {
    tree: Arc<CommandTree<Handler>>,
    settings: AppSettings,
    interceptors: Vec<Arc<dyn Interceptor>>,
    services: Arc<dyn ServiceResolver>,
    exception_handler: Option<ExceptionHandler>,
    reporter: Arc<dyn ErrorReporter>,
}

impl CommandApp {
    pub fn builder(name: &str) -> CommandAppBuilder {
        CommandAppBuilder::new(name)
    }

    pub fn tree(&self) -> &CommandTree<Handler> {
        &self.tree
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Parses, binds and executes `args`, returning every failure.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] of the first failing stage.
    pub async fn execute<S: AsRef<str>>(
        &self,
        args: &[S],
        cancellation: CancellationToken,
    ) -> Result<Execution, CommandError> {
        let parser_settings = self.settings.parser_settings();
        let tokens = Tokenizer::new(&parser_settings).tokenize(args)?;
        debug!(stage = %Stage::Tokenized, tokens = tokens.len(), "arguments tokenized");

        let resolution =
            TreeResolver::new(&*self.tree, parser_settings.case_sensitivity).resolve(&tokens)?;
        let target = resolution.target;
        debug!(stage = %Stage::Resolved, command = %self.tree.display_path(target), "command resolved");

        let binding = Binder::new(&*self.tree, &parser_settings).bind(target, &resolution.residual)?;
        debug!(stage = %Stage::Bound, bound = binding.values.len(), "arguments bound");

        let node = self.tree.node(target);
        let Some(command) = node.handler().cloned() else {
            return Err(RuntimeError::MissingHandler {
                command: self.tree.display_path(target),
            }
            .into());
        };
        let settings_type = node
            .settings_type()
            .copied()
            .unwrap_or_else(SettingsType::of::<EmptySettings>);
        let mut settings = binding.instantiate(&settings_type, self.services.as_ref())?;

        let context = CommandContext::new(
            Arc::clone(&self.tree),
            target,
            resolution.path,
            binding.remaining,
            cancellation,
        );
        let exit_code =
            pipeline::run(&self.interceptors, command.as_ref(), &context, settings.as_mut()).await?;

        debug!(stage = %Stage::Done, exit_code, "run complete");
        Ok(Execution {
            exit_code,
            context,
            settings,
        })
    }

    /// Runs `args` (program name excluded) and returns the exit code.
    ///
    /// Failures are returned unchanged when `propagate_exceptions` is set,
    /// passed to the exception handler when one is configured, and otherwise
    /// reported and mapped to `-1`.
    ///
    /// # Errors
    ///
    /// Only when `propagate_exceptions` is set.
    pub async fn run<S: AsRef<str>>(
        &self,
        args: &[S],
        cancellation: CancellationToken,
    ) -> Result<i32, CommandError> {
        match self.execute(args, cancellation.clone()).await {
            Ok(execution) => {
                info!(exit_code = execution.exit_code, command = %execution.context.command_path(), "command completed");
                Ok(execution.exit_code)
            }
            Err(error) => self.handle_failure(error, &cancellation).await,
        }
    }

    /// Runs `args` on a new multi-threaded runtime.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Executor`] if the runtime cannot start, and
    /// otherwise behaves like [`run`](CommandApp::run).
    pub fn run_blocking<S: AsRef<str>>(&self, args: &[S]) -> Result<i32, CommandError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(RuntimeError::Executor)?;
        runtime.block_on(self.run(args, CancellationToken::new()))
    }

    pub(crate) async fn handle_failure(
        &self,
        error: CommandError,
        cancellation: &CancellationToken,
    ) -> Result<i32, CommandError> {
        if self.settings.propagate_exceptions {
            return Err(error);
        }

        match &self.exception_handler {
            Some(ExceptionHandler::Sync(handler)) => {
                warn!(kind = ?error.kind(), "{error}");
                Ok(handler(&error, self.services.as_ref()))
            }
            Some(ExceptionHandler::Async(handler)) => {
                warn!(kind = ?error.kind(), "{error}");
                Ok(handler(&error, self.services.as_ref(), cancellation).await)
            }
            None => {
                self.reporter.report(&error);
                Ok(-1)
            }
        }
    }
}

impl fmt::Debug for CommandApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandApp")
            .field("tree", &self.tree)
            .field("settings", &self.settings)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}
