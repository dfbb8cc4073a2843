//! Helpers for testing command applications.

use command_tree_core::{CommandError, Settings};

use crate::app::CommandApp;
use crate::cancel::CancellationToken;
use crate::context::CommandContext;
use crate::pipeline::Execution;

/// Outcome of a run through [`CommandAppTester`].
#[derive(Debug)]
pub struct CommandAppResult {
    pub exit_code: i32,
    pub context: CommandContext,
    pub settings: Box<dyn Settings>,
}

impl CommandAppResult {
    /// The bound settings as `T`.
    pub fn settings_as<T: Settings>(&self) -> Option<&T> {
        self.settings.downcast_ref::<T>()
    }
}

impl From<Execution> for CommandAppResult {
    fn from(execution: Execution) -> Self {
        Self {
            exit_code: execution.exit_code,
            context: execution.context,
            settings: execution.settings,
        }
    }
}

/// Runs a [`CommandApp`] and exposes the context and settings of each run.
///
/// # Examples
///
/// ```
/// use command_tree::{CommandApp, CommandAppTester, CommandContext, EmptySettings};
///
/// let app = CommandApp::builder("app")
///     .configure(|config| {
///         config.add_delegate("ok", |_ctx: &CommandContext, _s: &EmptySettings| 0);
///     })
///     .build()
///     .unwrap();
///
/// let tester = CommandAppTester::new(app);
/// let result = tokio_test::block_on(tester.run(&["ok", "--", "rest"])).unwrap();
/// assert_eq!(result.exit_code, 0);
/// assert_eq!(result.context.remaining(), ["rest".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct CommandAppTester {
    app: CommandApp,
    cancellation: CancellationToken,
}

impl CommandAppTester {
    pub fn new(app: CommandApp) -> Self {
        Self {
            app,
            cancellation: CancellationToken::new(),
        }
    }

    /// Uses `token` as the cancellation signal of every run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn app(&self) -> &CommandApp {
        &self.app
    }

    /// Runs `args`, returning failures instead of handling them.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] of the first failing stage.
    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<CommandAppResult, CommandError> {
        self.app
            .execute(args, self.cancellation.clone())
            .await
            .map(CommandAppResult::from)
    }

    /// Runs `args` through the application's failure policy.
    ///
    /// # Errors
    ///
    /// Only when the application propagates failures.
    pub async fn run_to_exit_code<S: AsRef<str>>(&self, args: &[S]) -> Result<i32, CommandError> {
        self.app.run(args, self.cancellation.clone()).await
    }
}
