//! Command traits and delegate commands.
//!
//! Implement [`Command`] for a typed command. The application stores it
//! behind the object-safe [`DynCommand`], which downcasts the bound
//! settings once before calling into the typed implementation.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use command_tree_core::{BoxError, RuntimeError, Settings, ValidationResult};

use crate::context::CommandContext;

/// Boxed future returned by asynchronous delegates.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Exit code or the error a command failed with.
pub type CommandResult = Result<i32, BoxError>;

/// Executable node handler stored in the command tree.
pub type Handler = Arc<dyn DynCommand>;

/// A command with strongly-typed settings.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use command_tree::{Command, CommandContext, CommandResult, EmptySettings};
///
/// struct Ping;
///
/// #[async_trait]
/// impl Command for Ping {
///     type Settings = EmptySettings;
///
///     async fn execute(&self, _context: &CommandContext, _settings: &EmptySettings) -> CommandResult {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync + 'static {
    type Settings: Settings;

    /// Validates the bound settings before interception and execution.
    fn validate(&self, _context: &CommandContext, _settings: &Self::Settings) -> ValidationResult {
        ValidationResult::Success
    }

    /// Runs the command and returns its exit code.
    async fn execute(&self, context: &CommandContext, settings: &Self::Settings) -> CommandResult;
}

/// Object-safe view of a [`Command`].
#[async_trait]
pub trait DynCommand: Send + Sync {
    /// Type name of the settings the command expects.
    fn settings_name(&self) -> &'static str;

    fn validate(
        &self,
        context: &CommandContext,
        settings: &dyn Settings,
    ) -> Result<ValidationResult, RuntimeError>;

    async fn execute(
        &self,
        context: &CommandContext,
        settings: &dyn Settings,
    ) -> Result<i32, RuntimeError>;
}

fn downcast<'s, S: Settings>(
    context: &CommandContext,
    settings: &'s dyn Settings,
) -> Result<&'s S, RuntimeError> {
    settings
        .downcast_ref::<S>()
        .ok_or_else(|| RuntimeError::SettingsMismatch {
            command: context.command_path(),
            expected: std::any::type_name::<S>().to_string(),
        })
}

#[async_trait]
impl<C: Command> DynCommand for C {
    fn settings_name(&self) -> &'static str {
        std::any::type_name::<C::Settings>()
    }

    fn validate(
        &self,
        context: &CommandContext,
        settings: &dyn Settings,
    ) -> Result<ValidationResult, RuntimeError> {
        let settings = downcast::<C::Settings>(context, settings)?;
        Ok(<C as Command>::validate(self, context, settings))
    }

    async fn execute(
        &self,
        context: &CommandContext,
        settings: &dyn Settings,
    ) -> Result<i32, RuntimeError> {
        let settings = downcast::<C::Settings>(context, settings)?;
        <C as Command>::execute(self, context, settings)
            .await
            .map_err(|source| RuntimeError::CommandFailed {
                command: context.command_path(),
                source,
            })
    }
}

/// Command backed by a synchronous closure.
pub struct DelegateCommand<S, F> {
    func: F,
    _settings: PhantomData<fn() -> S>,
}

impl<S, F> DelegateCommand<S, F>
where
    S: Settings,
    F: Fn(&CommandContext, &S) -> i32 + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _settings: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F> Command for DelegateCommand<S, F>
where
    S: Settings,
    F: Fn(&CommandContext, &S) -> i32 + Send + Sync + 'static,
{
    type Settings = S;

    async fn execute(&self, context: &CommandContext, settings: &S) -> CommandResult {
        Ok((self.func)(context, settings))
    }
}

/// Command backed by an asynchronous closure.
///
/// The closure returns a boxed future borrowing the context and settings:
///
/// ```
/// use command_tree::{AsyncDelegateCommand, CommandContext, EmptySettings};
///
/// let command = AsyncDelegateCommand::new(|_ctx: &CommandContext, _settings: &EmptySettings| {
///     Box::pin(async move { Ok(0) })
/// });
/// # let _ = command;
/// ```
pub struct AsyncDelegateCommand<S, F> {
    func: F,
    _settings: PhantomData<fn() -> S>,
}

impl<S, F> AsyncDelegateCommand<S, F>
where
    S: Settings,
    F: for<'a> Fn(&'a CommandContext, &'a S) -> BoxFuture<'a, CommandResult>
        + Send
        + Sync
        + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _settings: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F> Command for AsyncDelegateCommand<S, F>
where
    S: Settings,
    F: for<'a> Fn(&'a CommandContext, &'a S) -> BoxFuture<'a, CommandResult>
        + Send
        + Sync
        + 'static,
{
    type Settings = S;

    async fn execute(&self, context: &CommandContext, settings: &S) -> CommandResult {
        (self.func)(context, settings).await
    }
}
