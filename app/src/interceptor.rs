//! Hooks that run around every command.

use std::fmt;

use command_tree_core::{BoxError, Settings};

use crate::context::CommandContext;

/// Runs before and after command execution.
///
/// Interceptors are called in registration order, both before execution and
/// after it. Each `intercept_result` sees the exit code as left by the
/// previous interceptor and may overwrite it.
pub trait Interceptor: Send + Sync {
    /// Called after validation, before execution. May mutate the settings.
    fn intercept(
        &self,
        _context: &CommandContext,
        _settings: &mut dyn Settings,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after execution with the current exit code.
    fn intercept_result(
        &self,
        _context: &CommandContext,
        _settings: &dyn Settings,
        _result: &mut i32,
    ) {
    }
}

type BeforeFn = Box<dyn Fn(&CommandContext, &mut dyn Settings) + Send + Sync>;
type AfterFn = Box<dyn Fn(&CommandContext, &dyn Settings, &mut i32) + Send + Sync>;

/// Interceptor built from closures.
///
/// # Examples
///
/// ```
/// use command_tree::CallbackInterceptor;
///
/// let interceptor = CallbackInterceptor::new()
///     .on_intercept(|ctx, _settings| tracing::info!(command = ctx.name(), "starting"))
///     .on_result(|_ctx, _settings, code| {
///         if *code > 0 {
///             *code = 1;
///         }
///     });
/// # let _ = interceptor;
/// ```
#[derive(Default)]
pub struct CallbackInterceptor {
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl CallbackInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_intercept<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CommandContext, &mut dyn Settings) + Send + Sync + 'static,
    {
        self.before = Some(Box::new(callback));
        self
    }

    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CommandContext, &dyn Settings, &mut i32) + Send + Sync + 'static,
    {
        self.after = Some(Box::new(callback));
        self
    }
}

impl Interceptor for CallbackInterceptor {
    fn intercept(
        &self,
        context: &CommandContext,
        settings: &mut dyn Settings,
    ) -> Result<(), BoxError> {
        if let Some(before) = &self.before {
            before(context, settings);
        }
        Ok(())
    }

    fn intercept_result(&self, context: &CommandContext, settings: &dyn Settings, result: &mut i32) {
        if let Some(after) = &self.after {
            after(context, settings, result);
        }
    }
}

impl fmt::Debug for CallbackInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackInterceptor")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}
