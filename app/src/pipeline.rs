//! Validation, interception and execution of a bound command.

use std::fmt;
use std::sync::Arc;

use command_tree_core::{
    CommandError, RuntimeError, Settings, ValidationError, ValidationResult, ValidationScope,
};
use serde::Serialize;
use tracing::debug;

use crate::command::DynCommand;
use crate::context::CommandContext;
use crate::interceptor::Interceptor;

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Tokenized,
    Resolved,
    Bound,
    FieldValidated,
    UserValidated,
    Intercepted,
    Executed,
    ResultIntercepted,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct Execution {
    pub exit_code: i32,
    pub context: CommandContext,
    pub settings: Box<dyn Settings>,
}

fn check(scope: ValidationScope, result: ValidationResult) -> Result<(), ValidationError> {
    match result {
        ValidationResult::Success => Ok(()),
        ValidationResult::Failure(message) => Err(ValidationError { scope, message }),
    }
}

/// Runs everything after binding: validation, interceptors, execution and
/// result interception.
pub(crate) async fn run(
    interceptors: &[Arc<dyn Interceptor>],
    command: &dyn DynCommand,
    context: &CommandContext,
    settings: &mut dyn Settings,
) -> Result<i32, CommandError> {
    check(ValidationScope::Settings, settings.validate())?;
    debug!(stage = %Stage::FieldValidated, "settings valid");

    check(ValidationScope::Command, command.validate(context, &*settings)?)?;
    debug!(stage = %Stage::UserValidated, "command validation passed");

    for interceptor in interceptors {
        interceptor
            .intercept(context, &mut *settings)
            .map_err(|source| RuntimeError::InterceptorFailed { source })?;
    }
    debug!(stage = %Stage::Intercepted, count = interceptors.len(), "interceptors ran");

    let mut exit_code = tokio::select! {
        biased;
        _ = context.cancellation().cancelled() => {
            return Err(RuntimeError::Cancelled {
                command: context.command_path(),
            }
            .into());
        }
        result = command.execute(context, &*settings) => result?,
    };
    debug!(stage = %Stage::Executed, exit_code, "command finished");

    for interceptor in interceptors {
        interceptor.intercept_result(context, &*settings, &mut exit_code);
    }
    debug!(stage = %Stage::ResultIntercepted, exit_code, "result interceptors ran");

    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Tokenized.to_string(), "Tokenized");
        assert_eq!(serde_json::to_string(&Stage::Resolved).unwrap(), "\"Resolved\"");
    }
}
