//! Error taxonomy for tree building, parsing, validation and execution.
//!
//! Each failure family has its own enum; [`CommandError`] unifies them at
//! the application boundary, where the caller decides whether to propagate,
//! delegate to a handler, or report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error raised by command and interceptor implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn list(items: &[String]) -> String {
    if items.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", items.join(", "))
    }
}

/// Structural defect in a command tree, detected when it is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A non-root command has an empty or whitespace-only name.
    #[error("command name cannot be empty (under '{parent}')")]
    EmptyCommandName { parent: String },
    /// Two siblings share a name or alias.
    #[error("duplicate command name or alias '{name}' under '{parent}'")]
    DuplicateCommand { parent: String, name: String },
    /// A branch declares more than one default command.
    #[error("branch '{branch}' declares more than one default command")]
    MultipleDefaultCommands { branch: String },
    /// A default command is placed somewhere other than under a branch.
    #[error("default command '{command}' must be a child of a branch")]
    MisplacedDefaultCommand { command: String },
    /// A branch has neither children nor a default command.
    #[error("branch '{branch}' has no commands")]
    EmptyBranch { branch: String },
    /// An executable command has child commands.
    #[error("command '{command}' is executable and cannot have child commands")]
    LeafWithChildren { command: String },
    /// A named parameter defines neither a long nor a short name.
    #[error("parameter '{parameter}' of '{command}' must define a long or short name")]
    MissingParameterName { command: String, parameter: String },
    /// A long name is empty, starts with `-`, or contains `=` or whitespace.
    #[error("invalid long name '{name}' in '{command}'")]
    InvalidLongName { command: String, name: String },
    /// A short name is `-`, `=` or whitespace.
    #[error("invalid short name '{name}' in '{command}'")]
    InvalidShortName { command: String, name: char },
    /// Two parameters visible at one command share a name.
    #[error("duplicate parameter '{name}' in '{command}'")]
    DuplicateParameter { command: String, name: String },
    /// Branches may only declare options and flags.
    #[error("branch '{command}' cannot declare positional argument '{parameter}'")]
    BranchPositional { command: String, parameter: String },
    /// A multi-valued positional is followed by another positional.
    #[error("multi-valued argument '{parameter}' of '{command}' must be the last positional")]
    MultiplePositionalNotLast { command: String, parameter: String },
    /// A required positional follows an optional one.
    #[error("required argument '{parameter}' of '{command}' follows an optional argument")]
    RequiredAfterOptional { command: String, parameter: String },
    /// A parameter is both required and defaulted.
    #[error("required parameter '{parameter}' of '{command}' cannot have a default value")]
    RequiredWithDefault { command: String, parameter: String },
    /// A flag is declared with multiple arity.
    #[error("flag '{parameter}' of '{command}' cannot take multiple values")]
    MultipleFlag { command: String, parameter: String },
    /// A custom value type has no registered converter.
    #[error("no converter registered for type '{type_name}' (parameter '{parameter}' of '{command}')")]
    UnknownConverter {
        command: String,
        parameter: String,
        type_name: String,
    },
    /// A default value does not convert to the parameter type.
    #[error("default value '{value}' of '{parameter}' in '{command}' is invalid: {reason}")]
    InvalidDefault {
        command: String,
        parameter: String,
        value: String,
        reason: String,
    },
    /// The settings type of an executable command rejects a default value
    /// it would receive, often one inherited from an ancestor branch.
    #[error("default value of '{parameter}' cannot be assigned to the settings of '{command}': {reason}")]
    UnassignableDefault {
        command: String,
        parameter: String,
        reason: String,
    },
    /// A declared example does not parse.
    #[error("example '{example}' of '{command}' is invalid: {reason}")]
    InvalidExample {
        command: String,
        example: String,
        reason: String,
    },
}

/// User input that cannot be mapped onto the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Token with an empty or invalid option name.
    #[error("malformed argument '{token}'")]
    MalformedToken { token: String },
    /// Word that matches no child of a branch without a default command.
    #[error("unknown command '{command}' in '{path}'{}", list(.available))]
    UnknownCommand {
        command: String,
        path: String,
        available: Vec<String>,
    },
    /// Branch reached without a command word and without a default.
    #[error("no command specified for '{path}'{}", list(.available))]
    MissingCommand { path: String, available: Vec<String> },
    /// Option or flag not declared for the target command.
    #[error("unknown option '{option}' for '{command}'")]
    UnknownOption { option: String, command: String },
    /// Option given without a value.
    #[error("option '{option}' requires a value")]
    MissingValue { option: String },
    /// Value that does not convert to the parameter type.
    #[error("invalid value '{value}' for '{parameter}': {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Required parameter with no bound value.
    #[error("missing required parameter '{parameter}'")]
    MissingRequired { parameter: String },
    /// Single-valued option repeated under the `Error` policy.
    #[error("option '{option}' was given more than once")]
    DuplicateOption { option: String },
    /// Positional value with no parameter left to receive it.
    #[error("unexpected argument '{value}' for '{command}'")]
    UnexpectedArgument { value: String, command: String },
}

impl ParseError {
    /// The offending token or parameter name.
    pub fn offending(&self) -> &str {
        match self {
            Self::MalformedToken { token } => token,
            Self::UnknownCommand { command, .. } => command,
            Self::MissingCommand { path, .. } => path,
            Self::UnknownOption { option, .. }
            | Self::MissingValue { option }
            | Self::DuplicateOption { option } => option,
            Self::InvalidValue { parameter, .. } | Self::MissingRequired { parameter } => {
                parameter
            }
            Self::UnexpectedArgument { value, .. } => value,
        }
    }
}

/// Which validation hook rejected the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationScope {
    /// The settings' own `validate`.
    Settings,
    /// The command's `validate`.
    Command,
}

/// A validation hook returned failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub scope: ValidationScope,
    pub message: String,
}

/// A bound value could not be stored in a settings field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// The settings type has no field for this parameter.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    /// The value variant does not fit the field.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Failure while instantiating settings or running user code.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Neither the service resolver nor default construction produced settings.
    #[error("could not create settings of type '{settings}'")]
    SettingsUnavailable { settings: String },
    /// The resolved command has nothing to execute.
    #[error("command '{command}' has no handler")]
    MissingHandler { command: String },
    /// The command received settings of an unexpected type.
    #[error("command '{command}' expected settings of type '{expected}'")]
    SettingsMismatch { command: String, expected: String },
    /// A bound value was rejected by the settings type.
    #[error("cannot assign '{parameter}' on '{settings}': {source}")]
    Assignment {
        parameter: String,
        settings: String,
        #[source]
        source: AssignError,
    },
    /// An interceptor raised an error.
    #[error("interceptor failed: {source}")]
    InterceptorFailed {
        #[source]
        source: BoxError,
    },
    /// The command raised an error.
    #[error("command '{command}' failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: BoxError,
    },
    /// The cancellation signal fired while the command was running.
    #[error("command '{command}' was cancelled")]
    Cancelled { command: String },
    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Executor(#[from] std::io::Error),
}

/// Discriminant of [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Configuration,
    Parse,
    Validation,
    Runtime,
}

/// Any failure surfaced at the application boundary.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// The offending token or parameter, for parse errors.
    pub fn offending(&self) -> Option<&str> {
        match self {
            Self::Parse(err) => Some(err.offending()),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`CommandError`].
pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_lists_available() {
        let err = ParseError::UnknownCommand {
            command: "pul".into(),
            path: "git".into(),
            available: vec!["pull".into(), "push".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown command 'pul' in 'git' (available: pull, push)"
        );
        assert_eq!(err.offending(), "pul");
    }

    #[test]
    fn test_command_error_kind() {
        let err: CommandError = ParseError::MissingRequired {
            parameter: "path".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.offending(), Some("path"));
        assert_eq!(err.to_string(), "missing required parameter 'path'");
    }
}
