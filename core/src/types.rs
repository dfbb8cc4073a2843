//! Parameter and command type definitions.
//!
//! This module defines the declarative vocabulary used to describe a command
//! tree: what kind of node a command is, what kind of parameters it accepts,
//! and how the parser should treat names and repeated options. The enums
//! serialize with [`serde`] so they can travel inside a
//! [`CommandModel`](crate::CommandModel) snapshot.

use std::any::TypeId;

use serde::{Deserialize, Serialize};

/// Name of the implicit default command registered under a branch.
///
/// Default commands are never matched by this name, only by their aliases.
pub const DEFAULT_COMMAND_NAME: &str = "__default_command";

/// Controls which names are compared case-sensitively.
///
/// Short option names are always case-sensitive (`-v` and `-V` are different
/// options).
///
/// # Examples
///
/// ```
/// use command_tree_core::CaseSensitivity;
///
/// assert!(CaseSensitivity::All.commands());
/// assert!(!CaseSensitivity::LongOptions.commands());
/// assert!(CaseSensitivity::LongOptions.long_options());
/// assert!(!CaseSensitivity::None.long_options());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CaseSensitivity {
    /// Commands and long options are case-sensitive (the default).
    #[default]
    All,
    /// Only command names and aliases are case-sensitive.
    Commands,
    /// Only long option names are case-sensitive.
    LongOptions,
    /// Nothing is case-sensitive except short options.
    None,
}

impl CaseSensitivity {
    /// Returns `true` if command names and aliases are compared exactly.
    pub fn commands(self) -> bool {
        matches!(self, Self::All | Self::Commands)
    }

    /// Returns `true` if long option names are compared exactly.
    pub fn long_options(self) -> bool {
        matches!(self, Self::All | Self::LongOptions)
    }
}

/// Compares two names, optionally ignoring case.
pub fn names_match(case_sensitive: bool, left: &str, right: &str) -> bool {
    if case_sensitive {
        left == right
    } else {
        left.to_lowercase() == right.to_lowercase()
    }
}

/// What happens when a single-valued option is given more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DuplicateOptionPolicy {
    /// The last occurrence overwrites earlier ones (the default).
    #[default]
    LastWins,
    /// A repeated occurrence is a parse error.
    Error,
}

/// Parsing knobs shared by the tokenizer, resolver and binder.
///
/// # Examples
///
/// ```
/// use command_tree_core::{CaseSensitivity, DuplicateOptionPolicy, ParserSettings};
///
/// let settings = ParserSettings::default();
/// assert_eq!(settings.case_sensitivity, CaseSensitivity::All);
/// assert!(settings.strict_parsing);
/// assert_eq!(settings.duplicate_options, DuplicateOptionPolicy::LastWins);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Case sensitivity for command names and long options.
    pub case_sensitivity: CaseSensitivity,
    /// Reject unknown options, surplus arguments and malformed tokens.
    ///
    /// When disabled, unknown options and surplus arguments are passed
    /// through as remaining arguments and malformed tokens are read as words.
    pub strict_parsing: bool,
    /// Policy for repeated single-valued options.
    pub duplicate_options: DuplicateOptionPolicy,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::default(),
            strict_parsing: true,
            duplicate_options: DuplicateOptionPolicy::default(),
        }
    }
}

/// Role of a node in the command tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Groups child commands; never executed itself.
    Branch,
    /// Executable command selected by name.
    Leaf,
    /// Executable command selected when no child name matches.
    DefaultLeaf,
}

impl CommandKind {
    /// Returns `true` for leaves and default leaves.
    pub fn is_executable(self) -> bool {
        !matches!(self, Self::Branch)
    }
}

/// Syntactic role of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Bound by position (`cp <SOURCE> <DEST>`).
    Positional,
    /// Named parameter that takes a value (`--output <PATH>`).
    Option,
    /// Named boolean switch (`--verbose`).
    Flag,
}

/// Whether a parameter holds one value or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueArity {
    /// One value (the default).
    #[default]
    Single,
    /// Ordered sequence of values, in encounter order.
    Multiple,
}

/// Identity of a user-defined value type with a registered converter.
///
/// # Examples
///
/// ```
/// use command_tree_core::CustomType;
///
/// struct Port(u16);
/// let ty = CustomType::of::<Port>();
/// assert!(ty.name.ends_with("Port"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomType {
    /// Type identity used as the converter registry key.
    pub id: TypeId,
    /// Type name used in diagnostics.
    pub name: &'static str,
}

impl CustomType {
    /// Returns the custom type descriptor for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// Target type of a parameter's raw string values.
///
/// Selects the converter used by the binder. Built-in kinds need no
/// registration; [`ValueKind::Custom`] requires a converter registered on
/// the tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueKind {
    /// `true`/`false` (also `yes`/`no`, `on`/`off`, `1`/`0`).
    Bool,
    /// Any string (the default).
    #[default]
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// One of the listed member names, matched case-insensitively.
    Enum(Vec<String>),
    /// User type converted by a registered converter.
    Custom(CustomType),
}

impl ValueKind {
    /// Builds an enumeration kind from member names.
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Human-readable type name used in diagnostics and model snapshots.
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Float => "float".to_string(),
            Self::Enum(members) => format!("enum({})", members.join("|")),
            Self::Custom(ty) => ty.name.to_string(),
        }
    }
}

/// Specification of a single command parameter.
///
/// Use [`flag`](ParameterSpec::flag) and [`option`](ParameterSpec::option)
/// for named parameters and [`required`](ParameterSpec::required) /
/// [`optional`](ParameterSpec::optional) for positional ones, then chain
/// builder methods.
///
/// Named parameters default their long name to the parameter name.
///
/// # Examples
///
/// ```
/// use command_tree_core::{ParameterKind, ParameterSpec, ValueKind};
///
/// let verbose = ParameterSpec::flag("verbose").with_short('v');
/// assert_eq!(verbose.kind, ParameterKind::Flag);
/// assert_eq!(verbose.long.as_deref(), Some("verbose"));
/// assert_eq!(verbose.display_name(), "--verbose");
///
/// let count = ParameterSpec::option("count", ValueKind::Integer).with_default("1");
/// assert!(count.takes_value());
///
/// let path = ParameterSpec::required("path", ValueKind::String);
/// assert_eq!(path.display_name(), "<path>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Identifier the bound value is assigned under.
    pub name: String,
    /// Syntactic role.
    pub kind: ParameterKind,
    /// Single value or sequence.
    pub arity: ValueArity,
    /// Must be supplied on the command line.
    pub required: bool,
    /// Long name without the leading `--`.
    pub long: Option<String>,
    /// Short name without the leading `-`.
    pub short: Option<char>,
    /// Index among the command's positionals, assigned when the tree is built.
    pub position: Option<usize>,
    /// Target type of the raw values.
    pub value_kind: ValueKind,
    /// Raw default applied when no value is bound.
    pub default_value: Option<String>,
    /// Description for help output.
    pub description: Option<String>,
}

impl ParameterSpec {
    fn new(name: &str, kind: ParameterKind, value_kind: ValueKind) -> Self {
        let long = match kind {
            ParameterKind::Positional => None,
            ParameterKind::Option | ParameterKind::Flag => Some(name.to_string()),
        };
        Self {
            name: name.to_string(),
            kind,
            arity: ValueArity::Single,
            required: false,
            long,
            short: None,
            position: None,
            value_kind,
            default_value: None,
            description: None,
        }
    }

    /// Creates a boolean flag (no value).
    pub fn flag(name: &str) -> Self {
        Self::new(name, ParameterKind::Flag, ValueKind::Bool)
    }

    /// Creates a named option that takes a value.
    pub fn option(name: &str, value_kind: ValueKind) -> Self {
        Self::new(name, ParameterKind::Option, value_kind)
    }

    /// Creates a required positional argument.
    pub fn required(name: &str, value_kind: ValueKind) -> Self {
        let mut spec = Self::new(name, ParameterKind::Positional, value_kind);
        spec.required = true;
        spec
    }

    /// Creates an optional positional argument.
    pub fn optional(name: &str, value_kind: ValueKind) -> Self {
        Self::new(name, ParameterKind::Positional, value_kind)
    }

    /// Sets the short name.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Replaces the long name.
    pub fn with_long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    /// Removes the long name, leaving only the short form.
    pub fn short_only(mut self, short: char) -> Self {
        self.long = None;
        self.short = Some(short);
        self
    }

    /// Marks a named option as required.
    pub fn mandatory(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks as accepting multiple values.
    pub fn allow_multiple(mut self) -> Self {
        self.arity = ValueArity::Multiple;
        self
    }

    /// Sets the raw default value.
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Returns `true` for positional arguments.
    pub fn is_positional(&self) -> bool {
        self.kind == ParameterKind::Positional
    }

    /// Returns `true` for options that consume a value token.
    pub fn takes_value(&self) -> bool {
        self.kind == ParameterKind::Option
    }

    /// Returns the name shown in diagnostics (`--long`, `-s` or `<name>`).
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.long, self.short) {
            (ParameterKind::Positional, _, _) => format!("<{}>", self.name),
            (_, Some(long), _) => format!("--{long}"),
            (_, None, Some(short)) => format!("-{short}"),
            (_, None, None) => self.name.clone(),
        }
    }

    /// Checks whether `name` is this parameter's long name.
    pub fn matches_long(&self, name: &str, case_sensitive: bool) -> bool {
        self.long
            .as_deref()
            .is_some_and(|long| names_match(case_sensitive, long, name))
    }

    /// Checks whether `short` is this parameter's short name.
    pub fn matches_short(&self, short: char) -> bool {
        self.short == Some(short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_long_name() {
        let flag = ParameterSpec::flag("verbose").with_short('v');

        assert_eq!(flag.long.as_deref(), Some("verbose"));
        assert_eq!(flag.short, Some('v'));
        assert_eq!(flag.value_kind, ValueKind::Bool);
        assert!(!flag.takes_value());
    }

    #[test]
    fn test_short_only_option() {
        let opt = ParameterSpec::option("n", ValueKind::Integer).short_only('n');

        assert!(opt.long.is_none());
        assert_eq!(opt.display_name(), "-n");
        assert!(opt.matches_short('n'));
        assert!(!opt.matches_short('N'));
    }

    #[test]
    fn test_long_name_case_matching() {
        let opt = ParameterSpec::option("Output", ValueKind::String);

        assert!(opt.matches_long("Output", true));
        assert!(!opt.matches_long("output", true));
        assert!(opt.matches_long("output", false));
    }

    #[test]
    fn test_case_sensitivity_modes() {
        assert!(CaseSensitivity::Commands.commands());
        assert!(!CaseSensitivity::Commands.long_options());
        assert!(!CaseSensitivity::None.commands());
    }

    #[test]
    fn test_value_kind_type_names() {
        assert_eq!(ValueKind::Integer.type_name(), "integer");
        assert_eq!(
            ValueKind::enumeration(["json", "yaml"]).type_name(),
            "enum(json|yaml)"
        );
    }
}
