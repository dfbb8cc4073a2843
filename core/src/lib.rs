//! Command tree model and argument resolution.
//!
//! This crate turns a raw argument vector into a resolved command and a set
//! of typed values:
//!
//! - [`CommandBuilder`] / [`TreeBuilder`] declare commands, branches and
//!   their [`ParameterSpec`]s and finalize them into an immutable
//!   [`CommandTree`].
//! - [`Tokenizer`] classifies arguments into [`Token`]s.
//! - [`TreeResolver`] walks the tree along the leading command words,
//!   falling back to a branch's default command.
//! - [`Binder`] maps the residual tokens onto parameters, converting values
//!   through the [`ConverterRegistry`].
//! - [`Binding::instantiate`] creates the command's [`Settings`] through a
//!   [`ServiceResolver`] and assigns the bound values.
//!
//! Structural checks live in [`validate_tree`] and [`validate_examples`];
//! every failure is one of the enums in the error module, unified as
//! [`CommandError`].
//!
//! # Example
//!
//! ```
//! use command_tree_core::*;
//!
//! let tree = TreeBuilder::new(
//!     CommandBuilder::branch("app")
//!         .with_parameter(ParameterSpec::flag("verbose").with_short('v'))
//!         .with_child(
//!             CommandBuilder::leaf("greet", ())
//!                 .with_parameter(ParameterSpec::required("name", ValueKind::String))
//!                 .with_parameter(
//!                     ParameterSpec::option("times", ValueKind::Integer)
//!                         .with_short('n')
//!                         .with_default("1"),
//!                 ),
//!         ),
//! )
//! .build()
//! .unwrap();
//!
//! let parsed = parse(&tree, &["greet", "-v", "world"], &ParserSettings::default()).unwrap();
//! assert_eq!(tree.display_path(parsed.target), "app greet");
//!
//! let values = &parsed.binding.values;
//! assert_eq!(values.get("name"), Some(&Value::String("world".into())));
//! assert_eq!(values.get("verbose"), Some(&Value::Bool(true)));
//! assert_eq!(values.get("times"), Some(&Value::Integer(1)));
//! ```

mod bind;
mod builder;
mod convert;
mod error;
mod model;
mod parser;
mod resolve;
mod services;
mod settings;
mod tokenizer;
mod tree;
mod types;
mod validate;
mod value;

pub use bind::{Binder, Binding};
pub use builder::{CommandBuilder, TreeBuilder};
pub use convert::ConverterRegistry;
pub use error::{
    AssignError, BoxError, CommandError, ConfigurationError, ErrorKind, ParseError, Result,
    RuntimeError, ValidationError, ValidationScope,
};
pub use model::{CommandModel, ParameterModel};
pub use parser::{ParsedCommand, parse};
pub use resolve::{Resolution, TreeResolver};
pub use services::{NoServices, ServiceRegistry, ServiceResolver, resolve_service};
pub use settings::{AsAny, EmptySettings, Settings, SettingsType, ValidationResult};
pub use tokenizer::{Token, Tokenizer};
pub use tree::{CommandNode, CommandTree, NodeData, NodeId};
pub use types::*;
pub use validate::{validate_default_assignment, validate_examples, validate_tree};
pub use value::{BoundValues, CustomValue, FromValue, Value};
