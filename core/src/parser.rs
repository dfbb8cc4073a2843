//! Tokenize, resolve and bind in one call.

use crate::bind::{Binder, Binding};
use crate::error::ParseError;
use crate::resolve::TreeResolver;
use crate::tokenizer::Tokenizer;
use crate::tree::{CommandTree, NodeId};
use crate::types::ParserSettings;

/// Result of parsing an argument vector against a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// Executable node to run.
    pub target: NodeId,
    /// Nodes from the root down to the target, inclusive.
    pub path: Vec<NodeId>,
    /// Bound values and pass-through arguments.
    pub binding: Binding,
}

/// Parses `args` (program name excluded) against `tree`.
///
/// # Examples
///
/// ```
/// use command_tree_core::*;
///
/// let tree = TreeBuilder::new(
///     CommandBuilder::branch("app")
///         .with_parameter(ParameterSpec::flag("verbose"))
///         .with_child(
///             CommandBuilder::branch("db").with_child(CommandBuilder::default_leaf(())),
///         ),
/// )
/// .build()
/// .unwrap();
///
/// let parsed = parse(&tree, &["db", "--verbose"], &ParserSettings::default()).unwrap();
/// assert_eq!(tree.node(parsed.target).kind(), CommandKind::DefaultLeaf);
/// assert_eq!(parsed.binding.values.get("verbose"), Some(&Value::Bool(true)));
/// ```
///
/// # Errors
///
/// Returns the first [`ParseError`] raised by any stage.
pub fn parse<H, S: AsRef<str>>(
    tree: &CommandTree<H>,
    args: &[S],
    settings: &ParserSettings,
) -> Result<ParsedCommand, ParseError> {
    let tokens = Tokenizer::new(settings).tokenize(args)?;
    let resolution = TreeResolver::new(tree, settings.case_sensitivity).resolve(&tokens)?;
    let binding = Binder::new(tree, settings).bind(resolution.target, &resolution.residual)?;

    Ok(ParsedCommand {
        target: resolution.target,
        path: resolution.path,
        binding,
    })
}
