//! Builders that assemble a [`CommandTree`].
//!
//! A tree is described as nested [`CommandBuilder`] values and finalized
//! by [`TreeBuilder::build`], which flattens it into the node arena,
//! assigns positional indices and runs the structural checks in
//! [`validate`](crate::validate).
//!
//! # Examples
//!
//! ```
//! use command_tree_core::*;
//!
//! let tree = TreeBuilder::new(
//!     CommandBuilder::branch("git")
//!         .with_child(
//!             CommandBuilder::leaf("clone", ())
//!                 .with_parameter(ParameterSpec::required("url", ValueKind::String)),
//!         )
//!         .with_child(CommandBuilder::leaf("status", ()).with_alias("st")),
//! )
//! .build()
//! .unwrap();
//!
//! assert_eq!(tree.len(), 3);
//! assert!(tree.find_path(&["st"], CaseSensitivity::All).is_some());
//!
//! // A branch without children is rejected.
//! let err = TreeBuilder::<()>::new(CommandBuilder::branch("empty")).build();
//! assert!(matches!(err, Err(ConfigurationError::EmptyBranch { .. })));
//! ```

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::convert::ConverterRegistry;
use crate::error::ConfigurationError;
use crate::settings::{EmptySettings, SettingsType};
use crate::tree::{CommandNode, CommandTree, NodeData, NodeId};
use crate::types::{CaseSensitivity, CommandKind, DEFAULT_COMMAND_NAME, ParameterSpec};
use crate::validate::validate_tree;

/// Declarative description of one command and its subtree.
pub struct CommandBuilder<H> {
    name: String,
    aliases: Vec<String>,
    kind: CommandKind,
    parameters: Vec<ParameterSpec>,
    settings: Option<SettingsType>,
    description: Option<String>,
    examples: Vec<Vec<String>>,
    hidden: bool,
    data: Option<NodeData>,
    handler: Option<H>,
    children: Vec<CommandBuilder<H>>,
}

impl<H> CommandBuilder<H> {
    fn new(name: &str, kind: CommandKind, handler: Option<H>) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            kind,
            parameters: Vec::new(),
            settings: None,
            description: None,
            examples: Vec::new(),
            hidden: false,
            data: None,
            handler,
            children: Vec::new(),
        }
    }

    /// Creates a branch that groups child commands.
    pub fn branch(name: &str) -> Self {
        Self::new(name, CommandKind::Branch, None)
    }

    /// Creates an executable command.
    pub fn leaf(name: &str, handler: H) -> Self {
        Self::new(name, CommandKind::Leaf, Some(handler))
    }

    /// Creates the default command of a branch.
    ///
    /// It runs when the branch is reached without a matching command word
    /// and can only be addressed by name through its aliases. Default
    /// commands are always hidden.
    pub fn default_leaf(handler: H) -> Self {
        let mut builder = Self::new(DEFAULT_COMMAND_NAME, CommandKind::DefaultLeaf, Some(handler));
        builder.hidden = true;
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.add_alias(alias);
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            self.add_alias(alias.as_ref());
        }
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.set_description(description);
        self
    }

    /// Adds an example argument vector, starting from the root.
    pub fn with_example<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_example(args);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.set_hidden(true);
        self
    }

    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.set_data(data);
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.add_parameter(parameter);
        self
    }

    /// Attaches a settings type and declares its parameters.
    pub fn with_settings(mut self, settings: SettingsType) -> Self {
        self.set_settings(settings);
        self
    }

    pub fn with_child(mut self, child: CommandBuilder<H>) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_alias(&mut self, alias: &str) -> &mut Self {
        if !self.aliases.iter().any(|existing| existing == alias) {
            self.aliases.push(alias.to_string());
        }
        self
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn add_example<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples.push(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    pub fn set_data<T: Any + Send + Sync>(&mut self, data: T) -> &mut Self {
        self.data = Some(Arc::new(data));
        self
    }

    pub fn add_parameter(&mut self, parameter: ParameterSpec) -> &mut Self {
        self.parameters.push(parameter);
        self
    }

    pub fn set_settings(&mut self, settings: SettingsType) -> &mut Self {
        self.parameters.extend(settings.parameters());
        self.settings = Some(settings);
        self
    }

    /// Appends a child and returns it for further configuration.
    pub fn push_child(&mut self, child: CommandBuilder<H>) -> &mut CommandBuilder<H> {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }
}

/// Finalizes a [`CommandBuilder`] root into an immutable [`CommandTree`].
pub struct TreeBuilder<H> {
    root: CommandBuilder<H>,
    case_sensitivity: CaseSensitivity,
    converters: ConverterRegistry,
}

impl<H> TreeBuilder<H> {
    pub fn new(root: CommandBuilder<H>) -> Self {
        Self {
            root,
            case_sensitivity: CaseSensitivity::default(),
            converters: ConverterRegistry::new(),
        }
    }

    /// Case rules used to detect duplicate names and aliases.
    pub fn case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    /// Registers a converter for a custom value type.
    pub fn with_converter<T, F>(mut self, convert: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        self.converters.register(convert);
        self
    }

    /// Replaces the converter registry.
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    /// Flattens and validates the tree.
    ///
    /// # Errors
    ///
    /// Returns the first structural defect found.
    pub fn build(self) -> Result<CommandTree<H>, ConfigurationError> {
        let mut nodes = Vec::new();
        flatten(&mut nodes, self.root, None);

        let tree = CommandTree {
            nodes,
            converters: self.converters,
        };
        if let Some(error) = validate_tree(&tree, self.case_sensitivity).into_iter().next() {
            return Err(error);
        }

        debug!(nodes = tree.len(), "command tree built");
        Ok(tree)
    }
}

fn flatten<H>(
    nodes: &mut Vec<CommandNode<H>>,
    builder: CommandBuilder<H>,
    parent: Option<NodeId>,
) -> NodeId {
    let id = NodeId(nodes.len());
    let CommandBuilder {
        name,
        aliases,
        kind,
        mut parameters,
        settings,
        description,
        examples,
        hidden,
        data,
        handler,
        children,
    } = builder;

    let mut position = 0;
    for spec in parameters.iter_mut().filter(|spec| spec.is_positional()) {
        spec.position = Some(position);
        position += 1;
    }

    let settings = match settings {
        Some(settings) => Some(settings),
        None if kind.is_executable() => Some(SettingsType::of::<EmptySettings>()),
        None => None,
    };

    nodes.push(CommandNode {
        name,
        aliases,
        parent,
        children: Vec::new(),
        kind,
        parameters,
        settings,
        description,
        examples,
        hidden: hidden || kind == CommandKind::DefaultLeaf,
        data,
        handler,
    });

    for child in children {
        let child_id = flatten(nodes, child, Some(id));
        nodes[id.0].children.push(child_id);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn test_positions_assigned_in_declaration_order() {
        let tree = TreeBuilder::new(
            CommandBuilder::leaf("cp", ())
                .with_parameter(ParameterSpec::required("source", ValueKind::String))
                .with_parameter(ParameterSpec::flag("force"))
                .with_parameter(ParameterSpec::required("dest", ValueKind::String)),
        )
        .build()
        .unwrap();

        let positions: Vec<Option<usize>> = tree
            .node(tree.root())
            .parameters()
            .iter()
            .map(|spec| spec.position)
            .collect();
        assert_eq!(positions, vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn test_leaf_without_settings_gets_empty_settings() {
        let tree = TreeBuilder::new(CommandBuilder::leaf("run", ())).build().unwrap();
        let settings = tree.node(tree.root()).settings_type().unwrap();
        assert_eq!(*settings, SettingsType::of::<EmptySettings>());
    }

    #[test]
    fn test_aliases_deduplicated() {
        let builder = CommandBuilder::leaf("list", ())
            .with_aliases(["ls", "l"])
            .with_alias("ls");
        let tree = TreeBuilder::new(CommandBuilder::branch("app").with_child(builder))
            .build()
            .unwrap();
        let list = tree.find_path(&["l"], CaseSensitivity::All).unwrap();
        assert_eq!(tree.node(list).aliases(), ["ls".to_string(), "l".to_string()]);
    }

    #[test]
    fn test_push_child_returns_new_child() {
        let mut root = CommandBuilder::branch("app");
        root.push_child(CommandBuilder::branch("db"))
            .push_child(CommandBuilder::leaf("migrate", ()))
            .set_description("Apply migrations");

        let tree = TreeBuilder::new(root).build().unwrap();
        let migrate = tree.find_path(&["db", "migrate"], CaseSensitivity::All).unwrap();
        assert_eq!(tree.node(migrate).description(), Some("Apply migrations"));
    }

    #[test]
    fn test_data_is_attached() {
        let tree = TreeBuilder::new(CommandBuilder::leaf("run", ()).with_data(42_u32))
            .build()
            .unwrap();
        let data = tree.node(tree.root()).data().unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&42));
    }
}
