//! Immutable command tree.
//!
//! Nodes live in a flat arena and refer to each other through [`NodeId`]
//! handles. A [`CommandTree`] is produced by
//! [`TreeBuilder::build`](crate::TreeBuilder::build) and never changes
//! afterwards, so it can be shared freely between concurrent runs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::convert::ConverterRegistry;
use crate::settings::SettingsType;
use crate::types::{CaseSensitivity, CommandKind, ParameterSpec, names_match};

/// Opaque value attached to a command and exposed to it at run time.
pub type NodeData = Arc<dyn Any + Send + Sync>;

/// Handle of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena (the root is `0`).
    pub fn index(self) -> usize {
        self.0
    }
}

/// A command, branch, or default command in the tree.
///
/// `H` is the executable handler attached to leaves.
pub struct CommandNode<H> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: CommandKind,
    pub(crate) parameters: Vec<ParameterSpec>,
    pub(crate) settings: Option<SettingsType>,
    pub(crate) description: Option<String>,
    pub(crate) examples: Vec<Vec<String>>,
    pub(crate) hidden: bool,
    pub(crate) data: Option<NodeData>,
    pub(crate) handler: Option<H>,
}

impl<H> CommandNode<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn is_executable(&self) -> bool {
        self.kind.is_executable()
    }

    /// Parameters declared on this node (not including inherited ones).
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn settings_type(&self) -> Option<&SettingsType> {
        self.settings.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn examples(&self) -> &[Vec<String>] {
        &self.examples
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn data(&self) -> Option<&NodeData> {
        self.data.as_ref()
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    /// Checks `word` against the name and aliases.
    ///
    /// Default commands only answer to their aliases.
    pub fn matches(&self, word: &str, case_sensitive: bool) -> bool {
        let by_name = self.kind != CommandKind::DefaultLeaf
            && names_match(case_sensitive, &self.name, word);
        by_name
            || self
                .aliases
                .iter()
                .any(|alias| names_match(case_sensitive, alias, word))
    }
}

impl<H> fmt::Debug for CommandNode<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("parameters", &self.parameters)
            .field("settings", &self.settings)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

/// Finished, read-only command tree.
pub struct CommandTree<H> {
    pub(crate) nodes: Vec<CommandNode<H>>,
    pub(crate) converters: ConverterRegistry,
}

impl<H> CommandTree<H> {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node for a handle issued by this tree.
    pub fn node(&self, id: NodeId) -> &CommandNode<H> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode<H>> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node handles in depth-first declaration order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Handles from the root down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.node(parent).parent;
        }
        path.reverse();
        path
    }

    /// Space-separated names from the root down to `id`.
    ///
    /// Default commands are left out unless they are the root, so a
    /// default command displays as its branch.
    pub fn display_path(&self, id: NodeId) -> String {
        self.path(id)
            .into_iter()
            .map(|node| self.node(node))
            .filter(|node| node.kind != CommandKind::DefaultLeaf || node.parent.is_none())
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Finds the child of `parent` answering to `word`.
    pub fn find_child(&self, parent: NodeId, word: &str, case_sensitive: bool) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).matches(word, case_sensitive))
    }

    /// The default command of a branch, if any.
    pub fn default_child(&self, parent: NodeId) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).kind == CommandKind::DefaultLeaf)
    }

    /// Names of the visible children of `parent`, in declaration order.
    pub fn visible_children(&self, parent: NodeId) -> Vec<String> {
        self.node(parent)
            .children
            .iter()
            .map(|&child| self.node(child))
            .filter(|child| !child.hidden && child.kind != CommandKind::DefaultLeaf)
            .map(|child| child.name.clone())
            .collect()
    }

    /// Follows a sequence of command words from the root.
    pub fn find_path<S: AsRef<str>>(&self, words: &[S], case: CaseSensitivity) -> Option<NodeId> {
        words.iter().try_fold(self.root(), |current, word| {
            self.find_child(current, word.as_ref(), case.commands())
        })
    }

    /// Parameters bound at `id`: options and flags inherited from ancestors
    /// (outermost first) followed by the node's own parameters.
    pub fn effective_parameters(&self, id: NodeId) -> Vec<&ParameterSpec> {
        let path = self.path(id);
        let Some((&target, ancestors)) = path.split_last() else {
            return Vec::new();
        };
        let mut parameters: Vec<&ParameterSpec> = ancestors
            .iter()
            .flat_map(|&ancestor| self.node(ancestor).parameters.iter())
            .filter(|spec| !spec.is_positional())
            .collect();
        parameters.extend(self.node(target).parameters.iter());
        parameters
    }
}

impl<H> fmt::Debug for CommandTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.nodes)
            .field("converters", &self.converters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CommandBuilder, TreeBuilder};
    use crate::types::ValueKind;

    fn sample() -> CommandTree<()> {
        TreeBuilder::new(
            CommandBuilder::branch("app")
                .with_parameter(ParameterSpec::flag("verbose"))
                .with_child(
                    CommandBuilder::branch("remote")
                        .with_alias("rem")
                        .with_child(
                            CommandBuilder::leaf("add", ())
                                .with_parameter(ParameterSpec::required("url", ValueKind::String)),
                        )
                        .with_child(CommandBuilder::leaf("list", ()).hidden()),
                ),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_path_and_display_path() {
        let tree = sample();
        let add = tree.find_path(&["remote", "add"], CaseSensitivity::All).unwrap();

        assert_eq!(tree.path(add).len(), 3);
        assert_eq!(tree.display_path(add), "app remote add");
    }

    #[test]
    fn test_display_path_omits_default_command() {
        let tree = TreeBuilder::new(
            CommandBuilder::branch("app").with_child(
                CommandBuilder::branch("db")
                    .with_child(CommandBuilder::leaf("migrate", ()))
                    .with_child(CommandBuilder::default_leaf(())),
            ),
        )
        .build()
        .unwrap();
        let db = tree.find_path(&["db"], CaseSensitivity::All).unwrap();
        let default = tree.default_child(db).unwrap();

        assert!(tree.node(default).is_hidden());
        assert_eq!(tree.display_path(default), "app db");
        assert_eq!(tree.path(default).len(), 3);
    }

    #[test]
    fn test_find_child_by_alias_and_case() {
        let tree = sample();
        assert!(tree.find_child(tree.root(), "rem", true).is_some());
        assert!(tree.find_child(tree.root(), "REMOTE", true).is_none());
        assert!(tree.find_child(tree.root(), "REMOTE", false).is_some());
    }

    #[test]
    fn test_visible_children_skip_hidden() {
        let tree = sample();
        let remote = tree.find_path(&["remote"], CaseSensitivity::All).unwrap();
        assert_eq!(tree.visible_children(remote), vec!["add".to_string()]);
    }

    #[test]
    fn test_effective_parameters_inherit_options() {
        let tree = sample();
        let add = tree.find_path(&["remote", "add"], CaseSensitivity::All).unwrap();
        let names: Vec<&str> = tree
            .effective_parameters(add)
            .iter()
            .map(|spec| spec.name.as_str())
            .collect();
        assert_eq!(names, vec!["verbose", "url"]);
    }
}
