//! Serializable snapshot of a command tree.
//!
//! Help renderers and documentation exporters consume [`CommandModel`]
//! instead of the live tree, so they never see handlers or settings
//! factories.

use serde::{Deserialize, Serialize};

use crate::tree::{CommandTree, NodeId};
use crate::types::{CommandKind, ParameterKind, ParameterSpec, ValueArity};

/// Snapshot of one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterModel {
    pub name: String,
    pub kind: ParameterKind,
    pub arity: ValueArity,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&ParameterSpec> for ParameterModel {
    fn from(spec: &ParameterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind,
            arity: spec.arity,
            required: spec.required,
            long: spec.long.clone(),
            short: spec.short,
            position: spec.position,
            value_type: spec.value_kind.type_name(),
            default_value: spec.default_value.clone(),
            description: spec.description.clone(),
        }
    }
}

/// Snapshot of a command and its subtree.
///
/// # Examples
///
/// ```
/// use command_tree_core::*;
///
/// let tree = TreeBuilder::new(
///     CommandBuilder::branch("app")
///         .with_child(CommandBuilder::leaf("run", ()).with_description("Run it"))
///         .with_child(CommandBuilder::leaf("debug", ()).hidden()),
/// )
/// .build()
/// .unwrap();
///
/// let model = CommandModel::from_tree(&tree, tree.root(), false);
/// assert_eq!(model.children.len(), 1);
/// assert_eq!(model.children[0].description.as_deref(), Some("Run it"));
///
/// let json = model.to_json().unwrap();
/// let back: CommandModel = serde_json::from_str(&json).unwrap();
/// assert_eq!(back, model);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Vec<String>>,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandModel>,
}

impl CommandModel {
    /// Snapshots the subtree rooted at `id`.
    ///
    /// Hidden commands are skipped unless `include_hidden` is set; the node
    /// `id` itself is always included.
    pub fn from_tree<H>(tree: &CommandTree<H>, id: NodeId, include_hidden: bool) -> Self {
        let node = tree.node(id);
        let children = node
            .children()
            .iter()
            .filter(|&&child| include_hidden || !tree.node(child).is_hidden())
            .map(|&child| Self::from_tree(tree, child, include_hidden))
            .collect();

        Self {
            name: node.name().to_string(),
            aliases: node.aliases().to_vec(),
            kind: node.kind(),
            description: node.description().map(str::to_string),
            hidden: node.is_hidden(),
            settings: node.settings_type().map(|settings| settings.name().to_string()),
            examples: node.examples().to_vec(),
            parameters: node.parameters().iter().map(ParameterModel::from).collect(),
            children,
        }
    }

    /// Finds a direct child by name.
    pub fn find_child(&self, name: &str) -> Option<&CommandModel> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
