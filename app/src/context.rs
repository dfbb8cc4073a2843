//! Per-run command context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use command_tree_core::{CommandNode, CommandTree, NodeData, NodeId};

use crate::cancel::CancellationToken;
use crate::command::Handler;

/// What a command sees about the run that invoked it.
#[derive(Clone)]
pub struct CommandContext {
    tree: Arc<CommandTree<Handler>>,
    target: NodeId,
    path: Vec<NodeId>,
    remaining: Vec<String>,
    cancellation: CancellationToken,
}

impl CommandContext {
    pub(crate) fn new(
        tree: Arc<CommandTree<Handler>>,
        target: NodeId,
        path: Vec<NodeId>,
        remaining: Vec<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            tree,
            target,
            path,
            remaining,
            cancellation,
        }
    }

    /// Name of the resolved command.
    pub fn name(&self) -> &str {
        self.node().name()
    }

    /// Names from the root down to the resolved command.
    pub fn path(&self) -> Vec<&str> {
        self.path
            .iter()
            .map(|&id| self.tree.node(id).name())
            .collect()
    }

    /// The path as a space-separated string.
    pub fn command_path(&self) -> String {
        self.tree.display_path(self.target)
    }

    /// Arguments that were not bound to any parameter.
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    /// Value attached to the command with `with_data`.
    pub fn data(&self) -> Option<&NodeData> {
        self.node().data()
    }

    /// The attached value as `T`.
    pub fn data_as<T: Any>(&self) -> Option<&T> {
        self.data().and_then(|data| data.downcast_ref::<T>())
    }

    pub fn node(&self) -> &CommandNode<Handler> {
        self.tree.node(self.target)
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn tree(&self) -> &CommandTree<Handler> {
        &self.tree
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command_path())
            .field("remaining", &self.remaining)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
