//! Resolution of the target command from leading command words.

use tracing::debug;

use crate::error::ParseError;
use crate::tokenizer::Token;
use crate::tree::{CommandTree, NodeId};
use crate::types::CaseSensitivity;

/// Target command selected by the [`TreeResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Executable node to run.
    pub target: NodeId,
    /// Nodes from the root down to the target, inclusive.
    pub path: Vec<NodeId>,
    /// Tokens left after the command words, in their original order.
    pub residual: Vec<Token>,
}

/// Walks a [`CommandTree`] along the leading command words.
///
/// Commands always form a contiguous prefix of the arguments: descent
/// stops at the first token that is not a matching command word.
///
/// # Examples
///
/// ```
/// use command_tree_core::*;
///
/// let tree = TreeBuilder::new(
///     CommandBuilder::branch("app")
///         .with_child(CommandBuilder::leaf("add", ()))
///         .with_child(CommandBuilder::default_leaf(())),
/// )
/// .build()
/// .unwrap();
///
/// let resolver = TreeResolver::new(&tree, CaseSensitivity::All);
///
/// let tokens = vec![Token::CommandWord("add".into())];
/// let resolution = resolver.resolve(&tokens).unwrap();
/// assert_eq!(tree.node(resolution.target).name(), "add");
///
/// // No matching word: the default command runs and keeps the word.
/// let tokens = vec![Token::CommandWord("other".into())];
/// let resolution = resolver.resolve(&tokens).unwrap();
/// assert_eq!(tree.node(resolution.target).kind(), CommandKind::DefaultLeaf);
/// assert_eq!(resolution.residual, tokens);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreeResolver<'t, H> {
    tree: &'t CommandTree<H>,
    case_sensitive: bool,
}

impl<'t, H> TreeResolver<'t, H> {
    pub fn new(tree: &'t CommandTree<H>, case: CaseSensitivity) -> Self {
        Self {
            tree,
            case_sensitive: case.commands(),
        }
    }

    /// Selects the target command.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownCommand`] when a word matches no child
    /// of a branch without a default command, and
    /// [`ParseError::MissingCommand`] when such a branch is reached with no
    /// word at all.
    pub fn resolve(&self, tokens: &[Token]) -> Result<Resolution, ParseError> {
        let tree = self.tree;
        let mut current = tree.root();
        let mut path = vec![current];
        let mut consumed = 0;
        let mut unmatched = None;

        while !tree.node(current).children().is_empty() {
            let Some(Token::CommandWord(word)) = tokens.get(consumed) else {
                break;
            };
            match tree.find_child(current, word, self.case_sensitive) {
                Some(child) => {
                    debug!(command = %word, "descending into command");
                    current = child;
                    path.push(child);
                    consumed += 1;
                }
                None => {
                    unmatched = Some(word.clone());
                    break;
                }
            }
        }

        if !tree.node(current).is_executable() {
            match tree.default_child(current) {
                Some(default) => {
                    debug!(branch = tree.node(current).name(), "falling back to default command");
                    current = default;
                    path.push(default);
                }
                None => {
                    let path = tree.display_path(current);
                    let available = tree.visible_children(current);
                    return Err(match unmatched {
                        Some(command) => ParseError::UnknownCommand {
                            command,
                            path,
                            available,
                        },
                        None => ParseError::MissingCommand { path, available },
                    });
                }
            }
        }

        debug!(target = %tree.display_path(current), "resolved command");
        Ok(Resolution {
            target: current,
            path,
            residual: tokens[consumed..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CommandBuilder, TreeBuilder};

    fn tree() -> CommandTree<()> {
        TreeBuilder::new(
            CommandBuilder::branch("git")
                .with_child(
                    CommandBuilder::branch("remote")
                        .with_child(CommandBuilder::leaf("add", ()))
                        .with_child(CommandBuilder::leaf("prune", ()).hidden()),
                )
                .with_child(CommandBuilder::leaf("status", ()).with_alias("st")),
        )
        .build()
        .unwrap()
    }

    fn words(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| Token::CommandWord(w.to_string())).collect()
    }

    #[test]
    fn test_resolves_nested_command() {
        let tree = tree();
        let resolution = TreeResolver::new(&tree, CaseSensitivity::All)
            .resolve(&words(&["remote", "add", "origin"]))
            .unwrap();

        assert_eq!(tree.display_path(resolution.target), "git remote add");
        assert_eq!(resolution.path.len(), 3);
        assert_eq!(resolution.residual, words(&["origin"]));
    }

    #[test]
    fn test_unknown_command_lists_visible_children() {
        let tree = tree();
        let err = TreeResolver::new(&tree, CaseSensitivity::All)
            .resolve(&words(&["remote", "rename"]))
            .unwrap_err();

        assert_eq!(
            err,
            ParseError::UnknownCommand {
                command: "rename".into(),
                path: "git remote".into(),
                available: vec!["add".into()],
            }
        );
    }

    #[test]
    fn test_missing_command_when_option_follows_branch() {
        let tree = tree();
        let tokens = vec![Token::LongOption {
            name: "help".into(),
            value: None,
        }];
        let err = TreeResolver::new(&tree, CaseSensitivity::All)
            .resolve(&tokens)
            .unwrap_err();

        assert!(matches!(err, ParseError::MissingCommand { ref path, .. } if path == "git"));
    }

    #[test]
    fn test_case_insensitive_commands() {
        let tree = tree();
        assert!(TreeResolver::new(&tree, CaseSensitivity::All)
            .resolve(&words(&["ST"]))
            .is_err());
        assert!(TreeResolver::new(&tree, CaseSensitivity::LongOptions)
            .resolve(&words(&["ST"]))
            .is_ok());
    }

    #[test]
    fn test_words_after_leaf_are_residual() {
        let tree = tree();
        let resolution = TreeResolver::new(&tree, CaseSensitivity::All)
            .resolve(&words(&["status", "remote"]))
            .unwrap();
        assert_eq!(tree.node(resolution.target).name(), "status");
        assert_eq!(resolution.residual, words(&["remote"]));
    }
}
