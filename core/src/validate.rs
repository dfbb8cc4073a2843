//! Structural validation of command trees.
//!
//! Checks the invariants a tree must satisfy before it is used: unique
//! sibling names and aliases, well-placed default commands, non-empty
//! branches, well-formed parameter names, positional ordering and
//! convertible defaults. Every check stops at the first problem, so the
//! returned list holds at most one error per call.
//!
//! [`validate_examples`] additionally parses every declared example, and
//! [`validate_default_assignment`] checks defaults against settings types.
//!
//! # Examples
//!
//! ```
//! use command_tree_core::*;
//!
//! let bad = TreeBuilder::new(
//!     CommandBuilder::leaf("cp", ())
//!         .with_parameter(ParameterSpec::optional("source", ValueKind::String))
//!         .with_parameter(ParameterSpec::required("dest", ValueKind::String)),
//! )
//! .build();
//! assert!(matches!(
//!     bad,
//!     Err(ConfigurationError::RequiredAfterOptional { .. })
//! ));
//! ```

use std::collections::HashSet;

use crate::error::ConfigurationError;
use crate::parser::parse;
use crate::services::NoServices;
use crate::tree::{CommandTree, NodeId};
use crate::types::{
    CaseSensitivity, CommandKind, ParameterKind, ParameterSpec, ParserSettings, ValueArity,
    ValueKind,
};
use crate::value::Value;

/// Validates every node of a tree.
pub fn validate_tree<H>(tree: &CommandTree<H>, case: CaseSensitivity) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();

    for id in tree.ids() {
        errors.extend(validate_node(tree, id, case));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_node<H>(
    tree: &CommandTree<H>,
    id: NodeId,
    case: CaseSensitivity,
) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();
    let node = tree.node(id);
    let command = tree.display_path(id);

    if let Some(parent) = node.parent() {
        if node.name().trim().is_empty() {
            errors.push(ConfigurationError::EmptyCommandName {
                parent: tree.display_path(parent),
            });
            return errors;
        }
    }

    match node.kind() {
        CommandKind::Branch => {
            if node.children().is_empty() {
                errors.push(ConfigurationError::EmptyBranch { branch: command });
                return errors;
            }
            let defaults = node
                .children()
                .iter()
                .filter(|&&child| tree.node(child).kind() == CommandKind::DefaultLeaf)
                .count();
            if defaults > 1 {
                errors.push(ConfigurationError::MultipleDefaultCommands { branch: command });
                return errors;
            }
        }
        CommandKind::Leaf | CommandKind::DefaultLeaf => {
            if !node.children().is_empty() {
                errors.push(ConfigurationError::LeafWithChildren { command });
                return errors;
            }
        }
    }

    if node.kind() == CommandKind::DefaultLeaf {
        let under_branch = node
            .parent()
            .is_some_and(|parent| tree.node(parent).kind() == CommandKind::Branch);
        if !under_branch {
            errors.push(ConfigurationError::MisplacedDefaultCommand { command });
            return errors;
        }
    }

    errors.extend(validate_children(tree, id, case));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_parameters(tree, id, case));
    errors
}

/// Checks that every default an executable command receives, inherited
/// ones included, is accepted by its settings type.
///
/// Each default is assigned to a default-constructed settings instance.
/// Commands whose settings only come from a service resolver are skipped.
/// Trees that are only parsed never instantiate settings, so this check is
/// separate from [`validate_tree`].
pub fn validate_default_assignment<H>(tree: &CommandTree<H>) -> Vec<ConfigurationError> {
    tree.ids()
        .filter_map(|id| check_default_assignment(tree, id))
        .take(1)
        .collect()
}

fn check_default_assignment<H>(tree: &CommandTree<H>, id: NodeId) -> Option<ConfigurationError> {
    let node = tree.node(id);
    if !node.kind().is_executable() {
        return None;
    }
    let mut settings = node.settings_type()?.construct(&NoServices)?;

    for spec in tree.effective_parameters(id) {
        let Some(default) = &spec.default_value else {
            continue;
        };
        let Ok(value) = tree.converters().convert(&spec.value_kind, default) else {
            continue;
        };
        let value = match spec.arity {
            ValueArity::Single => value,
            ValueArity::Multiple => Value::List(vec![value]),
        };
        if let Err(err) = settings.assign(&spec.name, value) {
            return Some(ConfigurationError::UnassignableDefault {
                command: tree.display_path(id),
                parameter: spec.name.clone(),
                reason: err.to_string(),
            });
        }
    }
    None
}

fn validate_children<H>(
    tree: &CommandTree<H>,
    id: NodeId,
    case: CaseSensitivity,
) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let fold = |name: &str| {
        if case.commands() {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    };

    for &child in tree.node(id).children() {
        let node = tree.node(child);
        let by_name = (node.kind() != CommandKind::DefaultLeaf).then(|| node.name());
        for name in by_name.into_iter().chain(node.aliases().iter().map(String::as_str)) {
            if !seen.insert(fold(name)) {
                errors.push(ConfigurationError::DuplicateCommand {
                    parent: tree.display_path(id),
                    name: name.to_string(),
                });
                return errors;
            }
        }
    }

    errors
}

fn validate_parameters<H>(
    tree: &CommandTree<H>,
    id: NodeId,
    case: CaseSensitivity,
) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();
    let node = tree.node(id);
    let command = tree.display_path(id);

    for spec in node.parameters() {
        if let Some(error) = validate_parameter(tree, &command, node.kind(), spec) {
            errors.push(error);
            return errors;
        }
    }

    let positionals: Vec<&ParameterSpec> = node
        .parameters()
        .iter()
        .filter(|spec| spec.is_positional())
        .collect();
    let mut seen_optional = false;
    for (index, spec) in positionals.iter().enumerate() {
        if spec.arity == ValueArity::Multiple && index + 1 != positionals.len() {
            errors.push(ConfigurationError::MultiplePositionalNotLast {
                command,
                parameter: spec.name.clone(),
            });
            return errors;
        }
        if spec.required && seen_optional {
            errors.push(ConfigurationError::RequiredAfterOptional {
                command,
                parameter: spec.name.clone(),
            });
            return errors;
        }
        seen_optional |= !spec.required;
    }

    let mut names = HashSet::new();
    let mut longs = HashSet::new();
    let mut shorts = HashSet::new();
    for spec in tree.effective_parameters(id) {
        let duplicate_long = spec.long.as_ref().is_some_and(|long| {
            let folded = if case.long_options() {
                long.clone()
            } else {
                long.to_lowercase()
            };
            !longs.insert(folded)
        });
        let duplicate_short = spec.short.is_some_and(|short| !shorts.insert(short));
        if !names.insert(spec.name.as_str()) || duplicate_long || duplicate_short {
            errors.push(ConfigurationError::DuplicateParameter {
                command,
                name: spec.display_name(),
            });
            return errors;
        }
    }

    errors
}

fn validate_parameter<H>(
    tree: &CommandTree<H>,
    command: &str,
    kind: CommandKind,
    spec: &ParameterSpec,
) -> Option<ConfigurationError> {
    let command = command.to_string();
    let parameter = spec.name.clone();

    if spec.name.trim().is_empty() {
        return Some(ConfigurationError::MissingParameterName { command, parameter });
    }

    match spec.kind {
        ParameterKind::Positional => {
            if kind == CommandKind::Branch {
                return Some(ConfigurationError::BranchPositional { command, parameter });
            }
        }
        ParameterKind::Option | ParameterKind::Flag => {
            if spec.long.is_none() && spec.short.is_none() {
                return Some(ConfigurationError::MissingParameterName { command, parameter });
            }
            if let Some(long) = &spec.long {
                if !is_valid_long(long) {
                    return Some(ConfigurationError::InvalidLongName {
                        command,
                        name: long.clone(),
                    });
                }
            }
            if let Some(short) = spec.short {
                if short == '-' || short == '=' || short.is_whitespace() {
                    return Some(ConfigurationError::InvalidShortName {
                        command,
                        name: short,
                    });
                }
            }
        }
    }

    if spec.kind == ParameterKind::Flag && spec.arity == ValueArity::Multiple {
        return Some(ConfigurationError::MultipleFlag { command, parameter });
    }

    if spec.required && spec.default_value.is_some() {
        return Some(ConfigurationError::RequiredWithDefault { command, parameter });
    }

    if let ValueKind::Custom(ty) = &spec.value_kind {
        if !tree.converters().contains(ty) {
            return Some(ConfigurationError::UnknownConverter {
                command,
                parameter,
                type_name: ty.name.to_string(),
            });
        }
    }

    if let Some(value) = &spec.default_value {
        if let Err(reason) = tree.converters().convert(&spec.value_kind, value) {
            return Some(ConfigurationError::InvalidDefault {
                command,
                parameter,
                value: value.clone(),
                reason,
            });
        }
    }

    None
}

fn is_valid_long(long: &str) -> bool {
    !long.is_empty()
        && !long.starts_with('-')
        && !long.contains('=')
        && !long.chars().any(char::is_whitespace)
}

/// Parses every example declared in the tree.
///
/// Examples are full argument vectors starting at the root. An example is
/// valid when it resolves to an executable command and binds without error.
pub fn validate_examples<H>(
    tree: &CommandTree<H>,
    settings: &ParserSettings,
) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();

    for id in tree.ids() {
        for example in tree.node(id).examples() {
            if let Err(err) = parse(tree, example, settings) {
                errors.push(ConfigurationError::InvalidExample {
                    command: tree.display_path(id),
                    example: example.join(" "),
                    reason: err.to_string(),
                });
                return errors;
            }
        }
    }

    errors
}
