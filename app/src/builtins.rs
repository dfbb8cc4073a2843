//! Hidden built-in commands registered under the `cli` branch.

use std::sync::Arc;

use async_trait::async_trait;
use command_tree_core::{
    AssignError, CaseSensitivity, CommandBuilder, CommandModel, ParameterSpec,
    Settings, SettingsType, Value, ValueKind,
};

use crate::command::{Command, CommandResult, Handler};
use crate::context::CommandContext;
use crate::introspect::Introspector;

/// Name of the hidden branch holding the built-in commands.
pub const BUILTIN_BRANCH: &str = "cli";

/// Builds the hidden `cli` branch.
pub(crate) fn branch(
    introspector: Arc<dyn Introspector>,
    name: String,
    version: String,
    case: CaseSensitivity,
) -> CommandBuilder<Handler> {
    let version = VersionCommand {
        introspector: Arc::clone(&introspector),
        name,
        version,
    };
    let explain = ExplainCommand {
        introspector: Arc::clone(&introspector),
        case,
    };
    let xmldoc = XmlDocCommand { introspector };

    CommandBuilder::branch(BUILTIN_BRANCH)
        .hidden()
        .with_description("Commands for inspecting this application")
        .with_child(
            CommandBuilder::leaf("version", Arc::new(version) as Handler)
                .with_settings(SettingsType::of::<InheritedOnly>())
                .with_description("Displays the application version"),
        )
        .with_child(
            CommandBuilder::leaf("explain", Arc::new(explain) as Handler)
                .with_settings(SettingsType::of::<ExplainSettings>())
                .with_description("Describes the configured commands"),
        )
        .with_child(
            CommandBuilder::leaf("xmldoc", Arc::new(xmldoc) as Handler)
                .with_settings(SettingsType::of::<InheritedOnly>())
                .with_description("Exports documentation for the command tree"),
        )
}

/// Settings of `cli version` and `cli xmldoc`.
///
/// They declare nothing and ignore options inherited from the root.
#[derive(Debug, Clone, Copy, Default)]
struct InheritedOnly;

impl Settings for InheritedOnly {
    fn assign(&mut self, _parameter: &str, _value: Value) -> Result<(), AssignError> {
        Ok(())
    }
}

struct VersionCommand {
    introspector: Arc<dyn Introspector>,
    name: String,
    version: String,
}

#[async_trait]
impl Command for VersionCommand {
    type Settings = InheritedOnly;

    async fn execute(&self, _context: &CommandContext, _settings: &InheritedOnly) -> CommandResult {
        self.introspector.version(&self.name, &self.version)?;
        Ok(0)
    }
}

/// Settings of `cli explain`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplainSettings {
    /// Command path to describe; empty for the whole tree.
    pub commands: Vec<String>,
    pub detailed: bool,
    pub include_hidden: bool,
}

impl Settings for ExplainSettings {
    fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::optional("commands", ValueKind::String)
                .allow_multiple()
                .with_description("Path of the command to explain"),
            ParameterSpec::flag("detailed")
                .with_short('d')
                .with_description("Include parameters"),
            ParameterSpec::flag("include_hidden")
                .with_long("hidden")
                .with_description("Include hidden commands"),
        ]
    }

    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
        match parameter {
            "commands" => self.commands = value.into_typed()?,
            "detailed" => self.detailed = value.into_typed()?,
            "include_hidden" => self.include_hidden = value.into_typed()?,
            // inherited from the application root
            _ => {}
        }
        Ok(())
    }
}

struct ExplainCommand {
    introspector: Arc<dyn Introspector>,
    case: CaseSensitivity,
}

#[async_trait]
impl Command for ExplainCommand {
    type Settings = ExplainSettings;

    async fn execute(&self, context: &CommandContext, settings: &ExplainSettings) -> CommandResult {
        let tree = context.tree();
        let target = tree
            .find_path(&settings.commands, self.case)
            .ok_or_else(|| format!("no command matches '{}'", settings.commands.join(" ")))?;

        let model = CommandModel::from_tree(tree, target, settings.include_hidden);
        self.introspector.explain(&model, settings.detailed)?;
        Ok(0)
    }
}

struct XmlDocCommand {
    introspector: Arc<dyn Introspector>,
}

#[async_trait]
impl Command for XmlDocCommand {
    type Settings = InheritedOnly;

    async fn execute(&self, context: &CommandContext, _settings: &InheritedOnly) -> CommandResult {
        let tree = context.tree();
        let model = CommandModel::from_tree(tree, tree.root(), false);
        self.introspector.xmldoc(&model)?;
        Ok(0)
    }
}
