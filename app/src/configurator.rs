//! Registration of commands on an application.
//!
//! A [`Configurator`] wraps one level of the tree; commands and branches
//! added through it return a [`CommandConfigurator`] for further chaining.

use std::any::Any;
use std::sync::Arc;

use command_tree_core::{CommandBuilder, ParameterSpec, Settings, SettingsType};

use crate::command::{
    AsyncDelegateCommand, BoxFuture, Command, CommandResult, DelegateCommand, Handler,
};
use crate::context::CommandContext;

/// Adds commands to one branch of the tree.
pub struct Configurator<'a> {
    node: &'a mut CommandBuilder<Handler>,
}

impl<'a> Configurator<'a> {
    pub(crate) fn new(node: &'a mut CommandBuilder<Handler>) -> Self {
        Self { node }
    }

    fn push(&mut self, child: CommandBuilder<Handler>) -> CommandConfigurator<'_> {
        CommandConfigurator {
            node: self.node.push_child(child),
        }
    }

    /// Adds a command whose settings are resolved from services or
    /// default-constructed.
    pub fn add_command<C>(&mut self, name: &str, command: C) -> CommandConfigurator<'_>
    where
        C: Command,
        C::Settings: Default,
    {
        self.push(
            CommandBuilder::leaf(name, Arc::new(command) as Handler)
                .with_settings(SettingsType::of::<C::Settings>()),
        )
    }

    /// Adds a command whose settings must come from the service resolver.
    pub fn add_resolved_command<C: Command>(
        &mut self,
        name: &str,
        command: C,
    ) -> CommandConfigurator<'_> {
        self.push(
            CommandBuilder::leaf(name, Arc::new(command) as Handler)
                .with_settings(SettingsType::resolved::<C::Settings>()),
        )
    }

    /// Adds a command backed by a synchronous closure.
    pub fn add_delegate<S, F>(&mut self, name: &str, func: F) -> CommandConfigurator<'_>
    where
        S: Settings + Default,
        F: Fn(&CommandContext, &S) -> i32 + Send + Sync + 'static,
    {
        self.add_command(name, DelegateCommand::new(func))
    }

    /// Adds a command backed by an asynchronous closure.
    pub fn add_async_delegate<S, F>(&mut self, name: &str, func: F) -> CommandConfigurator<'_>
    where
        S: Settings + Default,
        F: for<'c> Fn(&'c CommandContext, &'c S) -> BoxFuture<'c, CommandResult>
            + Send
            + Sync
            + 'static,
    {
        self.add_command(name, AsyncDelegateCommand::new(func))
    }

    /// Adds a branch and configures its children.
    pub fn add_branch<F>(&mut self, name: &str, configure: F) -> CommandConfigurator<'_>
    where
        F: FnOnce(&mut Configurator<'_>),
    {
        let branch = self.node.push_child(CommandBuilder::branch(name));
        configure(&mut Configurator::new(&mut *branch));
        CommandConfigurator { node: branch }
    }

    /// Adds a branch whose settings' options are inherited by its commands.
    pub fn add_branch_with<S, F>(&mut self, name: &str, configure: F) -> CommandConfigurator<'_>
    where
        S: Settings + Default,
        F: FnOnce(&mut Configurator<'_>),
    {
        let branch = self.node.push_child(
            CommandBuilder::branch(name).with_settings(SettingsType::of::<S>()),
        );
        configure(&mut Configurator::new(&mut *branch));
        CommandConfigurator { node: branch }
    }

    /// Sets the command run when this branch gets no matching command word.
    pub fn set_default_command<C>(&mut self, command: C) -> CommandConfigurator<'_>
    where
        C: Command,
        C::Settings: Default,
    {
        self.push(
            CommandBuilder::default_leaf(Arc::new(command) as Handler)
                .with_settings(SettingsType::of::<C::Settings>()),
        )
    }

    /// Declares an option or flag on this branch.
    pub fn add_parameter(&mut self, parameter: ParameterSpec) -> &mut Self {
        self.node.add_parameter(parameter);
        self
    }

    /// Adds an example argument vector (starting at the root).
    pub fn add_example<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node.add_example(args);
        self
    }
}

/// Further configuration of a just-added command or branch.
pub struct CommandConfigurator<'a> {
    node: &'a mut CommandBuilder<Handler>,
}

impl CommandConfigurator<'_> {
    pub fn with_alias(&mut self, alias: &str) -> &mut Self {
        self.node.add_alias(alias);
        self
    }

    pub fn with_description(&mut self, description: &str) -> &mut Self {
        self.node.set_description(description);
        self
    }

    /// Adds an example argument vector (starting at the root).
    pub fn with_example<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node.add_example(args);
        self
    }

    pub fn with_data<T: Any + Send + Sync>(&mut self, data: T) -> &mut Self {
        self.node.set_data(data);
        self
    }

    pub fn with_parameter(&mut self, parameter: ParameterSpec) -> &mut Self {
        self.node.add_parameter(parameter);
        self
    }

    pub fn hidden(&mut self) -> &mut Self {
        self.node.set_hidden(true);
        self
    }
}
