//! The fixed set of commands the CLI understands.

use std::io::Write;

use anyhow::Result;
use odt_core::SessionStore;

use crate::commands::{info, list, report, start, stop};

/// A named unit of CLI behaviour.
pub trait Command {
    /// Name used for dispatch; unique within a [`Registry`].
    fn name(&self) -> &'static str;

    /// Short description of the arguments, shown after the name.
    fn usage_desc(&self) -> &'static str;

    /// One-line description for the command listing.
    fn desc(&self) -> &'static str;

    /// Parses the arguments that followed the command's name.
    ///
    /// Returns `Ok(None)` when the arguments asked for help, which has then
    /// been written to `out`. Parsing never touches the session store.
    fn parse(&self, args: &[String], out: &mut dyn Write) -> Result<Option<Box<dyn Action>>>;

    /// Writes detailed usage for the command.
    fn help(&self, out: &mut dyn Write) -> Result<()>;

    /// Parses `args` and runs the resulting action against `store`.
    fn run(
        &self,
        args: &[String],
        store: &mut dyn SessionStore,
        out: &mut dyn Write,
    ) -> Result<()> {
        match self.parse(args, out)? {
            Some(action) => action.run(store, out),
            None => Ok(()),
        }
    }
}

/// A command invocation with its arguments already parsed.
pub trait Action {
    fn run(self: Box<Self>, store: &mut dyn SessionStore, out: &mut dyn Write) -> Result<()>;
}

/// Ordered, immutable collection of commands.
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
}

impl Registry {
    pub fn new(commands: Vec<Box<dyn Command>>) -> Self {
        Self { commands }
    }

    /// The commands shipped with the tool.
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(info::Info),
            Box::new(list::List),
            Box::new(report::Report),
            Box::new(start::Start),
            Box::new(stop::Stop),
        ])
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .map(AsRef::as_ref)
    }

    /// All commands in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(AsRef::as_ref)
    }
}
