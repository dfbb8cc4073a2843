//! Output boundary of the built-in introspection commands.
//!
//! The `cli version`, `cli explain` and `cli xmldoc` commands collect data
//! and hand it to an [`Introspector`]; the layout of that output belongs to
//! the introspector. [`JsonIntrospector`] writes plain text and JSON.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use command_tree_core::CommandModel;

/// Writes the output of the built-in commands.
pub trait Introspector: Send + Sync {
    fn version(&self, name: &str, version: &str) -> io::Result<()>;

    /// Describes a command subtree; `detailed` includes parameters.
    fn explain(&self, model: &CommandModel, detailed: bool) -> io::Result<()>;

    /// Exports documentation for the whole tree.
    fn xmldoc(&self, model: &CommandModel) -> io::Result<()>;
}

/// Introspector that writes JSON snapshots to a writer (stdout by default).
pub struct JsonIntrospector {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonIntrospector {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    fn write_with<F>(&self, write: F) -> io::Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("introspection writer poisoned"))?;
        write(&mut **out)?;
        out.flush()
    }
}

impl Default for JsonIntrospector {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl fmt::Debug for JsonIntrospector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonIntrospector").finish_non_exhaustive()
    }
}

fn strip_parameters(model: &mut CommandModel) {
    model.parameters.clear();
    model.children.iter_mut().for_each(strip_parameters);
}

impl Introspector for JsonIntrospector {
    fn version(&self, name: &str, version: &str) -> io::Result<()> {
        self.write_with(|out| writeln!(out, "{name} {version}"))
    }

    fn explain(&self, model: &CommandModel, detailed: bool) -> io::Result<()> {
        let mut model = model.clone();
        if !detailed {
            strip_parameters(&mut model);
        }
        self.write_with(|out| {
            serde_json::to_writer_pretty(&mut *out, &model)?;
            writeln!(out)
        })
    }

    fn xmldoc(&self, model: &CommandModel) -> io::Result<()> {
        self.write_with(|out| {
            serde_json::to_writer_pretty(&mut *out, model)?;
            writeln!(out)
        })
    }
}
