//! Call Tree Exporters
//!
//! Write a rendered call tree as tab-indented text or as JSON.

use std::io::{Result, Write};

use crate::domain::traversal::TreeLine;

pub trait TreeExporter {
    /// File extension for artifacts written by this exporter, if any.
    fn extension(&self) -> Option<&'static str>;
    fn export(&self, lines: &[TreeLine], out: &mut dyn Write) -> Result<()>;
}

/// `{tabs}{name} ({path})`, one line per visited node.
pub struct TextTreeExporter;

impl TreeExporter for TextTreeExporter {
    fn extension(&self) -> Option<&'static str> {
        None
    }

    fn export(&self, lines: &[TreeLine], out: &mut dyn Write) -> Result<()> {
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

/// JSON array of `{ depth, name, path }` in visit order.
pub struct JsonTreeExporter;

impl TreeExporter for JsonTreeExporter {
    fn extension(&self) -> Option<&'static str> {
        Some("json")
    }

    fn export(&self, lines: &[TreeLine], out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, lines)?;
        writeln!(out)
    }
}
