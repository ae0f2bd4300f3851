//! PsList plugin - lists running processes
use crate::error::AnalysisError;
use crate::formats::OutputWriter;
use crate::plugins::plugin_trait::{AnalysisContext, ForensicPlugin};

pub struct PsListPlugin;

impl ForensicPlugin for PsListPlugin {
    fn name(&self) -> &str {
        "pslist"
    }

    fn description(&self) -> &str {
        "List running processes"
    }

    fn run(&self, context: &AnalysisContext, writer: &OutputWriter) -> Result<usize, AnalysisError> {
        writer.write(self.name(), context.tasks()?)
    }
}
