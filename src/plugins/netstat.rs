//! NetStat plugin - reconstructs sockets from open file descriptors
use crate::error::AnalysisError;
use crate::formats::OutputWriter;
use crate::kernel::OpenFileWalker;
use crate::net::{render, NetLayout, SocketScanner};
use crate::plugins::plugin_trait::{AnalysisContext, ForensicPlugin};

pub struct NetStatPlugin;

impl ForensicPlugin for NetStatPlugin {
    fn name(&self) -> &str {
        "netstat"
    }

    fn description(&self) -> &str {
        "List TCP and UDP sockets held open by each process"
    }

    fn run(&self, context: &AnalysisContext, writer: &OutputWriter) -> Result<usize, AnalysisError> {
        let layout = NetLayout::check(context.profile)?;
        let files = OpenFileWalker::new(context.profile, context.space, context.tasks()?)?;
        let sockets = SocketScanner::new(context.profile, &layout, files);
        writer.write(self.name(), render::connections(&layout, sockets))
    }
}
