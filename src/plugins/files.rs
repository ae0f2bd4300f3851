//! Files plugin - lists open file handles and flags the sockets
use crate::error::AnalysisError;
use crate::formats::OutputWriter;
use crate::kernel::{FileInfo, OpenFileRecord, OpenFileWalker};
use crate::plugins::plugin_trait::{AnalysisContext, ForensicPlugin};

pub struct FilesPlugin;

fn classify(
    context: &AnalysisContext,
    socket_file_ops: Option<u64>,
    record: &OpenFileRecord,
) -> Result<FileInfo, AnalysisError> {
    let f_op = context
        .profile
        .object("file", record.file, record.space)?
        .read_pointer("f_op")?;
    let kind = if Some(f_op) == socket_file_ops {
        "socket"
    } else {
        "file"
    };
    Ok(FileInfo {
        pid: record.task.pid,
        comm: record.task.comm.clone(),
        fd: record.fd,
        file: record.file,
        f_op,
        kind: kind.to_string(),
    })
}

impl ForensicPlugin for FilesPlugin {
    fn name(&self) -> &str {
        "files"
    }

    fn description(&self) -> &str {
        "List open file handles"
    }

    fn run(&self, context: &AnalysisContext, writer: &OutputWriter) -> Result<usize, AnalysisError> {
        let socket_file_ops = match context.profile.symbol("socket_file_ops") {
            Ok(address) => Some(address),
            Err(e) => {
                log::warn!("{}; sockets will be listed as plain files", e);
                None
            }
        };
        let records = OpenFileWalker::new(context.profile, context.space, context.tasks()?)?;
        let files = records.filter_map(|record| match classify(context, socket_file_ops, &record) {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!(
                    "Skipping fd {} of pid {}, file 0x{:x}: {}",
                    record.fd,
                    record.task.pid,
                    record.file,
                    e
                );
                None
            }
        });
        writer.write(self.name(), files)
    }
}
