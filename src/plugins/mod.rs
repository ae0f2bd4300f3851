//! Analysis plugins selectable from the command line
pub mod files;
pub mod netstat;
pub mod plugin_trait;
pub mod pslist;

pub use files::FilesPlugin;
pub use netstat::NetStatPlugin;
pub use plugin_trait::{AnalysisContext, ForensicPlugin, TaskFilter};
pub use pslist::PsListPlugin;

