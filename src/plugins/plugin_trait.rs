//! Plugin system trait and the context every plugin runs against
use crate::core::profile::Profile;
use crate::error::AnalysisError;
use crate::formats::OutputWriter;
use crate::kernel::{ProcessInfo, TaskWalker};
use crate::memory::AddressSpace;
use regex::Regex;

/// Restricts which tasks a plugin looks at.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub pid: Option<i32>,
    pub name: Option<Regex>,
}

impl TaskFilter {
    pub fn new(pid: Option<i32>, name: Option<&str>) -> Result<Self, AnalysisError> {
        let name = name.map(Regex::new).transpose()?;
        Ok(TaskFilter { pid, name })
    }

    pub fn matches(&self, task: &ProcessInfo) -> bool {
        if let Some(pid) = self.pid {
            if task.pid != pid {
                return false;
            }
        }
        match &self.name {
            Some(re) => re.is_match(&task.comm),
            None => true,
        }
    }
}

/// Analysis context that provides access to all necessary components
pub struct AnalysisContext<'a> {
    pub profile: &'a Profile,
    pub space: &'a dyn AddressSpace,
    pub filter: TaskFilter,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(profile: &'a Profile, space: &'a dyn AddressSpace, filter: TaskFilter) -> Self {
        AnalysisContext {
            profile,
            space,
            filter,
        }
    }

    /// The process list with the task filter applied.
    pub fn tasks(&self) -> Result<impl Iterator<Item = ProcessInfo> + '_, AnalysisError> {
        let filter = &self.filter;
        let walker = TaskWalker::new(self.profile, self.space)?;
        Ok(walker.filter(move |task| filter.matches(task)))
    }
}

/// Trait that all forensic plugins must implement
pub trait ForensicPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run the plugin, streaming its records into `writer`. Returns the
    /// number of records written.
    fn run(&self, context: &AnalysisContext, writer: &OutputWriter) -> Result<usize, AnalysisError>;
}
