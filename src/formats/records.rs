//! Record implementations for every plugin's result type
use crate::formats::traits::Record;
use crate::kernel::{ConnectionInfo, FileInfo, ProcessInfo};
use crate::net::render;

impl Record for ConnectionInfo {
    fn headers() -> &'static [&'static str] {
        &[
            "offset",
            "protocol",
            "local_addr",
            "local_port",
            "remote_addr",
            "remote_port",
            "state",
            "pid",
            "comm",
            "fd",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format!("0x{:x}", self.offset),
            self.protocol.clone(),
            self.local_addr.clone(),
            self.local_port.to_string(),
            self.remote_addr.clone(),
            self.remote_port.to_string(),
            self.state.clone(),
            self.pid.to_string(),
            self.comm.clone(),
            self.fd.to_string(),
        ]
    }

    fn text_line(&self) -> String {
        render::format_line(self)
    }
}

impl Record for ProcessInfo {
    fn headers() -> &'static [&'static str] {
        &["offset", "pid", "comm"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format!("0x{:x}", self.offset),
            self.pid.to_string(),
            self.comm.clone(),
        ]
    }

    fn text_line(&self) -> String {
        format!("0x{:016x} {:>6} {}", self.offset, self.pid, self.comm)
    }
}

impl Record for FileInfo {
    fn headers() -> &'static [&'static str] {
        &["pid", "comm", "fd", "file", "f_op", "kind"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.pid.to_string(),
            self.comm.clone(),
            self.fd.to_string(),
            format!("0x{:x}", self.file),
            format!("0x{:x}", self.f_op),
            self.kind.clone(),
        ]
    }

    fn text_line(&self) -> String {
        format!(
            "{:>6} {:<16} {:>4} 0x{:016x} 0x{:016x} {}",
            self.pid, self.comm, self.fd, self.file, self.f_op, self.kind
        )
    }
}
