//! Turning resolved sockets into connection records and netstat lines
use crate::error::AnalysisError;
use crate::kernel::ConnectionInfo;
use crate::net::decode::{self, Protocol};
use crate::net::pipeline::SocketEntry;
use crate::net::NetLayout;
use std::io::Write;

/// Decode one socket. `Ok(None)` for protocols the report leaves out.
pub fn decode_entry(
    layout: &NetLayout,
    entry: &SocketEntry,
) -> Result<Option<ConnectionInfo>, AnalysisError> {
    let protocol = decode::decode_protocol(&entry.inet_sock)?;
    if !protocol.is_reported() {
        log::debug!(
            "Dropping {} socket 0x{:x} of pid {}",
            protocol,
            entry.inet_sock.address(),
            entry.task.pid
        );
        return Ok(None);
    }

    let endpoints = decode::decode_endpoints(layout, &entry.inet_sock)?;
    let state = if protocol == Protocol::Tcp {
        decode::decode_state(layout, &entry.inet_sock)?.as_str()
    } else {
        ""
    };

    Ok(Some(ConnectionInfo {
        offset: entry.inet_sock.address(),
        protocol: protocol.as_str().to_string(),
        local_addr: endpoints.local(),
        local_port: endpoints.local_port,
        remote_addr: endpoints.remote(),
        remote_port: endpoints.remote_port,
        state: state.to_string(),
        pid: entry.task.pid,
        comm: entry.task.comm.clone(),
        fd: entry.fd,
    }))
}

/// Lazily decode a socket stream into reportable connections.
pub fn connections<'a, I>(
    layout: &'a NetLayout,
    sockets: I,
) -> impl Iterator<Item = ConnectionInfo> + 'a
where
    I: Iterator<Item = SocketEntry<'a>> + 'a,
{
    sockets.filter_map(move |entry| match decode_entry(layout, &entry) {
        Ok(conn) => conn,
        Err(e) => {
            log::warn!(
                "Skipping socket 0x{:x} of pid {}: {}",
                entry.inet_sock.address(),
                entry.task.pid,
                e
            );
            None
        }
    })
}

/// `PROTO  laddr:lport  raddr:rport  STATE  comm/pid`
pub fn format_line(conn: &ConnectionInfo) -> String {
    let line = format!(
        "{:<8} {}:{:<5} {}:{:<5} {} {:>17}/{:<5}",
        conn.protocol,
        conn.local_addr,
        conn.local_port,
        conn.remote_addr,
        conn.remote_port,
        conn.state,
        conn.comm,
        conn.pid
    );
    line.trim_end().to_string()
}

/// Write one line per connection as it arrives. Returns the line count.
pub fn render_text<W, I>(connections: I, out: &mut W) -> std::io::Result<usize>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = ConnectionInfo>,
{
    let mut count = 0;
    for conn in connections {
        writeln!(out, "{}", format_line(&conn))?;
        count += 1;
    }
    Ok(count)
}
