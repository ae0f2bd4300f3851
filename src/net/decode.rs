//! Decoding protocol, state and endpoints out of an `inet_sock`
use crate::core::overlay::StructView;
use crate::error::AnalysisError;
use crate::net::flags::{self, IPPROTO_TCP, IPPROTO_UDP};
use crate::net::NetLayout;
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Other(&'static str),
    Unknown(u8),
}

impl Protocol {
    pub fn from_number(number: u8) -> Self {
        match number {
            IPPROTO_TCP => Protocol::Tcp,
            IPPROTO_UDP => Protocol::Udp,
            n => flags::protocol_name(n).map_or(Protocol::Unknown(n), Protocol::Other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Other(name) => *name,
            Protocol::Unknown(_) => "UNKNOWN",
        }
    }

    /// Only TCP and UDP make it into the report.
    pub fn is_reported(&self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Udp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `skc_state` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpState(pub u8);

impl TcpState {
    /// State name, or an empty string for values outside the table.
    pub fn as_str(&self) -> &'static str {
        flags::tcp_state_name(u64::from(self.0)).unwrap_or("")
    }
}

/// Addresses exactly as stored; ports converted to host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub local_addr: u32,
    pub remote_addr: u32,
    pub local_port: u16,
    pub remote_port: u16,
}

impl Endpoints {
    pub fn local(&self) -> String {
        ip2str(self.local_addr)
    }

    pub fn remote(&self) -> String {
        ip2str(self.remote_addr)
    }
}

/// Protocol number from the raw `sk_protocol` storage word.
///
/// `sk_protocol` is an 8-bit bitfield packed after `sk_shutdown`,
/// `sk_no_check` and `sk_userlocks`, so it lives in bits 8-15 of the word
/// regardless of the bit position the profile reports.
pub fn protocol_number(raw: u64) -> u8 {
    (((raw & 0xff00) >> 8) & 0xff) as u8
}

pub fn decode_protocol(inet_sock: &StructView) -> Result<Protocol, AnalysisError> {
    let raw = inet_sock.member("sk")?.read_raw("sk_protocol")?;
    Ok(Protocol::from_number(protocol_number(raw)))
}

/// Connection state from `sk.__sk_common.skc_state`; shared by every
/// protocol family but only meaningful for TCP.
pub fn decode_state(layout: &NetLayout, inet_sock: &StructView) -> Result<TcpState, AnalysisError> {
    let state = inet_sock
        .member("sk")?
        .member(layout.sk_common)?
        .read_value("skc_state")?;
    // Out-of-range values map to 0, which has no name.
    Ok(TcpState(u8::try_from(state).unwrap_or(0)))
}

pub fn decode_endpoints(layout: &NetLayout, inet_sock: &StructView) -> Result<Endpoints, AnalysisError> {
    Ok(Endpoints {
        local_addr: inet_sock.read_value(layout.local_addr)? as u32,
        remote_addr: inet_sock.read_value(layout.remote_addr)? as u32,
        local_port: ntohs(inet_sock.read_value(layout.local_port)? as u16),
        remote_port: ntohs(inet_sock.read_value(layout.remote_port)? as u16),
    })
}

/// Ports are read little-endian but stored in network order.
pub fn ntohs(port: u16) -> u16 {
    u16::from_be_bytes(port.to_le_bytes())
}

/// Octets of a stored IPv4 address, least significant byte first: the
/// big-endian wire address read as a little-endian integer.
pub fn ip_octets(ip: u32) -> [u8; 4] {
    ip.to_le_bytes()
}

pub fn ip2str(ip: u32) -> String {
    Ipv4Addr::from(ip_octets(ip)).to_string()
}
