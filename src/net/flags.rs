//! Constant tables for decoding socket fields

/// `enum { TCP_ESTABLISHED = 1, ... }` from include/net/tcp_states.h
pub const TCP_STATES: [&str; 12] = [
    "",
    "ESTABLISHED",
    "SYN_SENT",
    "SYN_RECV",
    "FIN_WAIT1",
    "FIN_WAIT2",
    "TIME_WAIT",
    "CLOSE",
    "CLOSE_WAIT",
    "LAST_ACK",
    "LISTEN",
    "CLOSING",
];

pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

/// IANA protocol numbers the kernel uses for `sk_protocol`.
pub fn protocol_name(number: u8) -> Option<&'static str> {
    let name = match number {
        0 => "IP",
        1 => "ICMP",
        2 => "IGMP",
        4 => "IPIP",
        IPPROTO_TCP => "TCP",
        8 => "EGP",
        12 => "PUP",
        IPPROTO_UDP => "UDP",
        22 => "IDP",
        33 => "DCCP",
        41 => "IPv6",
        46 => "RSVP",
        47 => "GRE",
        50 => "ESP",
        51 => "AH",
        94 => "BEET",
        103 => "PIM",
        108 => "COMP",
        132 => "SCTP",
        136 => "UDPLITE",
        255 => "RAW",
        _ => return None,
    };
    Some(name)
}

pub fn tcp_state_name(state: u64) -> Option<&'static str> {
    usize::try_from(state)
        .ok()
        .and_then(|i| TCP_STATES.get(i))
        .copied()
        .filter(|name| !name.is_empty())
}
