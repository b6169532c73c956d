use anyhow::{bail, Result};

/// Ports probed by a quick scan, in the order they are walked.
///
/// This is exactly the key set of the service table below, ascending. A
/// quick scan ignores any configured range and uses this list verbatim.
pub const QUICK_SCAN_PORTS: [u16; 17] = [
    21, 22, 23, 25, 53, 80, 110, 135, 139, 143, 443, 993, 995, 1723, 3389, 5900, 8080,
];

/// Map a well-known port to its service label, or `"Unknown"`.
///
/// Pure lookup over a fixed table; no side effects, no error cases.
pub fn lookup_service(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        23 => "Telnet",
        25 => "SMTP",
        53 => "DNS",
        80 => "HTTP",
        110 => "POP3",
        135 => "RPC",
        139 => "NetBIOS",
        143 => "IMAP",
        443 => "HTTPS",
        993 => "IMAPS",
        995 => "POP3S",
        1723 => "PPTP",
        3389 => "RDP",
        5900 => "VNC",
        8080 => "HTTP-Alt",
        _ => "Unknown",
    }
}

/// Whether a port is part of the quick-scan set.
pub fn is_common_port(port: u16) -> bool {
    QUICK_SCAN_PORTS.contains(&port)
}

/// Parse a port range argument into `(start, end)`, both inclusive.
///
/// Supported forms:
/// - inclusive range: `1-1000`
/// - single port: `443` (equivalent to `443-443`)
///
/// Whitespace around numbers is ignored. Rejects port 0, values above
/// 65535, and inverted ranges.
pub fn parse_port_range(s: &str) -> Result<(u16, u16)> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty port range");
    }

    if let Some((a, b)) = s.split_once('-') {
        let start = parse_port_str(a.trim())?;
        let end = parse_port_str(b.trim())?;
        if start > end {
            bail!("invalid range {start}-{end} (start > end)");
        }
        return Ok((start, end));
    }

    let p = parse_port_str(s)?;
    Ok((p, p))
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s
        .parse::<u32>()
        .map_err(|e| anyhow::anyhow!("invalid port value {s:?}: {e}"))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}
