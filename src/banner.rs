use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;

/// The remote side's greeting must start arriving within this window,
/// otherwise there is no banner.
const GRACE_PERIOD: Duration = Duration::from_millis(100);
/// Bound on each continuation read once the greeting has started.
const READ_TIMEOUT: Duration = Duration::from_millis(200);
/// Hard cap on raw banner text considered, in characters.
const RAW_CAP: usize = 500;
/// Banners longer than this are cut to `TRUNCATE_AT` chars plus `...`.
const DISPLAY_MAX: usize = 100;
const TRUNCATE_AT: usize = 97;

/// Best-effort, passive banner read from a freshly connected stream.
///
/// Returns an empty string when the service sends nothing within the grace
/// period, and on any read error. Never fails: a missing banner is not a
/// probe failure.
pub async fn read_banner(stream: &mut TcpStream, service: &str) -> String {
    let wants_headers = is_http_like(service);
    let mut raw: Vec<u8> = Vec::with_capacity(RAW_CAP);
    let mut buf = [0u8; 256];

    // The first read is bounded by the grace period: a service that has
    // pushed nothing by then has no banner.
    match time::timeout(GRACE_PERIOD, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => raw.extend_from_slice(&buf[..n]),
        _ => return String::new(),
    }

    while raw.len() < RAW_CAP {
        // One full line is enough unless we are scanning HTTP headers.
        if !wants_headers && raw.contains(&b'\n') {
            break;
        }
        match time::timeout(READ_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => raw.extend_from_slice(&buf[..n]),
            // EOF, read error, or nothing more in time: use what we have.
            _ => break,
        }
    }

    let text = String::from_utf8_lossy(&raw);
    extract_banner(&text, service)
}

/// Pull the interesting line out of raw banner text and normalize it.
///
/// For HTTP/HTTPS the header block is scanned for the first `Server:` or
/// `X-Powered-By:` line; nothing else counts as a banner. Every other
/// service keeps its first line only. CR/LF are stripped and overlong
/// banners are truncated with an ellipsis.
pub fn extract_banner(raw: &str, service: &str) -> String {
    let raw: String = raw.chars().take(RAW_CAP).collect();

    let line = if is_http_like(service) {
        raw.lines()
            .find(|l| {
                let l = l.trim_start();
                l.starts_with("Server:") || l.starts_with("X-Powered-By:")
            })
            .unwrap_or("")
    } else {
        raw.lines().next().unwrap_or("")
    };

    let mut banner: String = line.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    banner = banner.trim().to_string();

    if banner.chars().count() > DISPLAY_MAX {
        banner = banner.chars().take(TRUNCATE_AT).collect::<String>() + "...";
    }
    banner
}

fn is_http_like(service: &str) -> bool {
    service == "HTTP" || service == "HTTPS"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_for_plain_services() {
        let raw = "SSH-2.0-OpenSSH_8.9p1\r\nextra noise\n";
        assert_eq!(extract_banner(raw, "SSH"), "SSH-2.0-OpenSSH_8.9p1");
    }

    #[test]
    fn http_picks_server_header() {
        let raw = "HTTP/1.1 200 OK\r\nDate: now\r\nServer: nginx/1.24.0\r\nContent-Type: text/html\r\n";
        assert_eq!(extract_banner(raw, "HTTP"), "Server: nginx/1.24.0");
    }

    #[test]
    fn http_picks_x_powered_by_when_first() {
        let raw = "HTTP/1.1 200 OK\r\nX-Powered-By: PHP/8.2\r\nServer: Apache\r\n";
        assert_eq!(extract_banner(raw, "HTTPS"), "X-Powered-By: PHP/8.2");
    }

    #[test]
    fn http_without_interesting_headers_is_empty() {
        let raw = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n";
        assert_eq!(extract_banner(raw, "HTTP"), "");
    }

    #[test]
    fn empty_input_is_empty_banner() {
        assert_eq!(extract_banner("", "FTP"), "");
        assert_eq!(extract_banner("", "HTTP"), "");
    }

    #[test]
    fn crlf_stripped_and_trimmed() {
        assert_eq!(extract_banner("  220 ftp ready \r\n", "FTP"), "220 ftp ready");
    }

    #[test]
    fn overlong_banner_truncated_with_ellipsis() {
        let raw = "a".repeat(150);
        let out = extract_banner(&raw, "SMTP");
        assert_eq!(out.chars().count(), 100);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..97], "a".repeat(97).as_str());
    }

    #[test]
    fn exactly_100_chars_kept_verbatim() {
        let raw = "b".repeat(100);
        assert_eq!(extract_banner(&raw, "SMTP"), raw);
    }

    #[test]
    fn raw_cap_applied_before_line_scan() {
        // Server header buried past the 500-char cap must not be found.
        let mut raw = "x".repeat(600);
        raw.push_str("\r\nServer: hidden\r\n");
        assert_eq!(extract_banner(&raw, "HTTP"), "");
    }
}
