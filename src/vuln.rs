/// Flag legacy plaintext services as inherently insecure.
///
/// The port-number check and the service-name check are each sufficient on
/// their own: a Telnet daemon on a nonstandard port is flagged by name, and
/// an unexpected service on port 21/23 is flagged by port. Advisory labeling
/// only, not a CVE-level assessment.
pub fn is_vulnerable(port: u16, service: &str) -> bool {
    if service == "Telnet" || service == "FTP" {
        return true;
    }
    port == 21 || port == 23
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telnet_and_ftp_flagged_by_name() {
        assert!(is_vulnerable(2323, "Telnet"));
        assert!(is_vulnerable(2121, "FTP"));
    }

    #[test]
    fn ports_21_and_23_flagged_regardless_of_service() {
        assert!(is_vulnerable(21, "Unknown"));
        assert!(is_vulnerable(23, ""));
    }

    #[test]
    fn standard_match_flagged() {
        assert!(is_vulnerable(23, "Telnet"));
        assert!(is_vulnerable(21, "FTP"));
    }

    #[test]
    fn everything_else_clean() {
        assert!(!is_vulnerable(22, "SSH"));
        assert!(!is_vulnerable(80, "HTTP"));
        assert!(!is_vulnerable(9999, "Unknown"));
        assert!(!is_vulnerable(443, ""));
    }
}
