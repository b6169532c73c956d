use port_scan_rs::catalog::{lookup_service, parse_port_range, QUICK_SCAN_PORTS};
use port_scan_rs::vuln::is_vulnerable;

#[test]
fn telnet_classification_end_to_end() {
    // Port 23 is flagged by both its number and its resolved service name.
    let service = lookup_service(23);
    assert_eq!(service, "Telnet");
    assert!(is_vulnerable(23, service));
}

#[test]
fn unmapped_port_is_not_flagged() {
    let service = lookup_service(9999);
    assert_eq!(service, "Unknown");
    assert!(!is_vulnerable(9999, service));
}

#[test]
fn quick_scan_set_matches_catalog() {
    assert_eq!(QUICK_SCAN_PORTS.len(), 17);
    assert_eq!(lookup_service(QUICK_SCAN_PORTS[0]), "FTP");
    assert_eq!(lookup_service(QUICK_SCAN_PORTS[16]), "HTTP-Alt");
}

#[test]
fn parse_range_and_single_port() {
    assert_eq!(parse_port_range("1-1000").unwrap(), (1, 1000));
    assert_eq!(parse_port_range("8080").unwrap(), (8080, 8080));
    assert!(parse_port_range("443-80").is_err());
}
