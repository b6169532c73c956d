use crate::types::{PortStatus, ScanMode, ScanReport, SessionStatus};
use std::fmt::Write as _;

/// Render the full report: header, per-port lines in probe order, then the
/// summary block. Deterministic for a given snapshot.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Port Scan Results ===");
    let _ = writeln!(out, "Target: {}", report.target);
    let _ = writeln!(out, "Ports : {}", mode_label(&report.mode));
    let _ = writeln!(out, "Status: {}", status_label(report.status));
    if let Some(started) = &report.started_at {
        let _ = writeln!(out, "Started: {started}");
    }
    let _ = writeln!(out);

    for entry in &report.entries {
        let _ = writeln!(out, "{}", render_port_line(entry));
    }
    let _ = writeln!(out);

    out.push_str(&render_summary(report));
    out
}

/// One per-port line: `Port <n>: OPEN - <service> (<banner>)` or
/// `Port <n>: CLOSED`. Also used by the CLI driver for live output.
pub fn render_port_line(entry: &crate::types::PortResult) -> String {
    match entry.status {
        PortStatus::Open => {
            let mut line = format!(
                "Port {}: {} - {}",
                entry.port,
                entry.status.label(),
                entry.service
            );
            if !entry.banner.is_empty() {
                line.push_str(&format!(" ({})", entry.banner));
            }
            if entry.is_vulnerable {
                line.push_str(" [insecure]");
            }
            line
        }
        PortStatus::Closed => format!("Port {}: {}", entry.port, entry.status.label()),
    }
}

/// Aggregate counts plus the open-port list annotated with services, in
/// the order the ports were probed.
pub fn render_summary(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total ports scanned: {}", report.scanned_done);
    let _ = writeln!(out, "Open ports : {}", report.open_count);
    let _ = writeln!(out, "Closed ports: {}", report.closed_count);

    let open: Vec<_> = report
        .entries
        .iter()
        .filter(|e| e.status == PortStatus::Open)
        .collect();
    if !open.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Open ports:");
        for entry in open {
            let _ = writeln!(out, "Port {} - {}", entry.port, entry.service);
        }
    }

    out
}

fn mode_label(mode: &ScanMode) -> String {
    match mode {
        ScanMode::Full {
            start_port,
            end_port,
        } => format!("{start_port}-{end_port}"),
        ScanMode::Quick => "quick (common ports)".to_string(),
    }
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Running => "running",
        SessionStatus::Complete => "complete",
    }
}
