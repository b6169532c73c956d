use std::collections::VecDeque;
use std::time::Duration;

use crate::banner;
use crate::catalog::{self, QUICK_SCAN_PORTS};
use crate::types::{PortResult, PortStatus, ScanEvent, ScanMode, ScanReport, SessionStatus};
use crate::vuln;
use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::{bail, Result};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

/// Per-port connect timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Fixed delay a driving loop leaves between ticks, mirroring a
/// cooperative scheduler's inter-tick pause.
pub const TICK_DELAY: Duration = Duration::from_millis(10);

/// Stateful single-target scan engine, stepped one port probe at a time.
///
/// The session is meant to be driven by an external loop: each `advance()`
/// call probes exactly one port, bounded by the configured timeout, and
/// returns control to the caller. Between calls the driver drains the
/// event queue. Lifecycle is `Idle -> Running -> Complete`, with `stop()`
/// taking a running session back to `Idle` without discarding results.
pub struct ScanSession {
    target: String,
    mode: ScanMode,
    timeout: Duration,
    cursor: usize,
    status: SessionStatus,
    results: Vec<PortResult>,
    open_count: usize,
    closed_count: usize,
    events: VecDeque<ScanEvent>,
    started_at: Option<String>,
}

impl ScanSession {
    /// New idle session with the default range (1-1000) and timeout (5 s).
    pub fn new() -> Self {
        Self {
            target: String::new(),
            mode: ScanMode::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cursor: 0,
            status: SessionStatus::Idle,
            results: Vec::new(),
            open_count: 0,
            closed_count: 0,
            events: VecDeque::new(),
            started_at: None,
        }
    }

    /// Set target, mode, and per-port timeout. Rejected while a scan is
    /// running; the caller must `stop()` first. Does not touch recorded
    /// results.
    pub fn configure(&mut self, target: &str, mode: ScanMode, timeout_ms: u64) -> Result<()> {
        if self.status == SessionStatus::Running {
            bail!("cannot reconfigure while a scan is running");
        }
        let target = target.trim();
        if target.is_empty() {
            bail!("target must not be empty");
        }
        if let ScanMode::Full {
            start_port,
            end_port,
        } = mode
        {
            if start_port == 0 {
                bail!("start port must be at least 1");
            }
            if start_port > end_port {
                bail!("invalid range {start_port}-{end_port} (start > end)");
            }
        }
        self.target = target.to_string();
        self.mode = mode;
        self.timeout = Duration::from_millis(timeout_ms);
        Ok(())
    }

    /// Begin a scan: clears all prior results and resets the cursor to the
    /// first port of the sequence. Valid from `Idle` or `Complete`;
    /// rejected while `Running` or before a target has been configured.
    pub fn start(&mut self) -> Result<()> {
        if self.status == SessionStatus::Running {
            bail!("scan already running");
        }
        if self.target.is_empty() {
            bail!("no target configured");
        }
        self.results.clear();
        self.open_count = 0;
        self.closed_count = 0;
        self.events.clear();
        self.cursor = 0;
        self.started_at = Some(now_rfc3339());
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// Cancel a running scan. Already-recorded results stay queryable;
    /// no-op unless `Running`.
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Idle;
        }
    }

    /// Probe the port under the cursor, record the result, and emit events.
    ///
    /// One call does at most one connect attempt bounded by the configured
    /// timeout, so a driving loop stays responsive. Returns `true` if a
    /// probe was performed; no-op (`false`) unless the session is running.
    pub async fn advance(&mut self) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }

        let port = self.port_at(self.cursor);
        let result = self.probe_port(port).await;

        match result.status {
            PortStatus::Open => self.open_count += 1,
            PortStatus::Closed => self.closed_count += 1,
        }
        self.events.push_back(ScanEvent::PortScanned {
            port,
            status: result.status,
        });
        self.results.push(result);
        self.cursor += 1;
        self.events.push_back(ScanEvent::Progress {
            percent: self.progress_percent(),
        });

        if self.cursor >= self.sequence_len() {
            self.status = SessionStatus::Complete;
            self.events.push_back(ScanEvent::Complete);
        }
        true
    }

    async fn probe_port(&self, port: u16) -> PortResult {
        let start = Instant::now();
        let connect =
            time::timeout(self.timeout, TcpStream::connect((self.target.as_str(), port))).await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        match connect {
            Ok(Ok(mut stream)) => {
                let service = catalog::lookup_service(port).to_string();
                let banner = banner::read_banner(&mut stream, &service).await;
                let is_vulnerable = vuln::is_vulnerable(port, &service);
                PortResult {
                    port,
                    status: PortStatus::Open,
                    service,
                    banner,
                    response_time_ms,
                    is_vulnerable,
                }
            }
            // Refused, timed out, unreachable, or unresolvable: all Closed.
            _ => PortResult {
                port,
                status: PortStatus::Closed,
                service: String::new(),
                banner: String::new(),
                response_time_ms,
                is_vulnerable: false,
            },
        }
    }

    /// Remove and return all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<ScanEvent> {
        self.events.drain(..).collect()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Length of the configured port sequence.
    pub fn total_ports(&self) -> usize {
        self.sequence_len()
    }

    pub fn total_scanned(&self) -> usize {
        self.results.len()
    }

    pub fn open_count(&self) -> usize {
        self.open_count
    }

    pub fn closed_count(&self) -> usize {
        self.closed_count
    }

    /// All results recorded since the last `start()`, in probe order.
    pub fn results(&self) -> &[PortResult] {
        &self.results
    }

    /// Open ports in probe order, projected from the result list.
    pub fn open_ports(&self) -> Vec<u16> {
        self.results
            .iter()
            .filter(|r| r.status == PortStatus::Open)
            .map(|r| r.port)
            .collect()
    }

    /// Closed ports in probe order, projected from the result list.
    pub fn closed_ports(&self) -> Vec<u16> {
        self.results
            .iter()
            .filter(|r| r.status == PortStatus::Closed)
            .map(|r| r.port)
            .collect()
    }

    /// Scan progress, rounded to the nearest percent. 100 when done.
    pub fn progress_percent(&self) -> u8 {
        let total = self.sequence_len() as u64;
        if total == 0 {
            return 0;
        }
        ((self.results.len() as u64 * 100 + total / 2) / total) as u8
    }

    /// Snapshot of the session for serialization and report rendering.
    pub fn report(&self) -> ScanReport {
        ScanReport {
            target: self.target.clone(),
            mode: self.mode,
            status: self.status,
            started_at: self.started_at.clone(),
            scanned_total: self.sequence_len() as u64,
            scanned_done: self.results.len() as u64,
            open_count: self.open_count as u64,
            closed_count: self.closed_count as u64,
            entries: self.results.clone(),
        }
    }

    fn sequence_len(&self) -> usize {
        match self.mode {
            ScanMode::Full {
                start_port,
                end_port,
            } => (end_port as u32 - start_port as u32 + 1) as usize,
            ScanMode::Quick => QUICK_SCAN_PORTS.len(),
        }
    }

    fn port_at(&self, idx: usize) -> u16 {
        match self.mode {
            ScanMode::Full { start_port, .. } => (start_port as u32 + idx as u32) as u16,
            ScanMode::Quick => QUICK_SCAN_PORTS[idx],
        }
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_rejects_empty_target_and_inverted_range() {
        let mut s = ScanSession::new();
        assert!(s.configure("", ScanMode::Quick, 100).is_err());
        assert!(s.configure("   ", ScanMode::Quick, 100).is_err());
        assert!(s
            .configure(
                "127.0.0.1",
                ScanMode::Full {
                    start_port: 100,
                    end_port: 1
                },
                100
            )
            .is_err());
        assert!(s
            .configure(
                "127.0.0.1",
                ScanMode::Full {
                    start_port: 0,
                    end_port: 10
                },
                100
            )
            .is_err());
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn start_requires_target() {
        let mut s = ScanSession::new();
        assert!(s.start().is_err());
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn start_and_reconfigure_rejected_while_running() {
        let mut s = ScanSession::new();
        s.configure("10.0.0.1", ScanMode::Quick, 50).unwrap();
        s.start().unwrap();
        assert!(s.is_running());
        assert!(s.start().is_err());
        assert!(s.configure("10.0.0.2", ScanMode::Quick, 50).is_err());
        assert_eq!(s.target(), "10.0.0.1");
    }

    #[test]
    fn stop_is_noop_when_idle() {
        let mut s = ScanSession::new();
        s.stop();
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn full_mode_sequence_covers_inclusive_range() {
        let mut s = ScanSession::new();
        s.configure(
            "10.0.0.1",
            ScanMode::Full {
                start_port: 20,
                end_port: 25,
            },
            50,
        )
        .unwrap();
        assert_eq!(s.total_ports(), 6);
        assert_eq!(s.port_at(0), 20);
        assert_eq!(s.port_at(5), 25);
    }

    #[test]
    fn quick_mode_sequence_is_catalog_order() {
        let mut s = ScanSession::new();
        s.configure("10.0.0.1", ScanMode::Quick, 50).unwrap();
        assert_eq!(s.total_ports(), QUICK_SCAN_PORTS.len());
        assert_eq!(s.port_at(0), 21);
        assert_eq!(s.port_at(16), 8080);
    }

    #[test]
    fn single_port_range_is_valid() {
        let mut s = ScanSession::new();
        s.configure(
            "10.0.0.1",
            ScanMode::Full {
                start_port: 65535,
                end_port: 65535,
            },
            50,
        )
        .unwrap();
        assert_eq!(s.total_ports(), 1);
        assert_eq!(s.port_at(0), 65535);
    }

    #[test]
    fn progress_is_zero_before_any_probe() {
        let mut s = ScanSession::new();
        s.configure("10.0.0.1", ScanMode::Quick, 50).unwrap();
        s.start().unwrap();
        assert_eq!(s.progress_percent(), 0);
    }
}
