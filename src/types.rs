use serde::{Deserialize, Serialize};

/// Outcome of a single port probe. A connect that is refused, times out,
/// or cannot be resolved is recorded as `Closed` — there is no separate
/// "filtered" state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Open,
    Closed,
}

impl PortStatus {
    /// Uppercase label used in the textual report and per-port log lines.
    pub fn label(&self) -> &'static str {
        match self {
            PortStatus::Open => "OPEN",
            PortStatus::Closed => "CLOSED",
        }
    }
}

/// One completed probe. Created exactly once per port and never mutated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    pub status: PortStatus,
    pub service: String,
    pub banner: String,
    pub response_time_ms: u64,
    pub is_vulnerable: bool,
}

/// What sequence of ports a session probes.
///
/// `Full` walks the configured inclusive range in ascending order; `Quick`
/// walks the fixed catalog port list and ignores any configured range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScanMode {
    Full { start_port: u16, end_port: u16 },
    Quick,
}

impl Default for ScanMode {
    fn default() -> Self {
        ScanMode::Full {
            start_port: 1,
            end_port: 1000,
        }
    }
}

/// Session lifecycle: `Idle -> Running -> Complete`, with `Running -> Idle`
/// reachable only through explicit cancellation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Complete,
}

/// Events emitted by the session and drained by the driving loop after each
/// `advance()`. A driver that never drains them does not change scan
/// behavior; the queue length is bounded by the port sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    PortScanned { port: u16, status: PortStatus },
    Progress { percent: u8 },
    Complete,
}

/// Serializable snapshot of a session's results and counters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanReport {
    pub target: String,
    #[serde(flatten)]
    pub mode: ScanMode,
    pub status: SessionStatus,
    pub started_at: Option<String>,
    pub scanned_total: u64,
    pub scanned_done: u64,
    pub open_count: u64,
    pub closed_count: u64,
    pub entries: Vec<PortResult>,
}
