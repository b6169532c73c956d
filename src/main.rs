use std::fs::File;
use std::path::PathBuf;

use port_scan_rs::session::{ScanSession, DEFAULT_TIMEOUT_MS, TICK_DELAY};
use port_scan_rs::types::{ScanEvent, ScanMode, ScanReport};
use port_scan_rs::{catalog, report, server};

use anyhow::Result;
use clap::Parser;

/// port-scan-rs — Single-target async TCP connect port scanner with a step-wise scan session.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-scan-rs",
    version,
    about = "Single-target async TCP connect port scanner with a step-wise scan session and a tiny embedded web UI.",
    long_about = None
)]
struct Cli {
    /// Target host or IP to scan. If omitted, no scan runs (combine with --serve-ui).
    #[arg(long)]
    target: Option<String>,

    /// Inclusive port range (e.g., 1-1000) or a single port.
    #[arg(long, default_value = "1-1000")]
    ports: String,

    /// Scan the fixed set of common ports instead of the configured range.
    #[arg(long, default_value_t = false)]
    quick: bool,

    /// Per-port connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Write results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Start the embedded HTTP UI server (scan control via /api).
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("port-scan-rs configuration:");
    println!(
        "  target       : {}",
        cli.target.as_deref().unwrap_or("<none>")
    );
    println!("  ports        : {}", cli.ports);
    println!("  quick        : {}", cli.quick);
    println!("  timeout_ms   : {}", cli.timeout_ms);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  serve_ui     : {}", cli.serve_ui);

    // Start embedded UI server if requested (non-blocking background task)
    if cli.serve_ui {
        let bind = "127.0.0.1:8080";
        tokio::spawn(async move {
            if let Err(e) = server::spawn_server(bind).await {
                eprintln!("HTTP UI server error: {e}");
            }
        });
        println!("UI server starting at http://{} (Ctrl+C to stop)", bind);
    }

    if let Some(target) = cli.target.as_deref() {
        let mode = if cli.quick {
            ScanMode::Quick
        } else {
            let (start_port, end_port) = catalog::parse_port_range(&cli.ports)?;
            ScanMode::Full {
                start_port,
                end_port,
            }
        };

        let mut session = ScanSession::new();
        session.configure(target, mode, cli.timeout_ms)?;
        session.start()?;
        println!(
            "\nStarting {} scan on {} ({} ports)...",
            if cli.quick { "quick" } else { "full" },
            target,
            session.total_ports()
        );

        run_scan(&mut session).await;

        let scan_report = session.report();
        println!("\n{}", report::render_summary(&scan_report));
        if let Some(path) = cli.output.as_deref() {
            if let Err(e) = write_results_json(path, &scan_report) {
                eprintln!("Failed to write JSON to {}: {}", path.display(), e);
            } else {
                println!("Wrote JSON results to {}", path.display());
            }
        }
    } else if !cli.serve_ui {
        eprintln!("Nothing to do: pass --target to scan or --serve-ui for the web UI.");
    }

    // If UI is running, keep the process alive until Ctrl+C.
    if cli.serve_ui {
        println!("Press Ctrl+C to stop the server...");
        let _ = tokio::signal::ctrl_c().await;
    }

    Ok(())
}

/// Drive the session one probe per tick with a fixed inter-tick delay,
/// printing per-port lines and progress at each decile, the way the
/// firmware's serial console did.
async fn run_scan(session: &mut ScanSession) {
    let mut last_decile = 0u8;
    while session.advance().await {
        for event in session.drain_events() {
            match event {
                ScanEvent::PortScanned { port, .. } => {
                    if let Some(entry) = session.results().iter().find(|r| r.port == port) {
                        println!("{}", report::render_port_line(entry));
                    }
                }
                ScanEvent::Progress { percent } => {
                    let decile = percent / 10;
                    if decile > last_decile {
                        last_decile = decile;
                        println!(
                            "Progress: {}% ({}/{} ports, {} open)",
                            percent,
                            session.total_scanned(),
                            session.total_ports(),
                            session.open_count()
                        );
                    }
                }
                ScanEvent::Complete => {
                    println!("Port scan completed");
                }
            }
        }
        if session.is_running() {
            tokio::time::sleep(TICK_DELAY).await;
        }
    }
}

fn write_results_json(path: &std::path::Path, results: &ScanReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
