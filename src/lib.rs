//! Library crate for port-scan-rs exposing reusable modules.
pub mod banner;
pub mod catalog;
pub mod report;
pub mod server;
pub mod session;
pub mod types;
pub mod vuln;
