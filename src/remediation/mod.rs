//! Operator remediation: firewall ban commands and the clipboard seam.
//!
//! # Untrusted output
//!
//! [`ban_command`] interpolates the source address exactly as the classifier
//! reported it. That address comes from the scanned log, which an attacker
//! controls, so the command may contain shell metacharacters
//! (`1.2.3.4; rm -rf /`). The text is advisory: this crate never executes
//! it, and operators must read it before pasting it into a shell. The
//! template is left unescaped so its shape stays byte-for-byte predictable.

use std::io::Write;

use crate::error::Result;
use crate::model::ThreatRecord;

/// Placeholder the classifier emits when it could not extract an address.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// `sudo iptables -A INPUT -s {address} -j DROP`, with `address` verbatim.
pub fn ban_command(address: &str) -> String {
    format!("sudo iptables -A INPUT -s {address} -j DROP")
}

/// One ban command per distinct source address, in first-detection order.
///
/// Empty addresses and the classifier's `Unknown` placeholder are skipped.
pub fn ban_list(threats: &[ThreatRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    threats
        .iter()
        .map(|t| t.source_address.as_str())
        .filter(|addr| !addr.is_empty() && *addr != UNKNOWN_ADDRESS)
        .filter(|addr| seen.insert(*addr))
        .map(ban_command)
        .collect()
}

/// Destination for text the operator asked to copy.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Copy the ban command for `address` and return the operator notice.
pub fn copy_ban_command(clipboard: &mut dyn Clipboard, address: &str) -> Result<String> {
    let command = ban_command(address);
    clipboard.write_text(&command)?;
    tracing::debug!(address, "ban command copied");
    Ok(format!("Copied ban command for {address}"))
}

/// In-memory clipboard; keeps the last copied text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Terminal clipboard: writes the text on its own line so it can be selected.
pub struct StdoutClipboard<W: Write = std::io::Stdout> {
    out: W,
}

impl StdoutClipboard {
    pub fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl Default for StdoutClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutClipboard<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for StdoutClipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}
