//! Logging and output control
//!
//! This module provides the [`Logger`] for controlling output verbosity and
//! formatting progress messages. It supports quiet and verbose output, and
//! keeps binary payloads out of the log through [`Redaction`] markers.

use std::time::{Duration, Instant};

/// Marks a payload whose bytes must never be rendered into log output.
///
/// Fetch requests for layer blobs carry one of these so that a broken
/// terminal never results from dumping gzip data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    reason: &'static str,
}

impl Redaction {
    pub const fn new(reason: &'static str) -> Self {
        Self { reason }
    }

    /// The marker used for compressed layer streams
    pub const fn binary_blob() -> Self {
        Self::new("omitting binary blobs from logs")
    }

    pub fn reason(&self) -> &str {
        self.reason
    }
}

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            println!("▶️  {}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Response or request body, verbose mode only
    pub fn body(&self, label: &str, body: &[u8], redaction: Option<&Redaction>) {
        if self.verbose && !self.quiet {
            println!("   {}: {}", label, Self::render_body(body, redaction));
        }
    }

    /// Text shown in place of a body; redacted or non-UTF-8 bodies never print
    pub fn render_body(body: &[u8], redaction: Option<&Redaction>) -> String {
        if let Some(redaction) = redaction {
            return format!("<omitted: {}>", redaction.reason());
        }
        match std::str::from_utf8(body) {
            Ok(text) if text.len() > 512 => {
                let head: String = text.chars().take(512).collect();
                format!("{}... ({} bytes)", head, body.len())
            }
            Ok(text) => text.to_string(),
            Err(_) => format!("<{} bytes of binary data>", body.len()),
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    /// Time since this logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    /// Format file size in human-readable units
    pub fn format_size(&self, bytes: u64) -> String {
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}
