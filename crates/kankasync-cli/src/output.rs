use std::io::Write;

use kankasync_core::domain::DocumentPath;
use kankasync_core::ports::{DocumentStatus, IProgressReporter};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    Success,
    Error,
    Warn,
    Info,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Success => "\u{2713} ",
            Level::Error => "\u{2717} Error: ",
            Level::Warn => "\u{26a0} Warning: ",
            Level::Info => "  ",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Error | Level::Warn)
    }
}

/// Prints command messages as glyph-prefixed lines or JSON objects
///
/// In JSON mode informational lines are dropped so stdout stays parseable.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn render(&self, level: Level, message: &str) -> Option<String> {
        match self.format {
            OutputFormat::Human => Some(format!("{}{message}", level.prefix())),
            OutputFormat::Json => {
                let value = match level {
                    Level::Success => serde_json::json!({"success": true, "message": message}),
                    Level::Error => serde_json::json!({"success": false, "error": message}),
                    Level::Warn => serde_json::json!({"level": "warning", "message": message}),
                    Level::Info => return None,
                };
                Some(value.to_string())
            }
        }
    }

    fn emit(&self, level: Level, message: &str) {
        let Some(line) = self.render(level, message) else {
            return;
        };
        if level.to_stderr() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    /// Pretty-prints `value`; a no-op for human output
    pub fn print_json(&self, value: &serde_json::Value) {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

const BAR_WIDTH: usize = 20;

/// Renders `[████░░░░] (done/total) pct%`
pub fn progress_bar(done: usize, total: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        done.min(total) as f64 / total as f64
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] ({}/{}) {}%",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(BAR_WIDTH - filled),
        done,
        total,
        (ratio * 100.0).round() as u32
    )
}

pub fn status_glyph(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Synced => "\u{2713}",
        DocumentStatus::Failed => "\u{2717}",
        DocumentStatus::Skipped => "\u{2013}",
    }
}

/// Prints one progress line per settled document to stderr
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl IProgressReporter for ConsoleProgress {
    fn reset(&self, total: usize) {
        if total > 0 {
            eprintln!("{}", progress_bar(0, total));
        }
    }

    fn advance(&self, path: &DocumentPath, status: DocumentStatus, done: usize, total: usize) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "{} {} {}",
            progress_bar(done, total),
            status_glyph(status),
            path
        );
    }
}
