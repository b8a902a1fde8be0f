//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::format_clock;

const BLINK: Duration = Duration::from_millis(500);

/// Terminal output for the commands: one live status line plus log lines
pub struct Presenter {
    status: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { status: None }
    }

    /// Show the blinking recording indicator with `message`
    pub fn start_status(&mut self, message: &str) {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(&["●", " ", "●"])
            .template("{spinner:.red} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(BLINK);
        self.status = Some(bar);
    }

    pub fn set_status(&self, message: &str) {
        if let Some(bar) = &self.status {
            bar.set_message(message.to_string());
        }
    }

    /// Replace the status line with a final verdict
    pub fn finish(&mut self, ok: bool, message: &str) {
        let mark = if ok { "✓".green() } else { "✗".red() };
        match self.status.take() {
            Some(bar) => bar.finish_with_message(format!("{mark} {message}")),
            None => eprintln!("{mark} {message}"),
        }
    }

    /// Drop the status line without a verdict
    pub fn clear_status(&mut self) {
        if let Some(bar) = self.status.take() {
            bar.finish_and_clear();
        }
    }

    /// Print a line without tearing the status line
    fn line(&self, text: String) {
        match &self.status {
            Some(bar) => bar.suspend(|| eprintln!("{text}")),
            None => eprintln!("{text}"),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.line(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.line(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.line(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout (paths of written files)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Live status line for a recording
    pub fn format_progress(&self, elapsed_secs: f64, frames: u64, fps: f64, bytes: u64) -> String {
        let elapsed = std::time::Duration::from_secs_f64(elapsed_secs.max(0.0));
        format!(
            "{} {} · {} frames · {:.1} fps · {}",
            "REC".red().bold(),
            format_clock(elapsed),
            frames,
            fps,
            format_bytes(bytes)
        )
    }

    /// Update recording progress
    pub fn update_recording_progress(&self, elapsed_secs: f64, frames: u64, fps: f64, bytes: u64) {
        self.set_status(&self.format_progress(elapsed_secs, frames, fps, bytes));
    }

    /// Print a key-value pair (for config list and devices)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print a section heading
    pub fn heading(&self, title: &str) {
        println!("{}", title.bold());
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
