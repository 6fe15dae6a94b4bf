//! Display utilities for the native timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Timer and live-status status

use crate::types::{format_elapsed, IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for timer start.
    pub fn show_start_success(start_millis: i64) {
        println!("* Timer started");
        let start = chrono::DateTime::from_timestamp_millis(start_millis)
            .map(|utc| utc.with_timezone(&chrono::Local).format("%H:%M:%S").to_string());
        if let Some(start) = start {
            println!("  Started at: {}", start);
        }
    }

    /// Shows a success message for timer stop.
    pub fn show_stop_success() {
        println!("[] Timer stopped");
    }

    /// Shows the daemon's message for acknowledgement-only commands.
    pub fn show_message(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("{}", Self::status_lines(response.data.as_ref()).join("\n"));
    }

    /// Shows the id of a newly started live status.
    pub fn show_live_started(response: &IpcResponse) {
        println!("* Live status started");
        if let Some(id) = response.data.as_ref().and_then(|d| d.activity_id.as_deref()) {
            println!("  Id: {}", id);
        }
    }

    /// Shows live-status availability.
    pub fn show_live_available(response: &IpcResponse) {
        let available = response.data.as_ref().and_then(|d| d.available);
        println!("Live statuses: {}", Self::yes_no(available));
    }

    /// Shows whether a live status is active.
    pub fn show_live_active(response: &IpcResponse) {
        let data = response.data.as_ref();
        println!(
            "Active live status: {}",
            Self::yes_no(data.and_then(|d| d.has_active))
        );
        if let Some(id) = data.and_then(|d| d.activity_id.as_deref()) {
            println!("  Id: {}", id);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn status_lines(data: Option<&ResponseData>) -> Vec<String> {
        let mut lines = vec![
            "Native timer status".to_string(),
            "─────────────────────────────".to_string(),
        ];

        let Some(data) = data else {
            lines.push("The daemon returned no status".to_string());
            return lines;
        };

        if data.is_running == Some(true) {
            lines.push("State: running".to_string());
            let elapsed = data
                .formatted_time
                .clone()
                .unwrap_or_else(|| format_elapsed(data.elapsed_time.unwrap_or(0)));
            lines.push(format!("Elapsed: {}", elapsed));
        } else {
            lines.push("State: stopped".to_string());
        }
        lines
    }

    fn yes_no(value: Option<bool>) -> &'static str {
        match value {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
