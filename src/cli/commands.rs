//! Command definitions for the native timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Native timer CLI - drives the timer daemon over its local socket
#[derive(Parser, Debug)]
#[command(
    name = "native-timer",
    version,
    about = "Background timer with native notifications and live statuses",
    long_about = "Controls a running native-timer daemon: start and stop the session timer,\n\
                  manage the background notification and publish live statuses.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the daemon socket (overrides the configuration)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a timer session (replaces the running one)
    Start(StartArgs),

    /// Stop the timer session
    Stop,

    /// Refresh the background notification text
    Notify {
        /// Notification title
        #[arg(value_parser = validate_text)]
        title: String,

        /// Notification body
        #[arg(value_parser = validate_text)]
        body: String,
    },

    /// Show whether the timer runs and how long it has been running
    Status,

    /// Report that the app came to the foreground
    Foreground,

    /// Report that the app went to the background
    Background,

    /// Allow notification updates again after a dismissal
    ResetNotification,

    /// Report that the user dismissed the notification
    DismissNotification,

    /// Manage live statuses
    Live {
        #[command(subcommand)]
        command: LiveCommands,
    },

    /// Stop the timer and end every live status
    Cancel {
        /// Reason recorded in the daemon log
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// End every live status, leaving the timer running
    EndAll {
        /// Reason recorded in the daemon log
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Live status subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LiveCommands {
    /// Show whether live statuses are enabled
    Available,

    /// Show whether a live status is active
    Active,

    /// Start a live status (ends the current one first)
    Start(LiveStartArgs),

    /// Update the current live status
    Update {
        /// Live status id returned by `live start`
        id: String,

        /// Elapsed time label
        #[arg(short, long, default_value = "00:00:00")]
        elapsed: String,

        /// Status label
        #[arg(short, long, default_value = "Running")]
        status: String,
    },

    /// End the current live status
    Stop {
        /// Live status id returned by `live start`
        id: String,
    },

    /// End every live status
    StopAll,
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Notification title
    #[arg(short, long, default_value = "Timer", value_parser = validate_text)]
    pub title: String,

    /// Notification body
    #[arg(short, long, default_value = "Running", value_parser = validate_text)]
    pub body: String,

    /// Session start in epoch milliseconds (defaults to now)
    #[arg(long, value_name = "MILLIS")]
    pub start_time: Option<i64>,

    /// Accent colour as #RRGGBB
    #[arg(long, value_parser = validate_color)]
    pub color: Option<String>,
}

impl Default for StartArgs {
    fn default() -> Self {
        Self {
            title: "Timer".to_string(),
            body: "Running".to_string(),
            start_time: None,
            color: None,
        }
    }
}

/// Arguments for `live start`
#[derive(Args, Debug, Clone)]
pub struct LiveStartArgs {
    /// Title shown on the live status
    #[arg(value_parser = validate_text)]
    pub title: String,

    /// Start time label (defaults to the current local time)
    #[arg(long)]
    pub start_time: Option<String>,

    /// Elapsed time label
    #[arg(short, long, default_value = "00:00:00")]
    pub elapsed: String,

    /// Status label
    #[arg(short, long, default_value = "Running")]
    pub status: String,

    /// Accent colour as #RRGGBB
    #[arg(long, value_parser = validate_color)]
    pub color: Option<String>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a title or body.
///
/// - Must not be empty
/// - Must not exceed 100 characters
fn validate_text(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if s.chars().count() > 100 {
        return Err("must be at most 100 characters".to_string());
    }
    Ok(s.to_string())
}

/// Validates a `#RRGGBB` colour.
fn validate_color(s: &str) -> Result<String, String> {
    let valid = s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(format!("expected a colour like #0045a5, got {:?}", s));
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["native-timer"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.config.is_none());
            assert!(cli.socket.is_none());
        }

        #[test]
        fn test_parse_global_flags() {
            let cli = Cli::parse_from([
                "native-timer",
                "status",
                "-v",
                "--socket",
                "/tmp/nt.sock",
                "--config",
                "/tmp/nt.json",
            ]);
            assert!(cli.verbose);
            assert_eq!(cli.socket, Some(PathBuf::from("/tmp/nt.sock")));
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/nt.json")));
            assert!(matches!(cli.command, Some(Commands::Status)));
        }

        #[test]
        fn test_parse_simple_commands() {
            let cases = [
                ("stop", "Stop"),
                ("foreground", "Foreground"),
                ("background", "Background"),
                ("reset-notification", "ResetNotification"),
                ("dismiss-notification", "DismissNotification"),
                ("daemon", "Daemon"),
            ];

            for (name, expected) in cases {
                let cli = Cli::parse_from(["native-timer", name]);
                assert_eq!(format!("{:?}", cli.command.unwrap()), expected);
            }
        }

        #[test]
        fn test_parse_notify() {
            let cli = Cli::parse_from(["native-timer", "notify", "Work", "00:01:00"]);
            match cli.command {
                Some(Commands::Notify { title, body }) => {
                    assert_eq!(title, "Work");
                    assert_eq!(body, "00:01:00");
                }
                _ => panic!("Expected Notify command"),
            }
        }

        #[test]
        fn test_parse_cancel_with_reason() {
            let cli = Cli::parse_from(["native-timer", "cancel", "--reason", "admin"]);
            match cli.command {
                Some(Commands::Cancel { reason }) => assert_eq!(reason, Some("admin".to_string())),
                _ => panic!("Expected Cancel command"),
            }

            let cli = Cli::parse_from(["native-timer", "end-all"]);
            assert!(matches!(cli.command, Some(Commands::EndAll { reason: None })));
        }
    }

    // ------------------------------------------------------------------------
    // StartArgs Tests
    // ------------------------------------------------------------------------

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_start_defaults() {
            let cli = Cli::parse_from(["native-timer", "start"]);
            match cli.command {
                Some(Commands::Start(args)) => {
                    assert_eq!(args.title, "Timer");
                    assert_eq!(args.body, "Running");
                    assert!(args.start_time.is_none());
                    assert!(args.color.is_none());
                }
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_with_options() {
            let cli = Cli::parse_from([
                "native-timer",
                "start",
                "--title",
                "Work",
                "--start-time",
                "1700000000000",
                "--color",
                "#ff0000",
            ]);
            match cli.command {
                Some(Commands::Start(args)) => {
                    assert_eq!(args.title, "Work");
                    assert_eq!(args.start_time, Some(1_700_000_000_000));
                    assert_eq!(args.color, Some("#ff0000".to_string()));
                }
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_rejects_bad_color() {
            let result = Cli::try_parse_from(["native-timer", "start", "--color", "red"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_start_rejects_empty_title() {
            let result = Cli::try_parse_from(["native-timer", "start", "--title", ""]);
            assert!(result.is_err());
        }
    }

    // ------------------------------------------------------------------------
    // Live Tests
    // ------------------------------------------------------------------------

    mod live_tests {
        use super::*;

        #[test]
        fn test_parse_live_start() {
            let cli = Cli::parse_from(["native-timer", "live", "start", "Work", "-s", "Paused"]);
            match cli.command {
                Some(Commands::Live {
                    command: LiveCommands::Start(args),
                }) => {
                    assert_eq!(args.title, "Work");
                    assert_eq!(args.status, "Paused");
                    assert_eq!(args.elapsed, "00:00:00");
                }
                _ => panic!("Expected live start"),
            }
        }

        #[test]
        fn test_parse_live_update() {
            let cli = Cli::parse_from(["native-timer", "live", "update", "p1", "-e", "00:00:30"]);
            match cli.command {
                Some(Commands::Live {
                    command: LiveCommands::Update { id, elapsed, status },
                }) => {
                    assert_eq!(id, "p1");
                    assert_eq!(elapsed, "00:00:30");
                    assert_eq!(status, "Running");
                }
                _ => panic!("Expected live update"),
            }
        }

        #[test]
        fn test_parse_live_stop_all() {
            let cli = Cli::parse_from(["native-timer", "live", "stop-all"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Live {
                    command: LiveCommands::StopAll
                })
            ));
        }

        #[test]
        fn test_live_stop_requires_id() {
            let result = Cli::try_parse_from(["native-timer", "live", "stop"]);
            assert!(result.is_err());
        }
    }

    // ------------------------------------------------------------------------
    // Validation Tests
    // ------------------------------------------------------------------------

    mod validation_tests {
        use super::*;

        #[test]
        fn test_validate_text() {
            assert!(validate_text("Work").is_ok());
            assert!(validate_text("   ").is_err());
            assert!(validate_text(&"a".repeat(100)).is_ok());
            assert!(validate_text(&"a".repeat(101)).is_err());
        }

        #[test]
        fn test_validate_color() {
            assert!(validate_color("#0045a5").is_ok());
            assert!(validate_color("#0045A5").is_ok());
            assert!(validate_color("0045a5").is_err());
            assert!(validate_color("#0045a").is_err());
            assert!(validate_color("#gggggg").is_err());
        }
    }
}
