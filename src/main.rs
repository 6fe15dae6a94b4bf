//! Native Timer CLI
//!
//! Runs the timer daemon or talks to a running one:
//! - Timer session with a background notification
//! - Live statuses (start, update, stop)
//! - Remote cancellation signals

use anyhow::Result;
use clap::{CommandFactory, Parser};

use native_timer::cli::{Cli, Commands, Display, IpcClient, LiveCommands, StartArgs};
use native_timer::config::NativeTimerConfig;
use native_timer::daemon;
use native_timer::types::RemoteSignal;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "native_timer=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = NativeTimerConfig::load(cli.config.as_deref())?;
    if let Some(socket) = cli.socket {
        config.socket_path = Some(socket);
    }

    match command {
        Commands::Completions { shell } => generate_completions(shell),
        Commands::Daemon => daemon::run(config).await?,
        Commands::Live { command } => execute_live(&connect(&config)?, command).await?,
        Commands::Start(args) => {
            let start_time = args
                .start_time
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let args = StartArgs {
                start_time: Some(start_time),
                ..args
            };
            connect(&config)?.start_timer(&args).await?;
            Display::show_start_success(start_time);
        }
        Commands::Stop => {
            connect(&config)?.stop_timer().await?;
            Display::show_stop_success();
        }
        Commands::Notify { title, body } => {
            let response = connect(&config)?.update_notification(&title, &body).await?;
            Display::show_message(&response);
        }
        Commands::Status => {
            let response = connect(&config)?.status().await?;
            Display::show_status(&response);
        }
        Commands::Foreground => {
            let response = connect(&config)?.set_foreground(true).await?;
            Display::show_message(&response);
        }
        Commands::Background => {
            let response = connect(&config)?.set_foreground(false).await?;
            Display::show_message(&response);
        }
        Commands::ResetNotification => {
            let response = connect(&config)?.reset_notification().await?;
            Display::show_message(&response);
        }
        Commands::DismissNotification => {
            let response = connect(&config)?.dismiss_notification().await?;
            Display::show_message(&response);
        }
        Commands::Cancel { reason } => {
            let response = connect(&config)?.signal(RemoteSignal::RemoteCancel { reason }).await?;
            Display::show_message(&response);
        }
        Commands::EndAll { reason } => {
            let response = connect(&config)?
                .signal(RemoteSignal::EndAllLiveStatuses { reason })
                .await?;
            Display::show_message(&response);
        }
    }

    Ok(())
}

fn connect(config: &NativeTimerConfig) -> Result<IpcClient> {
    Ok(IpcClient::with_socket_path(config.resolve_socket_path()?))
}

async fn execute_live(client: &IpcClient, command: LiveCommands) -> Result<()> {
    match command {
        LiveCommands::Available => {
            let response = client.live_available().await?;
            Display::show_live_available(&response);
        }
        LiveCommands::Active => {
            let response = client.live_active().await?;
            Display::show_live_active(&response);
        }
        LiveCommands::Start(args) => {
            let response = client.start_live(&args).await?;
            Display::show_live_started(&response);
        }
        LiveCommands::Update {
            id,
            elapsed,
            status,
        } => {
            let response = client.update_live(&id, &elapsed, &status).await?;
            Display::show_message(&response);
        }
        LiveCommands::Stop { id } => {
            let response = client.stop_live(&id).await?;
            Display::show_message(&response);
        }
        LiveCommands::StopAll => {
            let response = client.stop_all_live().await?;
            Display::show_message(&response);
        }
    }
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
