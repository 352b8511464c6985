//! Focus Coach CLI
//!
//! A focus timer with a chat study partner:
//! - 20 minutes of focused work
//! - 5 minutes of break with an activity suggestion from the coach
//! - Back to idle until the next session is started

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use focus_coach::cli::{Cli, Commands, DaemonArgs, Display, IpcClient};
use focus_coach::daemon::{self, DaemonConfig};
use focus_coach::logging;

/// Interval between clock refreshes in `watch`
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // The daemon logs its lifecycle, client commands only warnings
    let default_level = match cli.command {
        Some(Commands::Daemon(_)) => "info",
        _ => "warn",
    };
    let _log_guard = logging::init(cli.verbose, default_level, cli.log_file.as_deref());

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start) => {
            let response = client(&cli.socket)?.start().await?;
            Display::show_start_success(&response);
        }
        Some(Commands::Reset) => {
            let response = client(&cli.socket)?.reset().await?;
            Display::show_reset_success(&response);
        }
        Some(Commands::Status) => {
            let response = client(&cli.socket)?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Watch) => {
            watch(&client(&cli.socket)?).await?;
        }
        Some(Commands::Chat { message }) => {
            let response = client(&cli.socket)?.chat(&message.join(" ")).await?;
            Display::show_reply(&response);
        }
        Some(Commands::History) => {
            let response = client(&cli.socket)?.history().await?;
            Display::show_history(&response);
        }
        Some(Commands::Listen) => {
            let response = client(&cli.socket)?.listen().await?;
            Display::show_reply(&response);
        }
        Some(Commands::Daemon(args)) => {
            let config = daemon_config(args, cli.socket)?;
            daemon::runtime::run(config).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Creates a client for the given socket, or the default one.
fn client(socket: &Option<std::path::PathBuf>) -> Result<IpcClient> {
    match socket {
        Some(path) => Ok(IpcClient::with_socket_path(path.clone())),
        None => IpcClient::new(),
    }
}

/// Builds the daemon configuration from the command line.
fn daemon_config(args: DaemonArgs, socket: Option<std::path::PathBuf>) -> Result<DaemonConfig> {
    let socket_path = match socket {
        Some(path) => path,
        None => daemon::default_socket_path()?,
    };

    Ok(DaemonConfig {
        socket_path,
        timer: args.timer_config(),
        provider: args.provider,
        desktop_notifications: !args.no_notify,
        speak_cmd: args.speak_cmd,
        voice: args.voice,
        listen_cmd: args.listen_cmd,
    })
}

/// Redraws the clock every second until Ctrl-C.
async fn watch(client: &IpcClient) -> Result<()> {
    let mut interval = tokio::time::interval(WATCH_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = interval.tick() => {
                let response = client.status().await?;
                Display::show_clock_frame(&response);
            }
        }
    }
    println!();
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

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_daemon_config_from_args() {
        let args = DaemonArgs {
            focus: 25,
            no_notify: true,
            ..Default::default()
        };

        let config = daemon_config(args, Some(PathBuf::from("/tmp/coach.sock"))).unwrap();

        assert_eq!(config.socket_path, PathBuf::from("/tmp/coach.sock"));
        assert_eq!(config.timer.focus_seconds, 1500);
        assert_eq!(config.timer.break_seconds, 300);
        assert!(!config.desktop_notifications);
    }

    #[test]
    fn test_client_uses_socket_flag() {
        let client = client(&Some(PathBuf::from("/tmp/other.sock"))).unwrap();
        assert_eq!(client.socket_path(), &PathBuf::from("/tmp/other.sock"));
    }

    #[test]
    fn test_completions_command_builds() {
        Cli::command().debug_assert();
    }
}
