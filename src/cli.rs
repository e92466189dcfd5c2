//! CLI - Command Line Interface for hlsdeck
//!
//! Every TUI action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Run the proxy in front of the backend
//! hlsdeck serve --listen 0.0.0.0:3000
//!
//! # Browse the catalog
//! hlsdeck list --json
//! hlsdeck info v1
//!
//! # Play through the proxy
//! hlsdeck play v1 --player vlc
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::playback::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Video not found
    NotFound = 4,
    /// Playback failed
    PlaybackFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// hlsdeck - video catalog browser with HLS playback
///
/// Run without arguments to launch the interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "hlsdeck",
    version,
    about = "Video catalog browser with HLS playback through a backend proxy",
    long_about = "Browse a video backend's catalog and play its HLS streams \
                  through a local proxy.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  hlsdeck                             Launch interactive TUI\n\
                  hlsdeck serve                       Run the proxy\n\
                  hlsdeck list --json                 Print the catalog\n\
                  hlsdeck play v1 --relay             Play through the segment relay"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Video backend base URL
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Proxy base URL used by the catalog client and players
    #[arg(long, global = true)]
    pub proxy_url: Option<String>,

    /// Run the proxy in-process on an ephemeral port
    #[arg(long, short = 'e', global = true)]
    pub embedded: bool,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP proxy in front of the video backend
    Serve(ServeCmd),

    /// List the catalog
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Show one catalog entry
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Play a video in a local player
    #[command(visible_alias = "p")]
    Play(PlayCmd),
}

/// Run the proxy
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Socket address to bind (e.g. 0.0.0.0:3000)
    #[arg(long, short = 'l')]
    pub listen: Option<String>,

    /// Directory served by /api/videos/local
    #[arg(long)]
    pub local_catalog: Option<PathBuf>,
}

/// List the catalog
#[derive(Args, Debug)]
pub struct ListCmd {
    /// Maximum number of entries
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Use the proxy's local-directory catalog
    #[arg(long)]
    pub local: bool,
}

/// Show one catalog entry
#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Video id
    #[arg(required = true)]
    pub id: String,
}

/// Play a video
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Video id (defaults to the first catalog entry)
    pub id: Option<String>,

    /// Local player
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Feed segments through the built-in relay instead of letting the
    /// player fetch HLS itself
    #[arg(long)]
    pub relay: bool,
}

/// Player selection for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerChoice {
    Mpv,
    Vlc,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Mpv => PlayerType::Mpv,
            PlayerChoice::Vlc => PlayerType::Vlc,
        }
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Playback result for `play`
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayResponse {
    pub id: String,
    pub title: String,
    pub source: String,
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_tui_mode() {
        let cli = Cli::try_parse_from(["hlsdeck"]).unwrap();
        assert!(!cli.is_cli_mode());
    }

    #[test]
    fn test_play_command() {
        let cli = Cli::try_parse_from(["hlsdeck", "play", "v1", "--player", "vlc", "--relay"])
            .unwrap();
        match cli.command {
            Some(Command::Play(cmd)) => {
                assert_eq!(cmd.id.as_deref(), Some("v1"));
                assert_eq!(cmd.player, Some(PlayerChoice::Vlc));
                assert!(cmd.relay);
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "hlsdeck",
            "list",
            "--backend",
            "http://media.lan:5000",
            "-e",
            "-j",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.embedded);
        assert_eq!(cli.backend.as_deref(), Some("http://media.lan:5000"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
        assert_eq!(i32::from(ExitCode::PlaybackFailed), 5);
    }

    #[test]
    fn test_json_error_shape() {
        let out = JsonOutput::<()>::error_msg("Video not found: v9", ExitCode::NotFound);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["error"], "Video not found: v9");
        assert_eq!(json["exit_code"], 4);
        assert!(json.get("data").is_none());
    }
}
