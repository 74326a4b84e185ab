//! CLI command definitions for the `tutor` binary.

pub mod chat;
pub mod flush;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;

use tutor_core::service::shutdown::{CheckpointDisposition, ShutdownReport};

/// Classroom tutor bot: per-student sessions with durable, archived logs.
#[derive(Parser)]
#[command(name = "tutor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP endpoint the chat transport posts messages to.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Chat from the terminal as the student of one channel.
    Chat {
        /// Channel label, `<student id>-<level>` (e.g. 10531-01).
        #[arg(short, long)]
        channel: String,
    },

    /// Archive a leftover checkpoint without starting the bot.
    Flush,

    /// Show what is on disk: snapshots, checkpoint, summaries.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Print the outcome of the shutdown sequence.
pub fn print_shutdown_report(report: &ShutdownReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match (&report.flush, &report.flush_error) {
        (Some(flush), _) if flush.entries > 0 => println!(
            "  {} Archived {} entries for {} student(s)",
            style("✓").green(),
            flush.entries,
            flush.students
        ),
        (Some(_), _) => println!("  {} Nothing to archive", style("✓").green()),
        (None, Some(err)) => println!("  {} Archive failed: {err}", style("✗").red()),
        (None, None) => {}
    }
    if report.summaries_written > 0 {
        println!(
            "  {} Updated {} summar{}",
            style("✓").green(),
            report.summaries_written,
            if report.summaries_written == 1 { "y" } else { "ies" }
        );
    }
    if report.summary_failures > 0 {
        println!(
            "  {} {} summary update(s) failed",
            style("!").yellow(),
            report.summary_failures
        );
    }
    match report.checkpoint {
        CheckpointDisposition::Removed => {}
        CheckpointDisposition::Kept => println!(
            "  {} Checkpoint kept; run {} once the archive is writable",
            style("!").yellow(),
            style("tutor flush").cyan()
        ),
        CheckpointDisposition::Failed => {
            println!("  {} Checkpoint could not be updated", style("✗").red())
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_with_global_flags() {
        let cli = Cli::try_parse_from(["tutor", "-vv", "chat", "--channel", "10531-02", "--json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        match cli.command {
            Commands::Chat { channel } => assert_eq!(channel, "10531-02"),
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["tutor", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("expected serve"),
        }
    }
}
