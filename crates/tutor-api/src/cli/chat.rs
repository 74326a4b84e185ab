//! Terminal chat loop.
//!
//! Reads one message per line from stdin and prints the reply chunks, as
//! the student of a single channel. EOF or Ctrl+C ends the session and runs
//! the shutdown sequence.

use std::io::Write;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use tutor_core::agent::orchestrator::Reply;
use tutor_types::identity::StudentIdentity;

use crate::cli::print_shutdown_report;
use crate::state::AppState;

pub async fn run_chat(state: AppState, channel: &str, json: bool) -> Result<()> {
    let identity = StudentIdentity::from_channel_label(channel)?;

    if !json {
        println!();
        println!(
            "  {} Chatting as student {} (level {})",
            style("⚡").bold(),
            style(&identity.student_id).cyan(),
            identity.level
        );
        println!(
            "  {}",
            style("Type a question, `-summarize` to refresh the summary, Ctrl+D to quit").dim()
        );
        println!();
    }

    let cancel = CancellationToken::new();
    let maintenance = state.start_maintenance(cancel.clone());

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    tokio::select! {
        result = converse(&state, channel, input, &mut out, json) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
        }
    }

    maintenance.stop().await;
    let report = state.shutdown().await;
    print_shutdown_report(&report, json)
}

/// Answer every line of `input` until EOF. Returns how many messages were
/// handled.
async fn converse<R, W>(
    state: &AppState,
    channel: &str,
    input: R,
    out: &mut W,
    json: bool,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut handled = 0;

    loop {
        if !json {
            write!(out, "{} ", style("you>").green().bold())?;
            out.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = state.tutor.handle(channel, &line).await;
        render_reply(out, &reply, json)?;
        handled += 1;
    }

    if !json {
        writeln!(out)?;
    }
    Ok(handled)
}

fn render_reply<W: Write>(out: &mut W, reply: &Reply, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(reply)?)?;
        return Ok(());
    }

    match reply {
        Reply::Answer { chunks } => {
            for chunk in chunks {
                writeln!(out, "{} {chunk}", style("tutor>").cyan().bold())?;
            }
        }
        Reply::SummaryAck { message } => writeln!(out, "{}", style(message).dim())?,
        Reply::FormatHint { message } => writeln!(out, "{}", style(message).yellow())?,
        Reply::Failed { message } => writeln!(out, "{}", style(message).red())?,
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_converse_until_eof() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let input: &[u8] = b"what is a loop?\n\n  \nlist -e\n";
        let mut out = Vec::new();

        let handled = converse(&state, "10531-01", input, &mut out, false)
            .await
            .unwrap();

        assert_eq!(handled, 2);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("echo: what is a loop?"));
        assert!(printed.contains("\"list\""), "example request should be expanded: {printed}");
        // Raw text is what gets logged.
        let entries = state.storage.log.entries("10531");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2].content, "list -e");
    }

    #[tokio::test]
    async fn test_converse_json_lines() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let input: &[u8] = b"hello\n-summarize\n";
        let mut out = Vec::new();

        converse(&state, "10531-02", input, &mut out, true).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        let kinds: Vec<String> = printed
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .map(|value| value["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["answer", "summary_ack"]);
    }

    #[tokio::test]
    async fn test_shutdown_after_chat_archives_everything() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = test_state(tmp.path());
        let input: &[u8] = b"one\ntwo\n";
        converse(&state, "10531-01", input, &mut Vec::new(), true)
            .await
            .unwrap();
        state.storage.checkpoints.write_now().await.unwrap();

        let report = state.shutdown().await;

        assert!(report.is_clean());
        assert!(state.storage.log.is_empty());
        let status = state.storage.archive.status().await.unwrap();
        assert_eq!(status.snapshots, 1);
        assert_eq!(status.pending_checkpoint_entries, None);
    }
}
