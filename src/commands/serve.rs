use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::app::{handle, parse_command, AppContext};
use crate::config::LauncherConfig;
use crate::models::{ApiResponse, ProcessStatus};

#[derive(ClapArgs)]
pub struct Args {
    /// Do not push status events between responses
    #[arg(long)]
    pub no_events: bool,
}

pub async fn execute(args: Args, config: LauncherConfig) -> Result<()> {
    let ctx = Arc::new(AppContext::open(config)?);
    let tasks = ctx.start().await;
    tracing::info!("Serving commands on stdin");

    let reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let result = serve_lines(&ctx, reader, &mut stdout, !args.no_events, shutdown).await;

    ctx.shutdown().await;
    tasks.stop();
    result
}

fn status_event(status: &ProcessStatus) -> Result<String> {
    Ok(serde_json::to_string(&json!({ "event": "status", "data": status }))?)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Answer one JSON response line per request line until input ends, the
/// window host closes, or `shutdown` resolves.
pub async fn serve_lines<R, W, F>(
    ctx: &AppContext,
    reader: R,
    writer: &mut W,
    push_status: bool,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut statuses = ctx.processes().subscribe();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read command")? else {
                    tracing::info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response: ApiResponse = match parse_command(&line) {
                    Ok(command) => handle(ctx, command).await,
                    Err(failed) => failed,
                };
                write_line(writer, &serde_json::to_string(&response)?).await?;

                if ctx.window().is_closed() {
                    tracing::info!("Window closed");
                    break;
                }
            }
            Some(status) = statuses.recv(), if push_status => {
                write_line(writer, &status_event(&status)?).await?;
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    statuses.unsubscribe();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::harness;
    use serde_json::Value;

    fn responses(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .filter(|v| v.get("event").is_none())
            .collect()
    }

    #[tokio::test]
    async fn one_response_per_request() {
        let h = harness();
        let input = b"{\"command\":\"get_version\"}\n\n{\"command\":\"bogus\"}\n";
        let mut output = Vec::new();

        serve_lines(&h.ctx, &input[..], &mut output, false, std::future::pending())
            .await
            .unwrap();

        let responses = responses(&output);
        assert_eq!(responses.len(), 2, "serve_lines: blank lines get no response");
        assert_eq!(responses[0]["success"], true);
        assert_eq!(responses[1]["success"], false);
    }

    #[tokio::test]
    async fn close_window_ends_loop() {
        let h = harness();
        let input = b"{\"command\":\"close_window\"}\n{\"command\":\"get_version\"}\n";
        let mut output = Vec::new();

        serve_lines(&h.ctx, &input[..], &mut output, false, std::future::pending())
            .await
            .unwrap();

        assert_eq!(responses(&output).len(), 1);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_loop() {
        let h = harness();
        let (_keep_open, reader) = tokio::io::duplex(64);
        let mut output = Vec::new();

        serve_lines(
            &h.ctx,
            BufReader::new(reader),
            &mut output,
            true,
            std::future::ready(()),
        )
        .await
        .unwrap();

        assert!(output.is_empty());
    }

    #[test]
    fn status_event_shape() {
        let line = status_event(&ProcessStatus::from_instances(Vec::new())).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "status");
        assert_eq!(value["data"]["isRunning"], false);
    }
}
