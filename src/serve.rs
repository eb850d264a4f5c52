//! Newline-delimited JSON request loop.

use std::io::{BufRead, Write};

use anyhow::Context;
use gridlock_core::DocumentStore;
use gridlock_core::protocol;

/// Answer each request line from `input` with one response line on `output`
/// until EOF. Blank lines are skipped. Returns the number of requests handled.
pub fn serve<R: BufRead, W: Write>(store: &DocumentStore, input: R, mut output: W) -> anyhow::Result<usize> {
    let mut handled = 0;
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = protocol::handle_json(store, &line);
        if response.is_error() {
            tracing::debug!(status = response.status_code(), "request failed");
        }
        serde_json::to_writer(&mut output, &response).context("Failed to encode response")?;
        output.write_all(b"\n")?;
        output.flush()?;
        handled += 1;
    }
    tracing::info!(handled, "input closed");
    Ok(handled)
}
