//! Interactive query loop
//!
//! Each input line is a query. Searches run concurrently; the session guard
//! ensures only the most recent one is rendered.

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::render::{render_analytics, render_search, to_json, OutputFormat};
use crate::App;

const ANALYTICS_COMMAND: &str = ":analytics";
const QUIT_COMMANDS: &[&str] = &[":q", ":quit", ":exit"];
const ANALYTICS_TOP: usize = 10;

/// Read queries from `input` until EOF or a quit command, writing views to `out`
///
/// Returns once every spawned search has finished.
pub async fn run_interactive<R, W>(
    app: Arc<App>,
    input: R,
    out: Arc<Mutex<W>>,
    format: OutputFormat,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let query = line.trim().to_string();
        if query.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&query.as_str()) {
            break;
        }

        let app = Arc::clone(&app);
        let out = Arc::clone(&out);

        if query == ANALYTICS_COMMAND {
            tasks.spawn(async move {
                let text = match app.analytics().await {
                    Ok(analytics) => match format {
                        OutputFormat::Text => render_analytics(&analytics, ANALYTICS_TOP),
                        OutputFormat::Json => to_json(&analytics),
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Analytics failed");
                        format!("Analytics failed: {}\n", e.user_message())
                    }
                };
                write_out(&out, &text).await;
            });
            continue;
        }

        let request = app.request(&query);
        if let Err(e) = request.validate() {
            write_out(&out, &format!("{}\n", e)).await;
            continue;
        }

        // Tickets are issued here, in input order, never inside the tasks
        let ticket = app.session.begin(&request.query).await;
        tasks.spawn(async move {
            let Some(view) = app.submit_with(ticket, request).await else {
                return;
            };
            let text = render_search(&view, format);

            // A newer search may have been submitted since this one was
            // accepted; holding the output lock orders the check with its write
            let mut out = out.lock().await;
            if !app.session.is_current(ticket).await {
                tracing::debug!(ticket = ticket.id(), "Dropping superseded view before output");
                return;
            }
            write_locked(&mut *out, &text);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Search task panicked");
        }
    }
    Ok(())
}

async fn write_out<W: Write>(out: &Mutex<W>, text: &str) {
    let mut out = out.lock().await;
    write_locked(&mut *out, text);
}

fn write_locked<W: Write>(out: &mut W, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        tracing::warn!(error = %e, "Failed to write output");
    }
}
