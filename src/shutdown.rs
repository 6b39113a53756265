//! Ctrl+C / SIGTERM handling for the daily batch.
//!
//! The first signal cancels a [`CancellationToken`]; the driver checks it
//! between series so a data file or state write is never cut in half. A
//! second signal exits at once with status 130.

use tokio_util::sync::CancellationToken;

/// Exit status used when a second signal forces the process down.
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    /// Stop after the series in progress.
    Drain,
    /// Stop now.
    Abort,
}

/// Decide what the `received`-th signal (counting from one) means.
fn escalate(received: u32, token: &CancellationToken) -> Escalation {
    if received <= 1 {
        token.cancel();
        Escalation::Drain
    } else {
        Escalation::Abort
    }
}

/// Wait for the next SIGINT or SIGTERM. `None` when no listener could be set up.
#[cfg(unix)]
async fn next_signal(
    sigterm: &mut Option<tokio::signal::unix::Signal>,
) -> Option<&'static str> {
    match sigterm {
        Some(term) => tokio::select! {
            res = tokio::signal::ctrl_c() => res.ok().map(|()| "SIGINT"),
            _ = term.recv() => Some("SIGTERM"),
        },
        None => tokio::signal::ctrl_c().await.ok().map(|()| "SIGINT"),
    }
}

/// Install the listener and return the token it cancels.
pub(crate) fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm = {
            use tokio::signal::unix::{signal, SignalKind};
            signal(SignalKind::terminate())
                .inspect_err(|e| tracing::warn!(error = %e, "SIGTERM will not stop the batch"))
                .ok()
        };

        let mut received = 0;
        loop {
            #[cfg(unix)]
            let name = next_signal(&mut sigterm).await;
            #[cfg(not(unix))]
            let name = tokio::signal::ctrl_c().await.ok().map(|()| "Ctrl+C");

            let Some(name) = name else {
                tracing::warn!("Could not listen for Ctrl+C, the batch cannot be stopped cleanly");
                return;
            };

            received += 1;
            match escalate(received, &handler_token) {
                Escalation::Drain => {
                    tracing::info!(signal = name, "Stopping after the current series");
                    tracing::info!("Send the signal again to exit immediately");
                }
                Escalation::Abort => {
                    tracing::warn!(signal = name, "Exiting without finishing the batch");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        }
    });

    token
}
