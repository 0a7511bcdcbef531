use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::{maintenance, repair};

/// Runs the background loops until a shutdown signal arrives: the sweep that
/// auto-submits expired quiz sessions, and the periodic score repair pass.
pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![
        tokio::spawn(expire_sessions_loop(state.clone(), shutdown_rx.clone())),
        tokio::spawn(repair_loop(state.clone(), shutdown_rx.clone())),
    ];

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn expire_sessions_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_secs(state.settings().quiz().session_sweep_interval_seconds);
    let mut tick = interval(period);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = maintenance::close_expired_sessions(&state).await {
                    tracing::error!(error = %err, "close_expired_sessions failed");
                }
            }
        }
    }
}

async fn repair_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_secs(state.settings().quiz().repair_interval_seconds);
    let mut tick = interval(period);
    // The first tick fires immediately; skip it so a worker restart does not
    // rescan the whole table every time.
    let mut first = true;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if first {
                    first = false;
                    continue;
                }
                if let Err(err) = repair::repair_score_data(&state).await {
                    tracing::error!(error = %err, "repair_score_data failed");
                }
            }
        }
    }
}
