use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::state::AppState;
use crate::tasks::credit_refill;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![tokio::spawn(credit_refill_loop(state.clone(), shutdown_rx.clone()))];

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

async fn credit_refill_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let minutes = state.settings().credits().refill_interval_minutes.max(1);
    let mut tick = interval(Duration::from_secs(minutes * 60));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; a restart should not grant an extra refill.
    tick.tick().await;

    tracing::info!(interval_minutes = minutes, "Credit refill loop started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = credit_refill::run_once(&state).await {
                    tracing::error!(error = %err, "credit refill failed");
                }
            }
        }
    }
}
