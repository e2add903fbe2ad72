//! Application wiring
//!
//! Builds the shared clock, sweeper and recording unit, starts the supervisor
//! pool and runs until SIGINT/SIGTERM.

use crate::capture::{CaptureBackend, FfmpegBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::liveness;
use crate::recorder::{RecordingUnit, SupervisorPool, RESTART_COOLDOWN};
use crate::retention::RetentionSweeper;
use crate::utils::AppResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Record every configured stream until a shutdown signal arrives
pub async fn serve(config: AppConfig) -> AppResult<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone));
    let sweeper = Arc::new(RetentionSweeper::new(
        config.recording_dir.clone(),
        clock.clone(),
    ));
    let backend: Arc<dyn CaptureBackend> =
        Arc::new(FfmpegBackend::new(config.capture_program.clone()));
    let unit = Arc::new(RecordingUnit::new(
        config.recording_dir.clone(),
        clock,
        backend,
        sweeper.clone(),
    ));

    let cancel = CancellationToken::new();
    let pool =
        SupervisorPool::start(&config.streams, unit, RESTART_COOLDOWN, cancel.clone()).await?;

    let sweeper_task = tokio::spawn(
        sweeper
            .clone()
            .run_periodic(config.sweep_interval, cancel.child_token()),
    );

    let liveness_task = config.port.map(|port| {
        tokio::spawn(liveness::serve(
            port,
            pool.status_board(),
            cancel.child_token(),
        ))
    });

    wait_for_shutdown_signal().await;
    tracing::info!("Shutdown requested, stopping {} recording(s)", pool.len());

    pool.shutdown().await;
    if let Err(e) = sweeper_task.await {
        tracing::error!("Retention sweeper ended abnormally: {}", e);
    }
    if let Some(task) = liveness_task {
        if let Err(e) = task.await {
            tracing::error!("Liveness listener ended abnormally: {}", e);
        }
    }

    tracing::info!("All recordings stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
