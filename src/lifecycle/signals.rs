//! OS signal handling.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for ctrl-c, then trigger shutdown. If the handler cannot be
/// installed the console keeps running until killed.
pub async fn shutdown_on_ctrl_c(shutdown: &Shutdown) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for interrupt");
        std::future::pending::<()>().await;
    }
    tracing::info!("Interrupt received");
    shutdown.trigger();
}
