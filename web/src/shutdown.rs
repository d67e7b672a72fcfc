use ::sse::{ClientId, Manager};
use log::*;
use std::future::Future;
use std::io;
use std::sync::Arc;

/// Awaits `signal`, then shuts the SSE registry down.
///
/// Passed to axum's graceful shutdown: ending every event stream first lets the
/// in-flight responses finish instead of being cut, and the registry refuses
/// streams that arrive while axum drains.
pub async fn close_on(signal: impl Future<Output = ()>, sse_manager: Arc<Manager>) {
    signal.await;
    info!("Shutdown signal received, closing SSE connections");
    sse_manager.shutdown();
}

/// Installs the SIGINT and SIGTERM handlers and returns a future resolving on either.
#[cfg(unix)]
pub fn termination_signal() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {},
            _ = terminate.recv() => {},
        }
    })
}

#[cfg(not(unix))]
pub fn termination_signal() -> io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl+C, shutdown by signal is disabled: {e}");
            std::future::pending::<()>().await;
        }
    })
}

/// Logs the registry contents every time SIGUSR1 arrives, without stopping the server.
#[cfg(unix)]
pub fn spawn_registry_report(sse_manager: Arc<Manager>) -> io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut user_signal = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        while user_signal.recv().await.is_some() {
            info!("{}", registry_report(&sse_manager));
        }
    }))
}

fn registry_report(sse_manager: &Manager) -> String {
    let ids = sse_manager.client_ids();
    let listed: Vec<&str> = ids.iter().map(ClientId::as_str).collect();
    format!(
        "SSE registry: {} connection(s) [{}]",
        ids.len(),
        listed.join(", ")
    )
}
