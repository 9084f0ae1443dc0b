//! Runtime - optional graceful shutdown and the inter-cycle pause

use std::time::Duration;
use tokio::sync::broadcast;

/// Stop request fanned out to every running loop. Clones share one channel.
#[derive(Clone)]
pub struct Shutdown {
    sender: broadcast::Sender<()>,
}

impl Default for Shutdown {
    fn default() -> Self { Self::new() }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Receiver to hand to [`pause`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Ask every subscribed loop to stop. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.sender.send(()).unwrap_or(0)
    }
}

/// Install SIGINT/SIGTERM handlers and return the shutdown handle
pub fn install_signal_handlers() -> Shutdown {
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.expect("Ctrl+C handler");
            tracing::info!("Received Ctrl+C");
        }

        let loops = handle.trigger();
        tracing::info!(loops, "shutdown requested");
    });

    shutdown
}

/// Sleep `interval` between cycles. Returns false if shutdown fired first
/// (including while the previous cycle was running).
pub async fn pause(interval: Duration, shutdown: &mut Option<broadcast::Receiver<()>>) -> bool {
    match shutdown {
        Some(rx) => tokio::select! {
            _ = rx.recv() => false,
            _ = tokio::time::sleep(interval) => true,
        },
        None => {
            tokio::time::sleep(interval).await;
            true
        }
    }
}
