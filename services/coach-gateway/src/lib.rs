//! Coach Gateway - backend gateway for the health coach desktop client
//!
//! Funnels every call the client makes to the remote analytics service
//! through one pooled transport, caches session-immutable reference data,
//! tracks backend reachability and marshals results back to the UI task.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod io;
pub mod types;

pub use config::{load_config, Config};
pub use connectivity::{ConnectivityHandle, ConnectivityMonitor, ConnectivityState, Transition};
pub use dispatch::{Completion, Delivery, DispatchError, Origin, Ticket, UiContext};
pub use document::Document;
pub use error::{GatewayError, Result, SetupError};
pub use gateway::{Gateway, Operation, Reply};
pub use io::{ReqwestTransport, Transport};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Composition root: builds the gateway and its collaborators from config.
///
/// The transport can be swapped for a test double before building.
pub struct GatewayBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
}

impl GatewayBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> std::result::Result<Backend, SetupError> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config.transport)?),
        };

        let gateway = Arc::new(Gateway::new(
            self.config.backend.base_url.clone(),
            transport,
        ));
        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::clone(&gateway) as Arc<dyn connectivity::Probe>,
            self.config.connectivity.clone(),
        ));
        let ui = UiContext::new(Arc::clone(&gateway), &self.config.dispatch);

        tracing::info!("Gateway ready for {}", gateway.base_url());
        Ok(Backend {
            gateway,
            monitor,
            ui,
            cancel: CancellationToken::new(),
        })
    }
}

/// Everything the presentation layer needs, wired together.
///
/// The monitor stays private: its poller is the only writer of connectivity,
/// and callers read it through `connectivity()`.
pub struct Backend {
    pub gateway: Arc<Gateway>,
    monitor: Arc<ConnectivityMonitor>,
    pub ui: UiContext,
    cancel: CancellationToken,
}

impl Backend {
    pub fn connectivity(&self) -> ConnectivityHandle {
        self.monitor.handle()
    }

    /// Start the polling loop on a background task
    pub fn start_monitor(&self) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(&self.monitor);
        let cancel = self.cancel.clone();
        tokio::spawn(async move { monitor.run(cancel).await })
    }

    /// Stop the polling loop and cancel outstanding calls
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.ui.dispatcher().shutdown();
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Run the connectivity monitor and log transitions until ctrl-c
pub async fn watch(config: Config) -> std::result::Result<(), SetupError> {
    let backend = GatewayBuilder::new(config).build()?;
    let mut transitions = backend.connectivity().subscribe();
    let monitor = backend.start_monitor();

    let cancel = backend.cancellation();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::warn!("Failed to listen for ctrl-c: {}", e),
        }
        cancel.cancel();
    });

    let cancel = backend.cancellation();
    loop {
        tokio::select! {
            event = transitions.recv() => match event {
                Ok(transition) => tracing::info!(
                    "Connectivity {} -> {}",
                    transition.previous,
                    transition.current
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Missed {} connectivity events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = cancel.cancelled() => break,
        }
    }

    backend.shutdown();
    if let Err(e) = monitor.await {
        tracing::warn!("Connectivity monitor task failed: {}", e);
    }
    tracing::info!("Connectivity monitor stopped");
    Ok(())
}
