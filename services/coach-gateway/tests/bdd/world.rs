//! BDD test world for the coach gateway

use std::sync::Arc;

use cucumber::World;
use coach_gateway::config::{ConnectivityConfig, DispatchConfig};
use coach_gateway::connectivity::Probe;
use coach_gateway::types::ReferenceList;
use coach_gateway::{ConnectivityMonitor, Gateway, GatewayError, Transition, UiContext};

use crate::common::FakeTransport;

#[derive(Debug, Default, World)]
pub struct GatewayWorld {
    pub transport: Option<Arc<FakeTransport>>,
    pub gateway: Option<Arc<Gateway>>,
    pub monitor: Option<ConnectivityMonitor>,

    // Connectivity
    pub transitions: Vec<Transition>,

    // Cache and error fidelity
    pub fetches: Vec<coach_gateway::Result<Arc<ReferenceList>>>,
    pub last_error: Option<GatewayError>,

    // Dispatch
    pub ui: Option<UiContext>,
    pub rendered: usize,
}

impl GatewayWorld {
    /// Wire a gateway, monitor and UI context around `transport`
    pub fn install(&mut self, transport: FakeTransport) {
        let transport = Arc::new(transport);
        let gateway = Arc::new(Gateway::new("http://backend.test:5000", transport.clone()));
        self.monitor = Some(ConnectivityMonitor::new(
            Arc::clone(&gateway) as Arc<dyn Probe>,
            ConnectivityConfig::default(),
        ));
        self.ui = Some(UiContext::new(
            Arc::clone(&gateway),
            &DispatchConfig::default(),
        ));
        self.gateway = Some(gateway);
        self.transport = Some(transport);
    }

    pub fn transport(&self) -> &FakeTransport {
        self.transport.as_ref().expect("transport not set")
    }

    pub fn gateway(&self) -> &Gateway {
        self.gateway.as_ref().expect("gateway not set")
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        self.monitor.as_ref().expect("monitor not set")
    }

    pub fn ui(&mut self) -> &mut UiContext {
        self.ui.as_mut().expect("ui context not set")
    }
}
