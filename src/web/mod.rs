// Web server module
// HTTP endpoints for the form upload, raw PUT and relay test transports

mod app;
mod error;
mod handlers;
mod headers;
mod listeners;
mod models;
mod pages;

pub use app::create_app;
pub use headers::AttachmentDisposition;
pub use listeners::create_listener;

use crate::config::ServiceConfig;
use crate::conversion::ConversionService;
use crate::relay::{RelayClient, RelayError};
use std::sync::Arc;

/// Read-only state shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub converter: ConversionService,
    pub relay: RelayClient,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, RelayError> {
        let config = Arc::new(config);
        Ok(Self {
            converter: ConversionService::new(config.clone()),
            relay: RelayClient::new(config.relay_timeout)?,
            config,
        })
    }
}

pub type SharedState = Arc<AppState>;
