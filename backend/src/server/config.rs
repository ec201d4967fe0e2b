//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use healthsyntra::config::AppSettings;
use healthsyntra::inbound::http::session_config::SessionSettings;

/// Everything `create_server` needs, resolved before the listener binds.
pub struct ServerConfig {
    pub(crate) settings: AppSettings,
    pub(crate) session: Arc<SessionSettings>,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub fn new(settings: AppSettings, session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            settings,
            session: Arc::new(session),
            bind_addr,
        }
    }
}
