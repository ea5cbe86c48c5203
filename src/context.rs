use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{SessionStore, TicketService};
use crate::validate::Catalogs;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub tickets: Arc<dyn TicketService>,
    pub catalogs: Catalogs,
    pub sessions: Arc<dyn SessionStore>,
    pub session_key: String,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        tickets: Arc<dyn TicketService>,
        catalogs: Catalogs,
        sessions: Arc<dyn SessionStore>,
        session_key: String,
    ) -> Self {
        Self {
            config,
            tickets,
            catalogs,
            sessions,
            session_key,
        }
    }
}
