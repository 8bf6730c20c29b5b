use kv_engine::Store;
use parlor::repository::ChatRepository;
use parlor::session::SessionService;
use shared::config::Config;
use std::sync::Arc;

/// Server state shared across handlers. Constructed once at startup and
/// passed by handle into every request path; nothing here is a process-level
/// singleton.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub sessions: Arc<SessionService>,
    pub repository: Arc<dyn ChatRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        sessions: Arc<SessionService>,
        repository: Arc<dyn ChatRepository>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            sessions,
            repository,
            config,
        }
    }
}
