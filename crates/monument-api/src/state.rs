use std::sync::Arc;

use crate::registry::Registry;

/// Shared application state handed to every `axum` handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub admin_secret: Arc<str>,
    pub default_chat_length: usize,
    pub default_history_length: usize,
}

impl AppState {
    #[must_use]
    pub fn new(
        registry: Registry,
        admin_secret: impl Into<Arc<str>>,
        default_chat_length: usize,
        default_history_length: usize,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            admin_secret: admin_secret.into(),
            default_chat_length,
            default_history_length,
        }
    }
}
