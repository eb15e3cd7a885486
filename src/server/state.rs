//! Shared application state

use crate::core::{OrderRepository, SessionGuard};
use std::sync::Arc;

/// Cookie attributes for the admin session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: u64,
}

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn OrderRepository>,
    pub guard: Arc<SessionGuard>,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        guard: SessionGuard,
        cookies: CookieSettings,
    ) -> Self {
        Self {
            repository,
            guard: Arc::new(guard),
            cookies,
        }
    }
}
