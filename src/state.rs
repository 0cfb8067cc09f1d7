use std::fmt;

use axum::extract::FromRef;
use sqlx::AnyPool;

use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: AnyPool,
    pub notifier: Notifier,
}

impl AppState {
    pub const fn new(db_pool: AnyPool, notifier: Notifier) -> Self {
        Self { db_pool, notifier }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("db_pool", &self.db_pool)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl FromRef<AppState> for AnyPool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}
