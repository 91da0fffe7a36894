//! Shared dashboard state

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::model::{HealthStatus, Institution, Student};

/// Transient form input for creating an institution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub name: String,
    pub subdomain: String,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub health: Option<HealthStatus>,
    pub institutions: Vec<Institution>,
    pub students: Vec<Student>,
    pub form: FormState,
    pub loading: bool,
    /// Last message addressed to the user
    pub notice: Option<String>,
}

impl DashboardState {
    pub fn collections_count(&self) -> usize {
        self.health
            .as_ref()
            .map(|h| h.collections.len())
            .unwrap_or(0)
    }

    pub fn first_institution(&self) -> Option<&Institution> {
        self.institutions.first()
    }

    /// Replace the institution list wholesale with the server's view
    pub fn replace_institutions(&mut self, institutions: Vec<Institution>) {
        self.institutions = institutions;
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(DashboardState::default()))
}
