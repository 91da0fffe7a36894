//! BDD test world for the EduVerse dashboard

use std::sync::Arc;

use cucumber::World;
use eduverse::controller::{DashboardController, DemoSetupReport, StartupReport};
use eduverse::model::CreateOutcome;
use eduverse::state::new_state_handle;
use tokio_util::sync::CancellationToken;

#[path = "fake_backend.rs"]
pub mod fake_backend;

use fake_backend::FakeBackend;

#[derive(Debug, Default, World)]
pub struct EduverseWorld {
    pub backend: Option<Arc<FakeBackend>>,
    pub controller: Option<Arc<DashboardController>>,

    pub startup_report: Option<StartupReport>,
    pub create_result: Option<eduverse::Result<CreateOutcome>>,
    pub demo_result: Option<eduverse::Result<DemoSetupReport>>,

    pub dashboard_status: Option<u16>,
    pub dashboard_response_body: Option<String>,
}

impl EduverseWorld {
    pub fn backend(&mut self) -> Arc<FakeBackend> {
        Arc::clone(
            self.backend
                .get_or_insert_with(|| Arc::new(FakeBackend::default())),
        )
    }

    /// Controller over the fake backend, created on first use
    pub fn controller(&mut self) -> Arc<DashboardController> {
        if let Some(controller) = &self.controller {
            return Arc::clone(controller);
        }
        let backend = self.backend();
        let state = new_state_handle();
        backend.observe_state(Arc::clone(&state));
        let controller = Arc::new(DashboardController::new(
            backend,
            state,
            &CancellationToken::new(),
        ));
        self.controller = Some(Arc::clone(&controller));
        controller
    }
}
