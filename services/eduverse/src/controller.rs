//! Dashboard controller: owns the dashboard state and drives the backend
//!
//! Every backend request is raced against the controller's cancellation
//! token. Once the controller is shut down (or dropped) pending requests
//! resolve to [`EduverseError::Cancelled`] and no further state is written.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::backend::BackendApi;
use crate::error::{DemoStep, EduverseError, Result};
use crate::model::{CreateOutcome, Institution, NewBatch, NewInstitution, NewUser, Student};
use crate::state::{DashboardState, FormState, StateHandle};

/// Outcome of the two startup fetches
#[derive(Debug)]
pub struct StartupReport {
    pub health: Result<()>,
    pub institutions: Result<()>,
}

impl StartupReport {
    pub fn is_complete(&self) -> bool {
        self.health.is_ok() && self.institutions.is_ok()
    }
}

/// What demo setup produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoSetupReport {
    pub institution_id: String,
    pub students: Vec<Student>,
}

/// Keeps the loading flag raised while an institution is being created
struct LoadingGuard {
    state: StateHandle,
    armed: bool,
}

impl LoadingGuard {
    async fn engage(state: &StateHandle) -> Self {
        state.write().await.loading = true;
        Self {
            state: Arc::clone(state),
            armed: true,
        }
    }

    /// Raise the flag on state the caller already holds locked
    fn raise(state: &StateHandle, locked: &mut DashboardState) -> Self {
        locked.loading = true;
        Self {
            state: Arc::clone(state),
            armed: true,
        }
    }

    async fn release(mut self) {
        self.state.write().await.loading = false;
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // The owning future was dropped mid-request
        if let Ok(mut state) = self.state.try_write() {
            state.loading = false;
        } else if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = Arc::clone(&self.state);
            handle.spawn(async move {
                state.write().await.loading = false;
            });
        }
    }
}

/// The dashboard controller
pub struct DashboardController {
    backend: Arc<dyn BackendApi>,
    state: StateHandle,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DashboardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl DashboardController {
    /// Create a controller whose lifetime is bounded by `parent`
    pub fn new(
        backend: Arc<dyn BackendApi>,
        state: StateHandle,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            backend,
            state,
            cancel: parent.child_token(),
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Abort in-flight requests and stop writing state
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Dashboard controller shutting down");
            self.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn guarded<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EduverseError::Cancelled),
            result = request => result,
        }
    }

    async fn apply(&self, update: impl FnOnce(&mut DashboardState)) -> Result<()> {
        let mut state = self.state.write().await;
        if self.cancel.is_cancelled() {
            return Err(EduverseError::Cancelled);
        }
        update(&mut state);
        Ok(())
    }

    async fn notify(&self, notice: String) {
        if let Err(e) = self.apply(|s| s.notice = Some(notice)).await {
            tracing::debug!("Notice dropped: {}", e);
        }
    }

    /// Run the two startup fetches concurrently
    pub async fn initialize(&self) -> StartupReport {
        let (health, institutions) = tokio::join!(self.load_health(), self.refresh_institutions());

        if let Err(e) = &health {
            tracing::warn!("Health check failed: {}", e);
        }
        if let Err(e) = &institutions {
            tracing::warn!("Loading institutions failed: {}", e);
        }

        StartupReport {
            health,
            institutions,
        }
    }

    async fn load_health(&self) -> Result<()> {
        let health = self.guarded(self.backend.health()).await?;
        tracing::debug!(
            "Health: backend={}, database={}, {} collections",
            health.backend,
            health.database,
            health.collections.len()
        );
        self.apply(|s| s.health = Some(health)).await
    }

    /// Replace the institution list with the backend's current list
    pub async fn refresh_institutions(&self) -> Result<()> {
        let institutions = self.guarded(self.backend.list_institutions()).await?;
        tracing::debug!("Loaded {} institutions", institutions.len());
        self.apply(|s| s.replace_institutions(institutions)).await
    }

    pub async fn update_form(&self, name: &str, subdomain: &str) {
        let mut state = self.state.write().await;
        state.form = FormState {
            name: name.to_string(),
            subdomain: subdomain.to_string(),
        };
    }

    /// Create an institution from the current form contents
    ///
    /// The form is left as is afterwards.
    pub async fn submit_form(&self) -> Result<CreateOutcome> {
        let form = self.state.read().await.form.clone();
        self.create_institution(&form.name, &form.subdomain).await
    }

    /// Create a free-plan institution and, if the backend confirms it with an
    /// identifier, reload the institution list
    pub async fn create_institution(&self, name: &str, subdomain: &str) -> Result<CreateOutcome> {
        let loading = LoadingGuard::engage(&self.state).await;
        self.create_with(loading, name, subdomain).await
    }

    /// Merge the given fields into the form and create from it, unless a
    /// creation is already in flight
    ///
    /// The busy check, the loading flag and the form update happen under one
    /// write lock. Returns `None` when another creation holds the flag.
    pub async fn try_submit_form(
        &self,
        name: Option<String>,
        subdomain: Option<String>,
    ) -> Option<Result<CreateOutcome>> {
        let (loading, form) = {
            let mut state = self.state.write().await;
            if state.loading {
                return None;
            }
            if let Some(name) = name {
                state.form.name = name;
            }
            if let Some(subdomain) = subdomain {
                state.form.subdomain = subdomain;
            }
            let form = state.form.clone();
            (LoadingGuard::raise(&self.state, &mut state), form)
        };
        Some(self.create_with(loading, &form.name, &form.subdomain).await)
    }

    async fn create_with(
        &self,
        loading: LoadingGuard,
        name: &str,
        subdomain: &str,
    ) -> Result<CreateOutcome> {
        let result = self
            .submit_institution(NewInstitution::free(name, subdomain))
            .await;
        loading.release().await;

        if let Err(e) = &result {
            tracing::warn!("Creating institution '{}' failed: {}", name, e);
        }
        result
    }

    async fn submit_institution(&self, institution: NewInstitution) -> Result<CreateOutcome> {
        let outcome = self
            .guarded(self.backend.create_institution(&institution))
            .await?;

        match &outcome {
            CreateOutcome::Created { id } => {
                tracing::info!("Created institution '{}' ({})", institution.name, id);
                self.refresh_institutions().await?;
            }
            CreateOutcome::MissingIdentifier => {
                tracing::warn!(
                    "Backend returned no identifier for institution '{}'; list unchanged",
                    institution.name
                );
            }
        }
        Ok(outcome)
    }

    /// Populate sample data for the first institution
    ///
    /// Creates a teacher, then a batch, then loads the institution's
    /// students. Each step waits for the previous one; the first failure
    /// stops the sequence and is reported with the step it happened in.
    pub async fn demo_setup(&self) -> Result<DemoSetupReport> {
        let institution = self.state.read().await.first_institution().cloned();

        let Some(institution) = institution else {
            tracing::warn!("Demo setup requested without any institution");
            self.notify(EduverseError::NoInstitutions.to_string()).await;
            return Err(EduverseError::NoInstitutions);
        };

        match self.run_demo_steps(&institution).await {
            Ok(report) => {
                tracing::info!(
                    "Demo setup for '{}' complete: {} students",
                    institution.name,
                    report.students.len()
                );
                let notice = format!(
                    "Demo data ready for {} ({} students)",
                    institution.name,
                    report.students.len()
                );
                self.notify(notice).await;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!("Demo setup for '{}' failed: {}", institution.name, e);
                self.notify(e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn run_demo_steps(&self, institution: &Institution) -> Result<DemoSetupReport> {
        let teacher = NewUser::demo_teacher(institution);
        tracing::debug!("Demo setup: creating teacher {}", teacher.email);
        self.guarded(self.backend.create_user(&teacher))
            .await
            .map_err(|e| EduverseError::at_step(DemoStep::CreateTeacher, e))?;

        let batch = NewBatch::demo(institution);
        tracing::debug!("Demo setup: creating batch '{}'", batch.name);
        self.guarded(self.backend.create_batch(&batch))
            .await
            .map_err(|e| EduverseError::at_step(DemoStep::CreateBatch, e))?;

        tracing::debug!("Demo setup: fetching students of {}", institution.id);
        let students = self
            .guarded(self.backend.list_students(&institution.id))
            .await
            .map_err(|e| EduverseError::at_step(DemoStep::FetchStudents, e))?;

        let stored = students.clone();
        self.apply(|s| s.students = stored)
            .await
            .map_err(|e| EduverseError::at_step(DemoStep::FetchStudents, e))?;

        Ok(DemoSetupReport {
            institution_id: institution.id.clone(),
            students,
        })
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
